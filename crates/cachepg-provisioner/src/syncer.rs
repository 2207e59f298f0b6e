use std::sync::Arc;

use cachepg_core::group::normalize_name;
use cachepg_core::{ParameterGroupSpec, ParameterSet};
use serde_json::json;

use crate::api::ParameterGroupApi;
use crate::delete::{self, DeleteOutcome};
use crate::error::ProvisionerError;
use crate::plan::FieldDrift;
use crate::reconcile::Reconciler;
use crate::retry::RetryPolicy;
use crate::state::GroupSnapshot;

pub const RESOURCE_TYPE: &str = "elasticache_parameter_group";

/// Drives one declared parameter group through its lifecycle.
pub struct ParameterGroupSyncer {
    spec: ParameterGroupSpec,
    api: Arc<dyn ParameterGroupApi>,
    policy: RetryPolicy,
}

impl ParameterGroupSyncer {
    pub fn new(spec: ParameterGroupSpec, api: Arc<dyn ParameterGroupApi>, policy: RetryPolicy) -> Self {
        Self { spec, api, policy }
    }

    pub fn spec(&self) -> &ParameterGroupSpec {
        &self.spec
    }

    /// Read current state from AWS. None = doesn't exist.
    pub async fn read(&self) -> Result<Option<GroupSnapshot>, ProvisionerError> {
        match read_group(self.api.as_ref(), &self.spec.name).await {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(ProvisionerError::ResourceNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Compare actual state against the declared group. Empty if in sync.
    pub fn diff(&self, actual: &GroupSnapshot) -> Vec<FieldDrift> {
        let mut drifts = Vec::new();

        let immutable = [
            ("family", "Parameter group family", &self.spec.family, &actual.family),
            ("description", "Description", &self.spec.description, &actual.description),
        ];
        for (field, label, expected, actual_val) in immutable {
            if expected != actual_val {
                drifts.push(FieldDrift {
                    field: field.into(),
                    label: label.into(),
                    expected: json!(expected),
                    actual: json!(actual_val),
                    requires_replacement: true,
                });
            }
        }

        if self.spec.parameters != actual.parameters {
            drifts.push(FieldDrift {
                field: "parameters".into(),
                label: "Parameters".into(),
                expected: json!(self.spec.parameters),
                actual: json!(actual.parameters),
                requires_replacement: false,
            });
        }

        drifts
    }

    /// Create the group, then apply every desired parameter.
    pub async fn create(&self) -> Result<GroupSnapshot, ProvisionerError> {
        let created = self
            .api
            .create_group(&self.spec.name, &self.spec.family, &self.spec.description)
            .await
            .map_err(|e| {
                ProvisionerError::CreateFailed(e.to_string())
                    .with_resource("parameter group", &self.spec.name)
            })?;
        tracing::info!(group = %created.name, family = %created.family, "parameter group created");

        self.reconcile(&ParameterSet::new()).await?;
        read_group(self.api.as_ref(), &self.spec.name).await
    }

    /// Bring the parameters from `prior` (the last observed state) to the declared set.
    ///
    /// Family and description are immutable; drift there needs a replace,
    /// not an update.
    pub async fn update(&self, prior: &GroupSnapshot) -> Result<GroupSnapshot, ProvisionerError> {
        if prior.parameters != self.spec.parameters {
            self.reconcile(&prior.parameters).await?;
        }
        read_group(self.api.as_ref(), &self.spec.name).await
    }

    pub async fn destroy(&self) -> Result<DeleteOutcome, ProvisionerError> {
        delete::delete_group(self.api.as_ref(), &self.spec.name, &self.policy).await
    }

    async fn reconcile(&self, current: &ParameterSet) -> Result<(), ProvisionerError> {
        Reconciler::new(self.api.as_ref(), &self.spec.name, &self.spec.family, &self.policy)
            .reconcile(current, &self.spec.parameters)
            .await?;
        Ok(())
    }
}

/// Read a group and its user-modified parameters. A missing group is an error.
pub async fn read_group(
    api: &dyn ParameterGroupApi,
    name: &str,
) -> Result<GroupSnapshot, ProvisionerError> {
    let read_failed = |e: crate::error::ApiError| {
        if e.is_not_found() {
            ProvisionerError::ResourceNotFound {
                resource_type: RESOURCE_TYPE.to_string(),
                resource_id: name.to_string(),
            }
        } else {
            ProvisionerError::ReadFailed(e.to_string()).with_resource("parameter group", name)
        }
    };

    let group = api.describe_group(name).await.map_err(read_failed)?;
    let parameters = api.describe_user_parameters(name).await.map_err(read_failed)?;

    Ok(GroupSnapshot {
        name: group.name,
        family: group.family,
        description: group.description,
        arn: group.arn,
        parameters,
    })
}

/// Read an existing group by an externally supplied name.
pub async fn import_group(
    api: &dyn ParameterGroupApi,
    id: &str,
) -> Result<GroupSnapshot, ProvisionerError> {
    let name = normalize_name(id);
    let snapshot = read_group(api, &name).await?;
    tracing::info!(group = %name, parameters = snapshot.parameters.len(), "parameter group imported");
    Ok(snapshot)
}
