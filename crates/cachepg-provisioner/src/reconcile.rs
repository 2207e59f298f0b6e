//! Reconcile a group's user parameters against the desired set.
//!
//! The diff is applied in batches of at most
//! [`MAX_PARAMETERS_PER_CALL`](cachepg_core::MAX_PARAMETERS_PER_CALL): all
//! resets first, then all modifications. A failed batch aborts the pass;
//! batches already applied stay applied.

use cachepg_core::family::{
    self, ReservedMemoryReset, NEUTRAL_RESERVED_MEMORY_PERCENTAGE, RESERVED_MEMORY,
    RESERVED_MEMORY_PERCENTAGE,
};
use cachepg_core::{batches, Parameter, ParameterDiff, ParameterSet};

use crate::api::ParameterGroupApi;
use crate::error::{ApiError, ProvisionerError};
use crate::retry::{self, RetryError, RetryPolicy};

/// What a reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub reset: Vec<Parameter>,
    pub modified: Vec<Parameter>,
    /// Resets dropped after a timeout and not retried directly.
    pub dropped: Vec<Parameter>,
}

pub struct Reconciler<'a> {
    api: &'a dyn ParameterGroupApi,
    group: &'a str,
    family: &'a str,
    policy: &'a RetryPolicy,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        api: &'a dyn ParameterGroupApi,
        group: &'a str,
        family: &'a str,
        policy: &'a RetryPolicy,
    ) -> Self {
        Self {
            api,
            group,
            family,
            policy,
        }
    }

    /// Move the group's parameters from `current` to `desired`.
    pub async fn reconcile(
        &self,
        current: &ParameterSet,
        desired: &ParameterSet,
    ) -> Result<ReconcileSummary, ProvisionerError> {
        let diff = ParameterDiff::between(current, desired);
        tracing::debug!(group = %self.group, parameters = %join(&diff.to_remove), "parameters to remove");
        tracing::debug!(group = %self.group, parameters = %join(&diff.to_add), "parameters to add");

        let mut summary = ReconcileSummary::default();

        for batch in batches(&diff.to_remove) {
            self.reset_batch(batch.to_vec(), desired, &mut summary).await?;
        }

        for batch in batches(&diff.to_add) {
            tracing::debug!(group = %self.group, parameters = %join(batch), "modifying parameter group");
            self.api
                .modify_parameters(self.group, batch)
                .await
                .map_err(|e| self.update_failed("modify parameters", &e.to_string()))?;
            summary.modified.extend_from_slice(batch);
        }

        if !diff.is_empty() {
            tracing::info!(
                group = %self.group,
                reset = summary.reset.len(),
                modified = summary.modified.len(),
                dropped = summary.dropped.len(),
                "parameter group reconciled"
            );
        }

        Ok(summary)
    }

    async fn reset_batch(
        &self,
        mut batch: Vec<Parameter>,
        desired: &ParameterSet,
        summary: &mut ReconcileSummary,
    ) -> Result<(), ProvisionerError> {
        tracing::debug!(group = %self.group, parameters = %join(&batch), "resetting parameter group");

        let result = retry::with_deadline(
            self.policy,
            self.policy.reset_timeout,
            ApiError::has_pending_changes,
            || self.api.reset_parameters(self.group, &batch),
        )
        .await;

        let err = match result {
            Ok(()) => {
                summary.reset.append(&mut batch);
                return Ok(());
            }
            // Also catches InternalFailure/ServiceUnavailable once SDK retries give up.
            Err(err) if err.is_timeout() => err,
            Err(err) => return Err(self.update_failed("reset parameters", &err.to_string())),
        };

        // A reserved-memory reset can fail inside the provider with an
        // internal error the SDK keeps retrying, so it only ever shows up
        // here as a timeout.
        tracing::warn!(group = %self.group, error = %err, "parameter reset timed out");

        if let Some(index) = batch.iter().position(|p| p.name() == RESERVED_MEMORY) {
            summary.dropped.push(batch.remove(index));
            self.reset_reserved_memory_indirectly(desired).await;
        }

        if batch.is_empty() {
            return Ok(());
        }

        // One more try for whatever is left, without retries.
        self.api
            .reset_parameters(self.group, &batch)
            .await
            .map_err(|e| self.update_failed("reset parameters", &retry_context(&err, &e)))?;
        summary.reset.append(&mut batch);
        Ok(())
    }

    /// Best-effort: every failure here is logged and swallowed.
    async fn reset_reserved_memory_indirectly(&self, desired: &ParameterSet) {
        match family::reserved_memory_reset(self.family, desired) {
            ReservedMemoryReset::Indirect => {}
            ReservedMemoryReset::ExplicitlyConfigured => {
                tracing::debug!(
                    group = %self.group,
                    "reserved memory is configured explicitly, skipping indirect reset"
                );
                return;
            }
            ReservedMemoryReset::UnsupportedFamily => {
                tracing::warn!(
                    group = %self.group,
                    family = %self.family,
                    "cannot reset reserved-memory parameter with this family"
                );
                return;
            }
        }

        let sibling = [Parameter::new(
            RESERVED_MEMORY_PERCENTAGE,
            NEUTRAL_RESERVED_MEMORY_PERCENTAGE,
        )];

        if let Err(e) = self.api.modify_parameters(self.group, &sibling).await {
            tracing::warn!(
                group = %self.group,
                error = %e,
                "reserved-memory workaround: failed to switch to reserved-memory-percentage"
            );
            return;
        }

        match self.api.reset_parameters(self.group, &sibling).await {
            Ok(()) => tracing::info!(
                group = %self.group,
                "reserved-memory reset through reserved-memory-percentage"
            ),
            Err(e) => tracing::warn!(
                group = %self.group,
                error = %e,
                "reserved-memory workaround: failed to reset reserved-memory-percentage"
            ),
        }
    }

    fn update_failed(&self, action: &str, msg: &str) -> ProvisionerError {
        ProvisionerError::UpdateFailed(format!("{action}: {msg}"))
            .with_resource("parameter group", self.group)
    }
}

fn retry_context(timeout: &RetryError, err: &ApiError) -> String {
    format!("{err} (retried once after: {timeout})")
}

fn join(parameters: &[Parameter]) -> String {
    parameters
        .iter()
        .map(Parameter::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
