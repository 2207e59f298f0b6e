//! cachepg-provisioner
//!
//! Reconciles ElastiCache cache parameter groups against a declared
//! manifest. Library consumed by the `cachepg` CLI.
//!
//! Public API:
//! - `orchestrate::plan()`: read every declared group, produce an annotated plan
//! - `orchestrate::execute()`: apply a plan, flushing state after each action
//! - `orchestrate::import()`: start tracking an existing group
//! - `provision()`: convenience: load state → plan → execute
//! - `destroy()`: delete every tracked group

pub mod api;
pub mod delete;
pub mod elasticache;
pub mod error;
pub mod manifest;
pub mod orchestrate;
pub mod persistence;
pub mod plan;
pub mod reconcile;
pub mod retry;
pub mod state;
pub mod syncer;

use std::sync::Arc;

pub use crate::api::{GroupDescription, ParameterGroupApi};
pub use crate::delete::DeleteOutcome;
pub use crate::elasticache::ElastiCacheApi;
pub use crate::error::{ApiError, ApiErrorKind, ProvisionerError};
pub use crate::manifest::Manifest;
pub use crate::persistence::StatePersistence;
pub use crate::plan::{Action, Cause, FieldDrift, PlanEntry};
pub use crate::reconcile::{ReconcileSummary, Reconciler};
pub use crate::retry::RetryPolicy;
pub use crate::state::{GroupSnapshot, ProvisionerState};
pub use crate::syncer::ParameterGroupSyncer;

/// Full provisioning: plan → execute. Returns the plan that was applied.
pub async fn provision(
    api: Arc<dyn ParameterGroupApi>,
    manifest: &Manifest,
    policy: RetryPolicy,
    persistence: &StatePersistence,
) -> Result<Vec<PlanEntry>, ProvisionerError> {
    let mut state = persistence.load().await?;
    let syncers = manifest.syncers(Arc::clone(&api), policy);
    let entries = orchestrate::plan(&syncers, &state).await?;

    if plan::has_changes(&entries) {
        let count = |action: Action| entries.iter().filter(|e| e.action == action).count();
        tracing::info!(
            creates = count(Action::Create),
            replaces = count(Action::Replace),
            modifies = count(Action::Modify),
            deletes = count(Action::Delete),
            "executing provisioning plan"
        );
        orchestrate::execute(
            &entries,
            &syncers,
            api.as_ref(),
            &policy,
            &mut state,
            persistence,
        )
        .await?;
    } else {
        tracing::info!("all parameter groups in sync, no changes needed");
    }

    Ok(entries)
}

/// Delete every tracked parameter group and clear state.
pub async fn destroy(
    api: &dyn ParameterGroupApi,
    policy: RetryPolicy,
    persistence: &StatePersistence,
) -> Result<(), ProvisionerError> {
    let mut state = persistence.load().await?;
    if state.resources.is_empty() {
        tracing::info!("no tracked parameter groups, nothing to destroy");
        return Ok(());
    }
    orchestrate::destroy_all(api, &policy, &mut state, persistence).await
}
