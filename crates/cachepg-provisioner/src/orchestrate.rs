use std::collections::{HashMap, HashSet};

use crate::api::ParameterGroupApi;
use crate::delete;
use crate::error::ProvisionerError;
use crate::manifest::Manifest;
use crate::persistence::StatePersistence;
use crate::plan::{Action, Cause, PlanEntry};
use crate::retry::RetryPolicy;
use crate::state::{GroupSnapshot, ProvisionerState, ResourceStatus};
use crate::syncer::{self, ParameterGroupSyncer};

/// Read every declared group and produce an annotated plan.
///
/// One entry per manifest group in manifest order, followed by a `Delete`
/// entry for each group in state that the manifest no longer declares.
pub async fn plan(
    syncers: &[ParameterGroupSyncer],
    state: &ProvisionerState,
) -> Result<Vec<PlanEntry>, ProvisionerError> {
    let mut entries = Vec::new();

    for syncer in syncers {
        let name = syncer.spec().name.clone();
        let tracked = state.resources.contains_key(&name);
        let actual = syncer.read().await?;

        let entry = match actual {
            None => PlanEntry {
                name,
                action: Action::Create,
                cause: if tracked {
                    Cause::Missing
                } else {
                    Cause::FirstProvision
                },
                drift: vec![],
                actual: None,
            },
            Some(actual) => {
                let drift = syncer.diff(&actual);
                let action = if drift.is_empty() {
                    Action::Ok
                } else if drift.iter().any(|d| d.requires_replacement) {
                    Action::Replace
                } else {
                    Action::Modify
                };
                let cause = match (tracked, action) {
                    (false, _) => Cause::Untracked,
                    (true, Action::Ok) => Cause::InSync,
                    (true, _) => Cause::Drift,
                };
                PlanEntry {
                    name,
                    action,
                    cause,
                    drift,
                    actual: Some(actual),
                }
            }
        };
        tracing::debug!(group = %entry.name, action = ?entry.action, cause = ?entry.cause, "planned");
        entries.push(entry);
    }

    let declared: HashSet<_> = syncers.iter().map(|s| s.spec().name.as_str()).collect();
    for (name, rs) in &state.resources {
        if !declared.contains(name.as_str()) {
            entries.push(PlanEntry {
                name: name.clone(),
                action: Action::Delete,
                cause: Cause::Orphaned,
                drift: vec![],
                actual: Some(rs.snapshot.clone()),
            });
        }
    }

    Ok(entries)
}

/// Execute all actionable entries in the plan.
///
/// Creates, then replaces, then modifies, then deletes. State is flushed
/// after every action so an aborted run leaves an accurate record behind.
///
/// A group that exists but is not tracked is never deleted: if it needs a
/// replace, nothing runs and it must be imported first.
pub async fn execute(
    entries: &[PlanEntry],
    syncers: &[ParameterGroupSyncer],
    api: &dyn ParameterGroupApi,
    policy: &RetryPolicy,
    state: &mut ProvisionerState,
    persistence: &StatePersistence,
) -> Result<(), ProvisionerError> {
    if let Some(entry) = entries
        .iter()
        .find(|e| e.action == Action::Replace && e.cause == Cause::Untracked)
    {
        return Err(ProvisionerError::State(format!(
            "parameter group {} exists but is not tracked and would have to be replaced; \
             run `cachepg import {}` first",
            entry.name, entry.name
        )));
    }

    let syncer_map: HashMap<&str, &ParameterGroupSyncer> = syncers
        .iter()
        .map(|s| (s.spec().name.as_str(), s))
        .collect();
    let lookup = |name: &str| {
        syncer_map
            .get(name)
            .copied()
            .ok_or_else(|| ProvisionerError::ResourceNotFound {
                resource_type: syncer::RESOURCE_TYPE.to_string(),
                resource_id: name.to_string(),
            })
    };

    for entry in entries.iter().filter(|e| e.action == Action::Create) {
        let syncer = lookup(&entry.name)?;
        tracing::info!(group = %entry.name, "creating parameter group");
        let snapshot = syncer.create().await?;
        state.record(snapshot, ResourceStatus::Created);
        persistence.flush(state).await?;
    }

    for entry in entries.iter().filter(|e| e.action == Action::Replace) {
        let syncer = lookup(&entry.name)?;
        tracing::info!(group = %entry.name, "replacing parameter group");
        syncer.destroy().await?;
        state.resources.remove(&entry.name);
        persistence.flush(state).await?;

        let snapshot = syncer.create().await?;
        state.record(snapshot, ResourceStatus::Created);
        persistence.flush(state).await?;
    }

    for entry in entries.iter().filter(|e| e.action == Action::Modify) {
        let syncer = lookup(&entry.name)?;
        let prior = match &entry.actual {
            Some(actual) => actual.clone(),
            None => syncer::read_group(api, &entry.name).await?,
        };
        tracing::info!(group = %entry.name, "updating parameter group");
        let snapshot = syncer.update(&prior).await?;
        state.record(snapshot, ResourceStatus::Updated);
        persistence.flush(state).await?;
    }

    // Already in sync, just not tracked yet.
    for entry in entries
        .iter()
        .filter(|e| e.action == Action::Ok && e.cause == Cause::Untracked)
    {
        if let Some(actual) = &entry.actual {
            tracing::info!(group = %entry.name, "adopting existing parameter group");
            state.record(actual.clone(), ResourceStatus::Imported);
            persistence.flush(state).await?;
        }
    }

    for entry in entries.iter().filter(|e| e.action == Action::Delete) {
        tracing::info!(group = %entry.name, "deleting orphaned parameter group");
        delete::delete_group(api, &entry.name, policy).await?;
        state.resources.remove(&entry.name);
        persistence.flush(state).await?;
    }

    state.manifest_version = Some(Manifest::VERSION);
    persistence.flush(state).await?;

    Ok(())
}

/// Delete every group tracked in state.
pub async fn destroy_all(
    api: &dyn ParameterGroupApi,
    policy: &RetryPolicy,
    state: &mut ProvisionerState,
    persistence: &StatePersistence,
) -> Result<(), ProvisionerError> {
    let names: Vec<String> = state.resources.keys().cloned().collect();
    for name in names {
        tracing::info!(group = %name, "destroying parameter group");
        delete::delete_group(api, &name, policy).await?;
        state.resources.remove(&name);
        persistence.flush(state).await?;
    }

    state.resources.clear();
    state.manifest_version = None;
    persistence.flush(state).await?;

    Ok(())
}

/// Read an existing group and start tracking it.
pub async fn import(
    api: &dyn ParameterGroupApi,
    id: &str,
    state: &mut ProvisionerState,
    persistence: &StatePersistence,
) -> Result<GroupSnapshot, ProvisionerError> {
    let snapshot = syncer::import_group(api, id).await?;
    state.record(snapshot.clone(), ResourceStatus::Imported);
    persistence.flush(state).await?;
    Ok(snapshot)
}
