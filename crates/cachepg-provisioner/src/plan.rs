use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::GroupSnapshot;

/// What to do with one parameter group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Ok,
    Create,
    Modify,
    /// Delete and recreate: an immutable attribute changed.
    Replace,
    Delete,
}

/// Why the action was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cause {
    InSync,
    FirstProvision,
    /// Tracked in state but gone from AWS.
    Missing,
    /// Exists in AWS but not tracked in state yet.
    Untracked,
    Drift,
    /// In state but no longer in the manifest.
    Orphaned,
}

/// Structured before/after for a single field that doesn't match desired state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDrift {
    /// Machine-readable field name, e.g. "family"
    pub field: String,
    /// Human-readable label, e.g. "Parameter group family"
    pub label: String,
    /// What we want
    pub expected: Value,
    /// What AWS has
    pub actual: Value,
    /// The field cannot change in place.
    pub requires_replacement: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEntry {
    pub name: String,
    pub action: Action,
    pub cause: Cause,
    pub drift: Vec<FieldDrift>,
    /// The group as read while planning, if it exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<GroupSnapshot>,
}

/// Whether executing the plan would touch AWS or state. An untracked
/// group that is already in sync still has to be recorded.
pub fn has_changes(entries: &[PlanEntry]) -> bool {
    entries
        .iter()
        .any(|e| e.action != Action::Ok || e.cause == Cause::Untracked)
}
