use std::collections::BTreeMap;

use cachepg_core::ParameterSet;
use serde::{Deserialize, Serialize};

/// Provisioner state, persisted as JSON by [`StatePersistence`](crate::persistence::StatePersistence).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvisionerState {
    /// Group name -> last observed state.
    pub resources: BTreeMap<String, ResourceState>,

    /// The AWS region the groups live in.
    #[serde(default)]
    pub region: String,

    /// Manifest version of the last successful apply.
    #[serde(default)]
    pub manifest_version: Option<u32>,
}

impl ProvisionerState {
    pub fn record(&mut self, snapshot: GroupSnapshot, status: ResourceStatus) {
        self.resources.insert(
            snapshot.name.clone(),
            ResourceState {
                snapshot,
                status,
                updated_at: jiff::Timestamp::now(),
            },
        );
    }
}

/// State for a single managed parameter group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceState {
    pub snapshot: GroupSnapshot,
    pub status: ResourceStatus,
    pub updated_at: jiff::Timestamp,
}

/// A parameter group as read back from AWS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    pub name: String,
    pub family: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    /// User-modified parameters only.
    pub parameters: ParameterSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    Created,
    Updated,
    Imported,
}
