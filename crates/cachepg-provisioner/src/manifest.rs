use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use cachepg_core::ParameterGroupSpec;
use serde::{Deserialize, Serialize};

use crate::api::ParameterGroupApi;
use crate::error::ProvisionerError;
use crate::retry::RetryPolicy;
use crate::syncer::ParameterGroupSyncer;

/// The declared set of parameter groups.
///
/// ```json
/// {
///   "version": 1,
///   "parameter_groups": [
///     {
///       "name": "sessions",
///       "family": "redis7",
///       "parameters": [{ "name": "maxmemory-policy", "value": "allkeys-lru" }]
///     }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    #[serde(default)]
    pub parameter_groups: Vec<ParameterGroupSpec>,
}

impl Manifest {
    /// Bump when the manifest shape changes.
    pub const VERSION: u32 = 1;

    pub fn new(parameter_groups: Vec<ParameterGroupSpec>) -> Self {
        Self {
            version: Self::VERSION,
            parameter_groups,
        }
    }

    /// Parse and validate.
    pub fn from_json(json: &str) -> Result<Self, ProvisionerError> {
        let manifest: Manifest = serde_json::from_str(json)
            .map_err(|e| ProvisionerError::Manifest(format!("invalid manifest: {e}")))?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn load(path: &Path) -> Result<Self, ProvisionerError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            ProvisionerError::Manifest(format!("failed to read {}: {e}", path.display()))
        })?;
        let manifest = Self::from_json(&json)?;
        tracing::debug!(
            path = %path.display(),
            groups = manifest.parameter_groups.len(),
            "manifest loaded"
        );
        Ok(manifest)
    }

    /// Check the manifest version and every declared group.
    ///
    /// Group names must be unique, and a parameter name may appear only once
    /// per group: two values for the same parameter are rejected rather than
    /// left for AWS to pick one.
    pub fn validate(&self) -> Result<(), ProvisionerError> {
        if self.version != Self::VERSION {
            return Err(ProvisionerError::Manifest(format!(
                "unsupported manifest version {} (expected {})",
                self.version,
                Self::VERSION
            )));
        }

        let mut names = HashSet::new();
        for spec in &self.parameter_groups {
            spec.validate()?;
            if !names.insert(spec.name.as_str()) {
                return Err(ProvisionerError::Manifest(format!(
                    "parameter group {} is declared more than once",
                    spec.name
                )));
            }

            let mut parameter_names = HashSet::new();
            for parameter in &spec.parameters {
                if !parameter_names.insert(parameter.name()) {
                    return Err(ProvisionerError::Manifest(format!(
                        "parameter {} is declared more than once in group {}",
                        parameter.name(),
                        spec.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// One syncer per declared group, in manifest order.
    pub fn syncers(
        &self,
        api: Arc<dyn ParameterGroupApi>,
        policy: RetryPolicy,
    ) -> Vec<ParameterGroupSyncer> {
        self.parameter_groups
            .iter()
            .map(|spec| ParameterGroupSyncer::new(spec.clone(), Arc::clone(&api), policy))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_lowercases_names() {
        let manifest = Manifest::from_json(
            r#"{
                "version": 1,
                "parameter_groups": [{
                    "name": "Sessions",
                    "family": "redis7",
                    "parameters": [{ "name": "Maxmemory-Policy", "value": "allkeys-lru" }]
                }]
            }"#,
        )
        .unwrap();

        let spec = &manifest.parameter_groups[0];
        assert_eq!(spec.name, "sessions");
        assert_eq!(spec.description, cachepg_core::group::DEFAULT_DESCRIPTION);
        let names: Vec<_> = spec.parameters.iter().map(|p| p.name()).collect();
        assert_eq!(names, ["maxmemory-policy"]);
    }

    #[test]
    fn rejects_unknown_version() {
        let err = Manifest::from_json(r#"{ "version": 2, "parameter_groups": [] }"#).unwrap_err();
        assert!(err.to_string().contains("unsupported manifest version 2"));
    }

    #[test]
    fn rejects_duplicate_groups() {
        let err = Manifest::from_json(
            r#"{
                "version": 1,
                "parameter_groups": [
                    { "name": "cache", "family": "redis7" },
                    { "name": "CACHE", "family": "redis6.x" }
                ]
            }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("declared more than once"));
    }

    #[test]
    fn rejects_conflicting_parameter_values() {
        let err = Manifest::from_json(
            r#"{
                "version": 1,
                "parameter_groups": [{
                    "name": "cache",
                    "family": "redis7",
                    "parameters": [
                        { "name": "timeout", "value": "0" },
                        { "name": "TIMEOUT", "value": "300" }
                    ]
                }]
            }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("parameter timeout"));
    }

    #[test]
    fn rejects_missing_family() {
        let err = Manifest::from_json(
            r#"{ "version": 1, "parameter_groups": [{ "name": "cache", "family": " " }] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ProvisionerError::Invalid(_)));
    }
}
