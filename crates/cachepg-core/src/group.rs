use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::parameter::ParameterSet;

pub const DEFAULT_DESCRIPTION: &str = "Managed by cachepg";

/// Desired state of one cache parameter group.
///
/// `name`, `family` and `description` cannot change once the group exists;
/// only `parameters` are reconciled in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawGroupSpec")]
pub struct ParameterGroupSpec {
    pub name: String,
    pub family: String,
    pub description: String,
    pub parameters: ParameterSet,
}

#[derive(Deserialize)]
struct RawGroupSpec {
    name: String,
    family: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: ParameterSet,
}

impl From<RawGroupSpec> for ParameterGroupSpec {
    fn from(raw: RawGroupSpec) -> Self {
        Self {
            name: normalize_name(&raw.name),
            family: raw.family,
            description: raw
                .description
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            parameters: raw.parameters,
        }
    }
}

impl ParameterGroupSpec {
    pub fn new(name: &str, family: impl Into<String>) -> Self {
        Self {
            name: normalize_name(name),
            family: family.into(),
            description: DEFAULT_DESCRIPTION.to_string(),
            parameters: ParameterSet::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_parameters(mut self, parameters: ParameterSet) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        validate_group_name(&self.name)?;
        if self.family.trim().is_empty() {
            return Err(CoreError::MissingField(format!("{}.family", self.name)));
        }
        Ok(())
    }
}

/// Group names are stored lowercase by ElastiCache.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// ElastiCache naming rules: 1-255 characters, starts with a letter, only
/// letters, digits and hyphens, no trailing or doubled hyphen.
pub fn validate_group_name(name: &str) -> Result<(), CoreError> {
    let invalid = |reason| CoreError::InvalidName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(CoreError::MissingField("name".into()));
    }
    if name.len() > 255 {
        return Err(invalid("longer than 255 characters"));
    }
    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(invalid("must start with a letter"));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(invalid("only letters, digits and hyphens are allowed"));
    }
    if name.ends_with('-') || name.contains("--") {
        return Err(invalid("cannot end with a hyphen or contain two consecutive hyphens"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::Parameter;

    #[test]
    fn deserialize_defaults_and_normalizes() {
        let spec: ParameterGroupSpec = serde_json::from_str(
            r#"{
                "name": "Sessions-Cache",
                "family": "redis6.x",
                "parameters": [{"name": "Maxmemory-Policy", "value": "allkeys-lru"}]
            }"#,
        )
        .unwrap();

        assert_eq!(spec.name, "sessions-cache");
        assert_eq!(spec.description, DEFAULT_DESCRIPTION);
        assert!(
            spec.parameters
                .contains(&Parameter::new("maxmemory-policy", "allkeys-lru"))
        );
    }

    #[test]
    fn validate_accepts_typical_name() {
        assert!(ParameterGroupSpec::new("app-redis-7", "redis7").validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_names() {
        for name in ["", "7cache", "cache_main", "cache-", "cache--main"] {
            let spec = ParameterGroupSpec {
                name: name.to_string(),
                family: "redis7".into(),
                description: DEFAULT_DESCRIPTION.into(),
                parameters: ParameterSet::new(),
            };
            assert!(spec.validate().is_err(), "{name:?} should be rejected");
        }
    }

    #[test]
    fn validate_requires_family() {
        let spec = ParameterGroupSpec::new("cache", "  ");
        assert!(matches!(spec.validate(), Err(CoreError::MissingField(_))));
    }
}
