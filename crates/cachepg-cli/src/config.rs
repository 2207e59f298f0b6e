use std::path::{Path, PathBuf};
use std::time::Duration;

use cachepg_provisioner::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Current config version. Bump this when changing the file's shape.
const CURRENT_VERSION: u32 = 1;

const DEFAULT_RESET_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DELETE_TIMEOUT_SECS: u64 = 180;

/// On-disk settings. Every field is optional; flags override them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachepgConfig {
    /// Schema version. Missing or 0 = pre-versioned config.
    #[serde(default)]
    pub config_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default)]
    pub credentials: CredentialSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_path: Option<PathBuf>,
    #[serde(default = "default_reset_timeout_secs")]
    pub reset_timeout_secs: u64,
    #[serde(default = "default_delete_timeout_secs")]
    pub delete_timeout_secs: u64,
}

impl Default for CachepgConfig {
    fn default() -> Self {
        Self {
            config_version: CURRENT_VERSION,
            region: None,
            credentials: CredentialSource::default(),
            state_path: None,
            reset_timeout_secs: DEFAULT_RESET_TIMEOUT_SECS,
            delete_timeout_secs: DEFAULT_DELETE_TIMEOUT_SECS,
        }
    }
}

fn default_reset_timeout_secs() -> u64 {
    DEFAULT_RESET_TIMEOUT_SECS
}

fn default_delete_timeout_secs() -> u64 {
    DEFAULT_DELETE_TIMEOUT_SECS
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialSource {
    Inline {
        access_key_id: String,
        secret_access_key: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        session_token: Option<String>,
    },
    Profile {
        profile_name: String,
    },
    #[default]
    DefaultChain,
}

impl CredentialSource {
    /// Log-safe description; never includes the secret.
    pub fn describe(&self) -> String {
        match self {
            Self::Inline {
                access_key_id,
                session_token,
                ..
            } => {
                let kind = if session_token.is_some() {
                    "temporary"
                } else {
                    "inline"
                };
                format!("{kind} ({})", redact_access_key(access_key_id))
            }
            Self::Profile { profile_name } => format!("profile ({profile_name})"),
            Self::DefaultChain => "default chain".to_string(),
        }
    }
}

/// Flag values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub region: Option<String>,
    pub profile: Option<String>,
    pub state_path: Option<PathBuf>,
}

/// Config file and flags merged.
#[derive(Debug, Clone)]
pub struct Settings {
    /// None = let the AWS default region chain decide.
    pub region: Option<String>,
    pub credentials: CredentialSource,
    pub state_path: PathBuf,
    pub retry: RetryPolicy,
}

impl CachepgConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            reset_timeout: Duration::from_secs(self.reset_timeout_secs),
            delete_timeout: Duration::from_secs(self.delete_timeout_secs),
            ..RetryPolicy::default()
        }
    }

    pub fn resolve(self, overrides: Overrides) -> eyre::Result<Settings> {
        let retry = self.retry_policy();
        let credentials = match overrides.profile {
            Some(profile_name) => CredentialSource::Profile { profile_name },
            None => self.credentials,
        };
        let state_path = match overrides.state_path.or(self.state_path) {
            Some(path) => path,
            None => config_dir()?.join("state.json"),
        };

        Ok(Settings {
            region: overrides.region.or(self.region),
            credentials,
            state_path,
            retry,
        })
    }
}

pub fn config_dir() -> eyre::Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| eyre::eyre!("no config directory found"))?;
    Ok(base.join("cachepg"))
}

pub fn default_config_path() -> eyre::Result<PathBuf> {
    Ok(config_dir()?.join("config.json"))
}

/// Load the config at `path`, or defaults if the file does not exist.
pub fn load_config(path: &Path) -> eyre::Result<CachepgConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(CachepgConfig::default());
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("failed to read config at {}: {e}", path.display()))?;

    // Check the version before deserializing the rest.
    let json: serde_json::Value = serde_json::from_str(&contents)
        .map_err(|e| eyre::eyre!("invalid config at {}: {e}", path.display()))?;
    let on_disk_version = json
        .get("config_version")
        .and_then(|v| v.as_u64())
        .unwrap_or(0);
    if on_disk_version > u64::from(CURRENT_VERSION) {
        return Err(eyre::eyre!(
            "config_version {on_disk_version} is newer than this build supports ({CURRENT_VERSION})"
        ));
    }

    let config: CachepgConfig = serde_json::from_value(json)
        .map_err(|e| eyre::eyre!("invalid config at {}: {e}", path.display()))?;
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(config)
}

fn redact_access_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let prefix: String = chars[..4].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{prefix}...{suffix}")
}
