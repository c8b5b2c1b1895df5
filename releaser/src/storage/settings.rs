//! Settings file management

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::errors::ReleaserError;
use crate::logs::LogLevel;
use crate::release::groups::GroupingStrategy;

/// Release tool settings
///
/// Every field is optional in the file; command line flags win over it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit JSON logs
    #[serde(default)]
    pub log_json: bool,

    /// Backend configuration
    #[serde(default)]
    pub backend: BackendSettings,

    /// How devices are grouped
    #[serde(default)]
    pub grouping: GroupingStrategy,
}

impl Settings {
    /// Read settings from a JSON file
    pub async fn load(path: &Path) -> Result<Self, ReleaserError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading settings file {}", path.display()))?;
        let settings = serde_json::from_str(&contents)
            .with_context(|| format!("parsing settings file {}", path.display()))?;
        Ok(settings)
    }
}

/// Backend API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL for the pine API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts made for each read
    #[serde(default = "default_get_attempts")]
    pub get_attempts: u32,
}

fn default_api_url() -> String {
    "https://api.balena-cloud.com/v6".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_get_attempts() -> u32 {
    3
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            get_attempts: default_get_attempts(),
        }
    }
}
