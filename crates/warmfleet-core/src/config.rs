//! Warm run configuration.
//!
//! Populated once at startup (defaults, then an optional `warmfleet.toml`,
//! then CLI/environment overrides) and passed by value into discovery and
//! the warmer.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::ProjectScope;

pub const DEFAULT_PROJECT_ID: &str = "mklv-infrastructure";
pub const DEFAULT_REGION: &str = "us-west1";
pub const DEFAULT_LABEL_KEY: &str = "warm";
pub const DEFAULT_LABEL_VALUE: &str = "true";
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarmConfig {
    /// Cloud project whose services are listed.
    pub project_id: String,
    /// Region (Cloud Run "location") to list services in.
    pub region: String,
    /// Label that opts a service into warming.
    pub label_key: String,
    /// Required value of `label_key`.
    pub label_value: String,
    /// Per-probe timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for WarmConfig {
    fn default() -> Self {
        Self {
            project_id: DEFAULT_PROJECT_ID.to_string(),
            region: DEFAULT_REGION.to_string(),
            label_key: DEFAULT_LABEL_KEY.to_string(),
            label_value: DEFAULT_LABEL_VALUE.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl WarmConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: WarmConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Reject configurations that could never produce a useful run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project_id.trim().is_empty() {
            return Err(ConfigError::Invalid("project_id must not be empty".into()));
        }
        if self.region.trim().is_empty() {
            return Err(ConfigError::Invalid("region must not be empty".into()));
        }
        if self.label_key.trim().is_empty() {
            return Err(ConfigError::Invalid("label_key must not be empty".into()));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeout_ms must be greater than zero".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn scope(&self) -> ProjectScope {
        ProjectScope::new(&self.project_id, &self.region)
    }
}
