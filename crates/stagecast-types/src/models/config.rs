//! Session configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::error::ConfigError;

/// Endpoints and retry cadence for one display session.
///
/// The reconnect budget, refresh margin and dedup window are fixed policy and
/// intentionally not configurable here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct SyncConfig {
    /// Stable client identity (generated and persisted when absent)
    #[serde(default)]
    #[validate(length(min = 1_u64))]
    pub identity: Option<String>,
    /// Credential issuer endpoint
    #[validate(url)]
    pub issuer_url: String,
    /// Push transport endpoint
    #[validate(url)]
    pub push_url: String,
    /// Fallback document store endpoint
    #[validate(url)]
    pub fallback_url: String,
    /// Shared-state document to follow
    #[validate(length(min = 1_u64))]
    pub document_id: String,
    /// HTTP request timeout in seconds
    #[validate(range(min = 1_u64, max = 300_u64))]
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Delay between fallback resubscribe attempts in seconds
    #[validate(range(min = 1_u64, max = 300_u64))]
    #[serde(default = "default_fallback_retry")]
    pub fallback_retry_secs: u64,
    /// Delay between bootstrap credential attempts in seconds
    #[validate(range(min = 1_u64, max = 600_u64))]
    #[serde(default = "default_bootstrap_retry")]
    pub bootstrap_retry_secs: u64,
}

fn default_request_timeout() -> u64 {
    15
}

fn default_fallback_retry() -> u64 {
    5
}

fn default_bootstrap_retry() -> u64 {
    10
}

impl SyncConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(content).map_err(|e| ConfigError::from_json_error(&e))?;
        config.validate().map_err(|e| ConfigError::from_validation(&e))?;
        Ok(config)
    }

    /// Load from a JSON file on disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound { path: path.display().to_string() });
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::from_io_error(&e))?;
        Self::from_json(&content)
    }
}
