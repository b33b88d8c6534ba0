use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ErrorCode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Two events further apart than this never combine.
    #[serde(default = "default_combine_window_secs")]
    pub combine_window_secs: i64,
    /// Dynamic records expiring within this horizon get a live countdown.
    #[serde(default = "default_countdown_horizon_secs")]
    pub countdown_horizon_secs: i64,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Handle of the signed-in user; live events it originated are dropped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_handle: Option<String>,
    #[serde(default)]
    pub preferences: Preferences,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            combine_window_secs: default_combine_window_secs(),
            countdown_horizon_secs: default_countdown_horizon_secs(),
            tick_interval_ms: default_tick_interval_ms(),
            self_handle: None,
            preferences: Preferences::default(),
        }
    }
}

/// Category and per-subtype notification toggles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Preferences {
    #[serde(default = "default_true")]
    pub cloud_enabled: bool,
    #[serde(default = "default_true")]
    pub cloud_new_files: bool,
    #[serde(default = "default_true")]
    pub cloud_new_share: bool,
    #[serde(default = "default_true")]
    pub cloud_deleted_share: bool,
    #[serde(default = "default_true")]
    pub cloud_removed_node: bool,
    #[serde(default = "default_true")]
    pub cloud_upload_requests: bool,
    #[serde(default = "default_true")]
    pub contacts_enabled: bool,
    #[serde(default = "default_true")]
    pub contacts_request_received: bool,
    #[serde(default = "default_true")]
    pub contacts_request_accepted: bool,
    #[serde(default = "default_true")]
    pub contacts_removed: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            cloud_enabled: true,
            cloud_new_files: true,
            cloud_new_share: true,
            cloud_deleted_share: true,
            cloud_removed_node: true,
            cloud_upload_requests: true,
            contacts_enabled: true,
            contacts_request_received: true,
            contacts_request_accepted: true,
            contacts_removed: true,
        }
    }
}

/// Load engine configuration from a TOML file.
///
/// A missing file yields the defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        return Ok(EngineConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<EngineConfig>(&content)
        .with_context(|| {
            let code = ErrorCode::ConfigParseError;
            format!(
                "Failed to parse {} [{code}]: {}",
                path.display(),
                code.hint().unwrap_or_default()
            )
        })
}

const fn default_true() -> bool {
    true
}

const fn default_combine_window_secs() -> i64 {
    300
}

const fn default_countdown_horizon_secs() -> i64 {
    3600
}

const fn default_tick_interval_ms() -> u64 {
    1000
}
