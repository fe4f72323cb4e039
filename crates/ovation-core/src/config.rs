use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{OvationError, Result};

/// Top-level configuration for the Ovation application.
///
/// Loaded from `~/.ovation/config.toml` by default. User-facing pacing
/// settings live in the store (they are editable at runtime); this file
/// holds deployment-level knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OvationConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub quota: QuotaConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Default for OvationConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            quota: QuotaConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl OvationConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: OvationConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| OvationError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for the SQLite database.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// API server port.
    pub port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.ovation/data".to_string(),
            log_level: "info".to_string(),
            port: 3040,
        }
    }
}

/// Quota enforcement settings.
///
/// The window duration itself is fixed at one hour by the platform and is
/// not configurable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// Maximum kudos per rolling hour.
    pub hourly_limit: u32,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self { hourly_limit: 100 }
    }
}

/// Executor tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Cool-down display interval after a completed batch, in milliseconds.
    pub drain_done_ms: u64,
    /// Cool-down display interval after an empty batch, in milliseconds.
    pub drain_empty_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            drain_done_ms: 3000,
            drain_empty_ms: 2000,
        }
    }
}
