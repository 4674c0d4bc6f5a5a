//! Core TOML config loading: read from path or platform default.

use crate::schema::LiveroomConfig;
use crate::validation;
use liveroom_common::ConfigError;
use std::path::Path;
use tracing::{info, warn};

use super::paths::{create_default_config, default_config_path};

/// Load config from a specific TOML file path.
///
/// Missing fields take their serde defaults. A config that fails
/// validation is logged and returned as parsed.
pub fn load_from_path(path: &Path) -> Result<LiveroomConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ParseError(format!("failed to read {}: {e}", path.display())))?;

    let config: LiveroomConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    if let Err(e) = validation::validate(&config) {
        warn!("config validation warning: {e}; using parsed values as-is");
    }

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load config from the platform default path, writing a commented
/// default file first if none exists.
pub fn load_default() -> Result<LiveroomConfig, ConfigError> {
    let path = default_config_path()?;

    match load_from_path(&path) {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound(_)) => {
            info!("no config found at {}, creating default", path.display());
            create_default_config(&path)?;
            Ok(LiveroomConfig::default())
        }
        Err(e) => Err(e),
    }
}
