//! Config loading: explicit path or platform default.

use std::path::Path;

use tracing::{info, warn};

use vitrine_common::ConfigError;

use crate::paths::{create_default_config, default_config_path};
use crate::schema::ShellConfig;
use crate::validation;

/// Load config from a specific TOML file path.
///
/// Missing fields take their serde defaults. Validation failures are
/// logged as warnings and the parsed config is returned as-is.
pub fn load_from_path(path: &Path) -> Result<ShellConfig, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ParseError(format!("failed to read {}: {e}", path.display())))?;

    let config: ShellConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    if let Err(e) = validation::validate(&config) {
        warn!("config validation warning: {e}; using parsed config as-is");
    }

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load config from the platform default path, creating a commented
/// default file on first run.
pub fn load_config() -> Result<ShellConfig, ConfigError> {
    let path = default_config_path()?;

    match load_from_path(&path) {
        Ok(config) => Ok(config),
        Err(ConfigError::ParseError(msg)) if msg.contains("failed to read") => {
            info!("no config found at {}, creating default", path.display());
            create_default_config(&path)?;
            Ok(ShellConfig::default())
        }
        Err(e) => Err(e),
    }
}
