//! Config path resolution and default file creation.

use std::path::Path;

use tracing::info;

use vitrine_common::ConfigError;

/// Platform-specific default config file path.
pub fn default_config_path() -> Result<std::path::PathBuf, ConfigError> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::ParseError("could not determine config directory".into()))?;
    Ok(config_dir.join("vitrine").join("config.toml"))
}

const DEFAULT_CONFIG_TOML: &str = r#"# Vitrine display shell configuration.

[general]
# Layout loaded at startup.
default_layout = "default"
# Uncomment to point layouts, views, and session data somewhere else.
# storage_dir = "/var/lib/vitrine"
# Optional JSON credential file: {"username": "...", "password": "..."}
# credentials_path = "/etc/vitrine/auth.json"
# Rendering-engine diagnostic port for troubleshooting.
remote_debugging_port = 9222

[popup]
# Seconds an authentication popup may stay unresolved before timing out.
timeout_secs = 90
# Regexes marking a popup navigation as successful, in addition to the
# built-in return-to-origin detection.
success_patterns = []
# Regexes marking a popup navigation as failed.
failure_patterns = ["[?&]error="]

[surface]
# user_agent = "Mozilla/5.0 ..."
transparent = false
"#;

/// Write the commented default config file.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ConfigError::ParseError(format!(
                "failed to create config directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    std::fs::write(path, DEFAULT_CONFIG_TOML).map_err(|e| {
        ConfigError::ParseError(format!(
            "failed to write default config to {}: {e}",
            path.display()
        ))
    })?;

    info!("created default config at {}", path.display());
    Ok(())
}
