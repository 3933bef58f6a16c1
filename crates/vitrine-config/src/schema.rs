//! TOML configuration schema. Every section deserializes with defaults so
//! a partial file keeps working.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub general: GeneralConfig,
    pub popup: PopupConfig,
    pub surface: SurfaceSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Layout loaded at startup.
    pub default_layout: String,
    /// Override for the layouts/views/profile storage directory.
    pub storage_dir: Option<PathBuf>,
    /// Optional credential file (JSON `{username, password}`).
    pub credentials_path: Option<PathBuf>,
    /// Local diagnostic port exposed by the rendering engine. `None`
    /// disables remote inspection.
    pub remote_debugging_port: Option<u16>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_layout: "default".to_string(),
            storage_dir: None,
            credentials_path: None,
            remote_debugging_port: Some(9222),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupConfig {
    /// Seconds an authentication popup may stay unresolved.
    pub timeout_secs: u64,
    /// Extra regexes that mark a popup navigation as successful.
    pub success_patterns: Vec<String>,
    /// Regexes that mark a popup navigation as failed.
    pub failure_patterns: Vec<String>,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 90,
            success_patterns: Vec::new(),
            failure_patterns: vec!["[?&]error=".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceSection {
    /// User agent override for embedded content.
    pub user_agent: Option<String>,
    /// Transparent surface background.
    pub transparent: bool,
}

impl Default for SurfaceSection {
    fn default() -> Self {
        Self {
            user_agent: None,
            transparent: false,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ShellConfig::default();
        assert_eq!(config.general.default_layout, "default");
        assert_eq!(config.general.remote_debugging_port, Some(9222));
        assert_eq!(config.popup.timeout_secs, 90);
        assert_eq!(config.popup.failure_patterns, vec!["[?&]error="]);
        assert!(config.popup.success_patterns.is_empty());
        assert!(!config.surface.transparent);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let toml_str = r#"
[popup]
timeout_secs = 30
success_patterns = ["auth/complete"]
"#;
        let config: ShellConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.popup.timeout_secs, 30);
        assert_eq!(config.popup.success_patterns, vec!["auth/complete"]);
        // Defaults preserved
        assert_eq!(config.popup.failure_patterns, vec!["[?&]error="]);
        assert_eq!(config.general.default_layout, "default");
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        let config: ShellConfig = toml::from_str("").unwrap();
        assert_eq!(config.popup.timeout_secs, 90);
    }

    #[test]
    fn general_section_partial() {
        let toml_str = r#"
[general]
default_layout = "wall"
remote_debugging_port = 9333
"#;
        let config: ShellConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.default_layout, "wall");
        assert_eq!(config.general.remote_debugging_port, Some(9333));
        assert!(config.general.storage_dir.is_none());
    }
}
