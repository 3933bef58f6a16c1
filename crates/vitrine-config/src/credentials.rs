//! Optional explicit credentials for environments without seamless SSO.
//!
//! Loaded from a JSON file `{"username": ..., "password": ...}` when the
//! config names one, falling back to environment variables. Consumed only
//! by the authentication collaborator; the core never logs or persists
//! the password, and `Debug` redacts it.

use std::fmt;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use vitrine_common::ConfigError;

const USERNAME_ENV: &str = "VITRINE_USERNAME";
const PASSWORD_ENV: &str = "VITRINE_PASSWORD";

#[derive(Clone, Deserialize)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Load credentials: file first (when configured), environment second,
    /// `None` when neither is present (rely on platform SSO).
    pub fn load(path: Option<&Path>) -> Result<Option<Self>, ConfigError> {
        if let Some(path) = path {
            match std::fs::read_to_string(path) {
                Ok(content) => {
                    let creds: Credentials = serde_json::from_str(&content).map_err(|e| {
                        ConfigError::CredentialError(format!(
                            "failed to parse {}: {e}",
                            path.display()
                        ))
                    })?;
                    if creds.username.is_empty() || creds.password.is_empty() {
                        return Err(ConfigError::CredentialError(
                            "credential file has empty username or password".into(),
                        ));
                    }
                    info!("loaded credentials from {}", path.display());
                    return Ok(Some(creds));
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    info!("credential file {} not found, trying environment", path.display());
                }
                Err(e) => {
                    return Err(ConfigError::CredentialError(format!(
                        "failed to read {}: {e}",
                        path.display()
                    )));
                }
            }
        }

        match (std::env::var(USERNAME_ENV), std::env::var(PASSWORD_ENV)) {
            (Ok(username), Ok(password)) if !username.is_empty() && !password.is_empty() => {
                info!("loaded credentials from environment");
                Ok(Some(Self { username, password }))
            }
            _ => Ok(None),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        std::fs::write(&path, r#"{"username": "svc-kiosk", "password": "hunter2"}"#).unwrap();

        let creds = Credentials::load(Some(&path)).unwrap().unwrap();
        assert_eq!(creds.username(), "svc-kiosk");
        assert_eq!(creds.password(), "hunter2");
    }

    #[test]
    fn malformed_file_is_credential_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            Credentials::load(Some(&path)),
            Err(ConfigError::CredentialError(_))
        ));
    }

    #[test]
    fn empty_fields_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        std::fs::write(&path, r#"{"username": "", "password": "x"}"#).unwrap();

        assert!(Credentials::load(Some(&path)).is_err());
    }

    #[test]
    fn debug_redacts_password() {
        let creds: Credentials =
            serde_json::from_str(r#"{"username": "svc", "password": "secret"}"#).unwrap();
        let debug = format!("{creds:?}");
        assert!(debug.contains("svc"));
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn absent_everywhere_is_none() {
        // No file given and (in the test environment) no variables set.
        std::env::remove_var(USERNAME_ENV);
        std::env::remove_var(PASSWORD_ENV);
        assert!(Credentials::load(None).unwrap().is_none());
    }
}
