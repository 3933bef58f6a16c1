use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),

    #[error("credential file error: {0}")]
    CredentialError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("layout not found: {0}")]
    NotFound(String),

    #[error("layout data malformed: {0}")]
    Malformed(String),

    #[error("duplicate window id in profile: {0}")]
    DuplicateId(String),

    #[error("window not found in registry: {0}")]
    UnknownWindow(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("session store read failed for {origin}: {reason}")]
    Read { origin: String, reason: String },

    #[error("session store write failed for {origin}: {reason}")]
    Write { origin: String, reason: String },
}

/// An event referenced a popup or parent window the broker does not know.
/// Always logged and dropped, never fatal.
#[derive(Debug, thiserror::Error)]
pub enum CorrelationError {
    #[error("unknown popup session: {0}")]
    UnknownPopup(String),

    #[error("unknown parent window: {0}")]
    UnknownParent(String),
}

#[derive(Debug, thiserror::Error)]
pub enum VitrineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Correlation(#[from] CorrelationError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("surface error: {0}")]
    Surface(String),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ParseError("unexpected token".into());
        assert_eq!(err.to_string(), "config parse error: unexpected token");
    }

    #[test]
    fn layout_error_display() {
        let err = LayoutError::NotFound("default".into());
        assert_eq!(err.to_string(), "layout not found: default");

        let err = LayoutError::DuplicateId("pbi".into());
        assert_eq!(err.to_string(), "duplicate window id in profile: pbi");
    }

    #[test]
    fn correlation_error_display() {
        let err = CorrelationError::UnknownPopup("abc123".into());
        assert_eq!(err.to_string(), "unknown popup session: abc123");

        let err = CorrelationError::UnknownParent("pbi".into());
        assert_eq!(err.to_string(), "unknown parent window: pbi");
    }

    #[test]
    fn vitrine_error_from_layout() {
        let layout_err = LayoutError::Malformed("truncated json".into());
        let err: VitrineError = layout_err.into();
        assert!(matches!(err, VitrineError::Layout(_)));
        assert!(err.to_string().contains("truncated json"));
    }

    #[test]
    fn vitrine_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: VitrineError = io_err.into();
        assert!(matches!(err, VitrineError::Io(_)));
        assert!(err.to_string().contains("file missing"));
    }

    #[test]
    fn persistence_error_carries_origin() {
        let err = PersistenceError::Write {
            origin: "https://idp.example.com".into(),
            reason: "disk full".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("https://idp.example.com"));
        assert!(msg.contains("disk full"));
    }
}
