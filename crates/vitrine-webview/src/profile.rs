//! Per-origin session records.
//!
//! The engine's own profile directory holds the durable cookie store; this
//! store keeps the shell's per-origin metadata (opaque JSON records written
//! when an authentication flow completes, read lazily at startup). One file
//! per origin, so saves for different origins never contend.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use vitrine_common::PersistenceError;

pub struct ProfileStore {
    root: PathBuf,
}

impl ProfileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory handed to the rendering engine for its persistent data.
    pub fn data_dir(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, origin: &str) -> PathBuf {
        self.root
            .join("origins")
            .join(format!("{}.json", sanitize_origin(origin)))
    }

    /// Read the stored record for an origin, if any.
    pub fn load(&self, origin: &str) -> Result<Option<Value>, PersistenceError> {
        let path = self.record_path(origin);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(PersistenceError::Read {
                    origin: origin.to_string(),
                    reason: e.to_string(),
                })
            }
        };
        match serde_json::from_str(&content) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                // A corrupt record is dropped, not fatal: the flow will
                // simply re-authenticate.
                warn!(origin, "discarding corrupt session record: {e}");
                Ok(None)
            }
        }
    }

    /// Write the record for an origin.
    pub fn save(&self, origin: &str, record: &Value) -> Result<(), PersistenceError> {
        let path = self.record_path(origin);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PersistenceError::Write {
                origin: origin.to_string(),
                reason: e.to_string(),
            })?;
        }
        let json = serde_json::to_string_pretty(record).map_err(|e| PersistenceError::Write {
            origin: origin.to_string(),
            reason: e.to_string(),
        })?;
        std::fs::write(&path, json).map_err(|e| PersistenceError::Write {
            origin: origin.to_string(),
            reason: e.to_string(),
        })?;
        debug!(origin, path = %path.display(), "session record saved");
        Ok(())
    }
}

/// Origins contain `://` and possibly `:port`; flatten to a safe file stem.
fn sanitize_origin(origin: &str) -> String {
    origin
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path());

        let record = json!({"authenticated_at": "2024-06-01T10:00:00Z"});
        store.save("https://app.powerbi.com", &record).unwrap();

        let loaded = store.load("https://app.powerbi.com").unwrap();
        assert_eq!(loaded, Some(record));
    }

    #[test]
    fn missing_record_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path());
        assert_eq!(store.load("https://nowhere.example.com").unwrap(), None);
    }

    #[test]
    fn corrupt_record_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path());
        store.save("https://a.example.com", &json!({"k": 1})).unwrap();

        let path = dir
            .path()
            .join("origins")
            .join("https___a.example.com.json");
        std::fs::write(&path, "{broken").unwrap();

        assert_eq!(store.load("https://a.example.com").unwrap(), None);
    }

    #[test]
    fn different_origins_use_different_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path());

        store.save("https://a.example.com", &json!({"who": "a"})).unwrap();
        store
            .save("https://a.example.com:8443", &json!({"who": "b"}))
            .unwrap();

        assert_eq!(
            store.load("https://a.example.com").unwrap(),
            Some(json!({"who": "a"}))
        );
        assert_eq!(
            store.load("https://a.example.com:8443").unwrap(),
            Some(json!({"who": "b"}))
        );
    }

    #[test]
    fn sanitize_flattens_separators() {
        assert_eq!(
            sanitize_origin("https://app.example.com:443"),
            "https___app.example.com_443"
        );
    }
}
