use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a content window. Comes from configuration and
/// survives restarts; never changes once a spec is created.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(String);

impl WindowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for WindowId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of a tracked popup session, minted when the broker honors a
/// new-window request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PopupId(String);

impl PopupId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PopupId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PopupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_id_round_trips_as_plain_string() {
        let id = WindowId::new("pbi");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"pbi\"");
        let back: WindowId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn window_id_display() {
        let id = WindowId::from("sharepoint_document");
        assert_eq!(id.to_string(), "sharepoint_document");
        assert_eq!(id.as_str(), "sharepoint_document");
    }

    #[test]
    fn popup_id_is_valid_uuid() {
        let id = PopupId::new();
        assert!(uuid::Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn popup_id_is_unique() {
        assert_ne!(PopupId::new(), PopupId::new());
    }

    #[test]
    fn popup_id_hash() {
        use std::collections::HashSet;
        let a = PopupId::new();
        let b = a.clone();
        let mut set = HashSet::new();
        set.insert(a);
        set.insert(b);
        assert_eq!(set.len(), 1);
    }
}
