use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use vitrine_common::{Geometry, LayoutError, WindowId};

/// One persisted window record: stable id, content URL, pixel geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub id: WindowId,
    pub url: String,
    pub geometry: Geometry,
}

impl WindowSpec {
    pub fn new(id: impl Into<String>, url: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            id: WindowId::new(id),
            url: url.into(),
            geometry,
        }
    }
}

/// An ordered sequence of window specs. Order is preserved through
/// save/load; no two entries may share an id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayoutProfile {
    pub entries: Vec<WindowSpec>,
}

impl LayoutProfile {
    pub fn new(entries: Vec<WindowSpec>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check the profile invariants: unique ids, positive dimensions.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let mut seen = HashSet::new();
        for spec in &self.entries {
            if !seen.insert(spec.id.clone()) {
                return Err(LayoutError::DuplicateId(spec.id.to_string()));
            }
            if !spec.geometry.has_positive_size() {
                return Err(LayoutError::Malformed(format!(
                    "window {} has non-positive dimensions",
                    spec.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(id: &str, x: i32) -> WindowSpec {
        WindowSpec {
            id: WindowId::from(id),
            url: format!("https://example.com/{id}"),
            geometry: Geometry::new(x, 0, 800, 600),
        }
    }

    #[test]
    fn valid_profile_passes() {
        let profile = LayoutProfile::new(vec![spec("a", 0), spec("b", 800)]);
        assert!(profile.validate().is_ok());
        assert_eq!(profile.len(), 2);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let profile = LayoutProfile::new(vec![spec("a", 0), spec("a", 800)]);
        let err = profile.validate().unwrap_err();
        assert!(matches!(err, LayoutError::DuplicateId(ref id) if id == "a"));
    }

    #[test]
    fn zero_dimension_is_rejected() {
        let mut bad = spec("a", 0);
        bad.geometry.height = 0;
        let profile = LayoutProfile::new(vec![bad]);
        assert!(matches!(
            profile.validate(),
            Err(LayoutError::Malformed(_))
        ));
    }

    #[test]
    fn serializes_as_plain_array() {
        let profile = LayoutProfile::new(vec![spec("pbi", 850)]);
        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["id"], "pbi");
        assert_eq!(json[0]["geometry"]["x"], 850);
    }

    #[test]
    fn empty_profile_is_valid() {
        assert!(LayoutProfile::default().validate().is_ok());
    }
}
