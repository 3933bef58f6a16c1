//! Named layout persistence: JSON files under a layouts directory.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use vitrine_common::LayoutError;

use crate::profile::{LayoutProfile, WindowSpec};

/// Loads and saves named layouts as `{dir}/{name}.json`.
///
/// A layout file is an ordered JSON array of window records. Individually
/// malformed entries are skipped with a warning so the shell can still
/// start with the remaining valid windows; only a file that fails to parse
/// as JSON at all is reported as malformed.
pub struct LayoutStore {
    dir: PathBuf,
}

impl LayoutStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn layout_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Load a named layout. Missing file maps to `NotFound` (callers treat
    /// it as an empty layout at startup).
    pub fn load(&self, name: &str) -> Result<LayoutProfile, LayoutError> {
        let path = self.layout_path(name);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LayoutError::NotFound(name.to_string()));
            }
            Err(e) => return Err(LayoutError::Io(e)),
        };

        let raw: Vec<serde_json::Value> = serde_json::from_str(&content)
            .map_err(|e| LayoutError::Malformed(format!("{}: {e}", path.display())))?;

        let mut entries = Vec::with_capacity(raw.len());
        for (index, value) in raw.into_iter().enumerate() {
            match serde_json::from_value::<WindowSpec>(value) {
                Ok(spec) if spec.geometry.has_positive_size() => entries.push(spec),
                Ok(spec) => {
                    warn!(
                        layout = name,
                        index,
                        window_id = %spec.id,
                        "skipping entry with non-positive dimensions"
                    );
                }
                Err(e) => {
                    warn!(layout = name, index, "skipping malformed entry: {e}");
                }
            }
        }

        let profile = LayoutProfile::new(entries);
        info!(layout = name, windows = profile.len(), "layout loaded");
        Ok(profile)
    }

    /// Save a named layout, creating the layouts directory on demand.
    pub fn save(&self, name: &str, profile: &LayoutProfile) -> Result<(), LayoutError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.layout_path(name);
        let json = serde_json::to_string_pretty(profile)
            .map_err(|e| LayoutError::Malformed(e.to_string()))?;
        std::fs::write(&path, json)?;
        info!(layout = name, windows = profile.len(), path = %path.display(), "layout saved");
        Ok(())
    }

    /// Names of all stored layouts, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.dir)
            .into_iter()
            .flatten()
            .flatten()
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) == Some("json") {
                    path.file_stem()
                        .and_then(|s| s.to_str())
                        .map(String::from)
                } else {
                    None
                }
            })
            .collect();
        names.sort();
        names
    }
}
