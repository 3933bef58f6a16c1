//! Named views: window placements as screen fractions.
//!
//! A view records WHERE windows go as fractions of the screen, so the same
//! view renders proportionally on any display. Resolving a view against
//! the actual screen size and the known window URLs produces a pixel
//! `LayoutProfile` that loads like any other.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use vitrine_common::{Geometry, LayoutError, WindowId};

use crate::profile::{LayoutProfile, WindowSpec};

/// Fraction-of-screen bounds for width/height. x/y stay unclamped so
/// deliberately off-screen placements survive.
const MIN_FRACTION: f64 = 0.05;
const MAX_FRACTION: f64 = 2.0;

/// Normalized placement of one window inside a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewPlacement {
    pub id: WindowId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A named arrangement of windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub windows: Vec<ViewPlacement>,
}

impl View {
    /// Scale this view to pixel geometry for the given screen, looking up
    /// each window's URL. Placements referencing unknown ids are skipped
    /// with a warning.
    pub fn resolve(
        &self,
        screen_width: u32,
        screen_height: u32,
        urls: &BTreeMap<WindowId, String>,
    ) -> LayoutProfile {
        let sw = screen_width as f64;
        let sh = screen_height as f64;
        let mut entries = Vec::with_capacity(self.windows.len());

        for placement in &self.windows {
            let Some(url) = urls.get(&placement.id) else {
                warn!(view = %self.name, window_id = %placement.id, "placement references unknown window");
                continue;
            };
            let width = placement.width.clamp(MIN_FRACTION, MAX_FRACTION);
            let height = placement.height.clamp(MIN_FRACTION, MAX_FRACTION);
            entries.push(WindowSpec {
                id: placement.id.clone(),
                url: url.clone(),
                geometry: Geometry::new(
                    (placement.x * sw) as i32,
                    (placement.y * sh) as i32,
                    (width * sw) as i32,
                    (height * sh) as i32,
                ),
            });
        }

        LayoutProfile::new(entries)
    }
}

/// Persists views as a single `views.json` map keyed by view id.
pub struct ViewStore {
    path: PathBuf,
}

impl ViewStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join("views.json"),
        }
    }

    /// Load all views. A missing file yields the empty map; an unparseable
    /// file is malformed.
    pub fn load_all(&self) -> Result<BTreeMap<String, View>, LayoutError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(e) => return Err(LayoutError::Io(e)),
        };
        serde_json::from_str(&content)
            .map_err(|e| LayoutError::Malformed(format!("{}: {e}", self.path.display())))
    }

    pub fn save_all(&self, views: &BTreeMap<String, View>) -> Result<(), LayoutError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(views)
            .map_err(|e| LayoutError::Malformed(e.to_string()))?;
        std::fs::write(&self.path, json)?;
        info!(views = views.len(), path = %self.path.display(), "views saved");
        Ok(())
    }

    /// Insert or replace a single view.
    pub fn upsert(&self, view_id: &str, view: View) -> Result<(), LayoutError> {
        let mut views = self.load_all()?;
        views.insert(view_id.to_string(), view);
        self.save_all(&views)
    }

    /// Delete a view; returns whether it existed.
    pub fn delete(&self, view_id: &str) -> Result<bool, LayoutError> {
        let mut views = self.load_all()?;
        let existed = views.remove(view_id).is_some();
        if existed {
            self.save_all(&views)?;
        }
        Ok(existed)
    }
}
