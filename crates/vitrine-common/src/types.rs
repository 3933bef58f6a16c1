use serde::{Deserialize, Serialize};

/// Screen-space window geometry in integer pixels.
///
/// `x`/`y` may be negative (multi-monitor, off-screen placement is
/// preserved); `width`/`height` must be positive for a spec to be valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Geometry {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether this geometry satisfies the positive-dimension invariant.
    pub fn has_positive_size(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Whether a point (window-local coordinates) lies inside.
    pub fn contains_local(&self, px: f64, py: f64) -> bool {
        px >= 0.0 && py >= 0.0 && px < self.width as f64 && py < self.height as f64
    }

    /// Translated by a pixel delta.
    pub fn moved_by(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Resized by a pixel delta, clamping both dimensions to `min_dim`.
    pub fn resized_by(&self, dw: i32, dh: i32, min_dim: i32) -> Self {
        Self {
            width: (self.width + dw).max(min_dim),
            height: (self.height + dh).max(min_dim),
            ..*self
        }
    }
}
