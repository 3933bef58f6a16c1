//! Edit mode: drag/resize of content windows via pointer input.
//!
//! The controller owns a global edit flag and, per window, the pointer
//! tracking needed to turn move events into geometry deltas. Hit testing
//! and delta application are pure functions so the transition table is
//! testable with synthetic coordinates, no real input source required.

use std::collections::HashMap;

use tracing::debug;

use vitrine_common::{Geometry, WindowId};

use crate::registry::{InteractionState, WindowRegistry};

/// Side of the bottom-right resize handle square, in pixels.
pub const RESIZE_MARGIN: i32 = 16;

/// Smallest width/height a resize can produce.
pub const MIN_WINDOW_DIM: i32 = 200;

/// Where a press landed inside a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitZone {
    /// Anywhere but the handle: frameless windows drag from the body.
    Body,
    /// The bottom-right handle square.
    ResizeHandle,
    /// Outside the window entirely.
    Outside,
}

/// Pointer input, in window-local coordinates for presses (hit testing)
/// and screen coordinates for movement (deltas survive the window moving
/// under the cursor).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Pressed {
        local_x: f64,
        local_y: f64,
        screen_x: f64,
        screen_y: f64,
    },
    Moved {
        screen_x: f64,
        screen_y: f64,
    },
    Released,
}

/// Classify a press position against the window's current geometry.
pub fn hit_zone(geometry: &Geometry, local_x: f64, local_y: f64) -> HitZone {
    if !geometry.contains_local(local_x, local_y) {
        return HitZone::Outside;
    }
    let handle_x = (geometry.width - RESIZE_MARGIN) as f64;
    let handle_y = (geometry.height - RESIZE_MARGIN) as f64;
    if local_x >= handle_x && local_y >= handle_y {
        HitZone::ResizeHandle
    } else {
        HitZone::Body
    }
}

/// Apply a pointer delta to a geometry for the given interaction state.
/// `Normal` yields no change.
pub fn apply_delta(
    state: InteractionState,
    geometry: Geometry,
    dx: i32,
    dy: i32,
) -> Option<Geometry> {
    match state {
        InteractionState::Normal => None,
        InteractionState::Dragging => Some(geometry.moved_by(dx, dy)),
        InteractionState::Resizing => Some(geometry.resized_by(dx, dy, MIN_WINDOW_DIM)),
    }
}

/// Translates pointer input into registry mutations while edit mode is on.
pub struct EditModeController {
    enabled: bool,
    /// Last observed screen position per actively-manipulated window.
    tracks: HashMap<WindowId, (f64, f64)>,
}

impl EditModeController {
    pub fn new() -> Self {
        Self {
            enabled: false,
            tracks: HashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Toggle edit mode. Turning it off mid-drag forces every window back
    /// to `Normal`; the last computed geometry stays committed because
    /// each move already wrote through the registry.
    pub fn toggle(&mut self, registry: &mut WindowRegistry) -> bool {
        self.set_enabled(!self.enabled, registry);
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool, registry: &mut WindowRegistry) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        if !enabled {
            registry.reset_interaction_states();
            self.tracks.clear();
        }
        debug!(enabled, "edit mode changed");
    }

    /// Feed one pointer event for one window. Returns `true` when the
    /// event was consumed by edit mode; `false` means pass-through to
    /// content (edit mode off, or unknown window).
    pub fn pointer_event(
        &mut self,
        id: &WindowId,
        event: PointerEvent,
        registry: &mut WindowRegistry,
    ) -> bool {
        if !self.enabled {
            return false;
        }
        let Some(current) = registry.get(id).map(|w| w.geometry()) else {
            return false;
        };

        match event {
            PointerEvent::Pressed {
                local_x,
                local_y,
                screen_x,
                screen_y,
            } => {
                let state = match hit_zone(&current, local_x, local_y) {
                    HitZone::ResizeHandle => InteractionState::Resizing,
                    HitZone::Body => InteractionState::Dragging,
                    HitZone::Outside => return false,
                };
                // Known id: the registry lookup above already succeeded.
                let _ = registry.set_interaction_state(id, state);
                self.tracks.insert(id.clone(), (screen_x, screen_y));
                true
            }
            PointerEvent::Moved { screen_x, screen_y } => {
                let Some(&(last_x, last_y)) = self.tracks.get(id) else {
                    return false;
                };
                let state = registry
                    .interaction_state(id)
                    .unwrap_or(InteractionState::Normal);
                let dx = (screen_x - last_x).round() as i32;
                let dy = (screen_y - last_y).round() as i32;
                if let Some(updated) = apply_delta(state, current, dx, dy) {
                    let _ = registry.update_geometry(id, updated);
                    self.tracks.insert(id.clone(), (screen_x, screen_y));
                    true
                } else {
                    false
                }
            }
            PointerEvent::Released => {
                let _ = registry.set_interaction_state(id, InteractionState::Normal);
                self.tracks.remove(id).is_some()
            }
        }
    }
}

impl Default for EditModeController {
    fn default() -> Self {
        Self::new()
    }
}
