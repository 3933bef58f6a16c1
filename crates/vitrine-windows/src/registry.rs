//! The authoritative in-memory set of live content windows.
//!
//! All geometry mutation funnels through `update_geometry`, whether it
//! comes from edit-mode dragging or a programmatic restore. Subscribers
//! observe every mutation to reposition the underlying rendering surface.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use vitrine_common::{Geometry, LayoutError, WindowId};
use vitrine_layout::{LayoutProfile, WindowSpec};

/// Per-window interaction state during edit mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionState {
    Normal,
    Dragging,
    Resizing,
}

/// A live content window: its persistable spec plus interaction state.
/// Owned exclusively by the registry; the rendering surface handle lives
/// with the shell, keyed by the same id.
#[derive(Debug, Clone)]
pub struct ContentWindow {
    spec: WindowSpec,
    state: InteractionState,
}

impl ContentWindow {
    pub fn id(&self) -> &WindowId {
        &self.spec.id
    }

    pub fn url(&self) -> &str {
        &self.spec.url
    }

    pub fn geometry(&self) -> Geometry {
        self.spec.geometry
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }
}

/// Mutations observable by subscribers.
#[derive(Debug, Clone)]
pub enum RegistryEvent {
    /// A profile replaced the window set.
    ProfileLoaded { windows: usize },
    GeometryChanged { id: WindowId, geometry: Geometry },
    WindowRemoved { id: WindowId },
}

pub struct WindowRegistry {
    windows: HashMap<WindowId, ContentWindow>,
    /// Profile order, preserved for snapshots.
    order: Vec<WindowId>,
    events: broadcast::Sender<RegistryEvent>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            windows: HashMap::new(),
            order: Vec::new(),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    /// Replace the whole window set from a profile.
    ///
    /// The profile is validated first; on any error the registry is left
    /// untouched (no partial load).
    pub fn load_profile(&mut self, profile: LayoutProfile) -> Result<(), LayoutError> {
        profile.validate()?;

        self.windows.clear();
        self.order.clear();
        for spec in profile.entries {
            self.order.push(spec.id.clone());
            self.windows.insert(
                spec.id.clone(),
                ContentWindow {
                    spec,
                    state: InteractionState::Normal,
                },
            );
        }

        debug!(windows = self.windows.len(), "profile loaded into registry");
        let _ = self.events.send(RegistryEvent::ProfileLoaded {
            windows: self.windows.len(),
        });
        Ok(())
    }

    pub fn get(&self, id: &WindowId) -> Option<&ContentWindow> {
        self.windows.get(id)
    }

    pub fn contains(&self, id: &WindowId) -> bool {
        self.windows.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Window ids in profile order.
    pub fn ids(&self) -> Vec<WindowId> {
        self.order.clone()
    }

    /// The single write path for geometry, used by edit-mode drags and by
    /// programmatic restores alike. Publishes the change to subscribers.
    pub fn update_geometry(
        &mut self,
        id: &WindowId,
        geometry: Geometry,
    ) -> Result<(), LayoutError> {
        let window = self
            .windows
            .get_mut(id)
            .ok_or_else(|| LayoutError::UnknownWindow(id.to_string()))?;
        window.spec.geometry = geometry;
        let _ = self.events.send(RegistryEvent::GeometryChanged {
            id: id.clone(),
            geometry,
        });
        Ok(())
    }

    pub fn interaction_state(&self, id: &WindowId) -> Option<InteractionState> {
        self.windows.get(id).map(|w| w.state)
    }

    pub fn set_interaction_state(
        &mut self,
        id: &WindowId,
        state: InteractionState,
    ) -> Result<(), LayoutError> {
        let window = self
            .windows
            .get_mut(id)
            .ok_or_else(|| LayoutError::UnknownWindow(id.to_string()))?;
        window.state = state;
        Ok(())
    }

    /// Force every window back to `Normal` (edit-mode exit). Geometry is
    /// untouched: in-progress drags were committed move by move.
    pub fn reset_interaction_states(&mut self) {
        for window in self.windows.values_mut() {
            window.state = InteractionState::Normal;
        }
    }

    /// Remove one window. Returns whether it existed.
    pub fn remove(&mut self, id: &WindowId) -> bool {
        if self.windows.remove(id).is_some() {
            self.order.retain(|w| w != id);
            let _ = self
                .events
                .send(RegistryEvent::WindowRemoved { id: id.clone() });
            true
        } else {
            false
        }
    }

    /// Pure read of the current persistable state, in profile order.
    pub fn snapshot(&self) -> LayoutProfile {
        LayoutProfile::new(
            self.order
                .iter()
                .filter_map(|id| self.windows.get(id).map(|w| w.spec.clone()))
                .collect(),
        )
    }
}

impl Default for WindowRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> LayoutProfile {
        LayoutProfile::new(vec![
            WindowSpec::new("pbi", "https://app.powerbi.com/r", Geometry::new(850, 50, 1000, 700)),
            WindowSpec::new("docs", "https://example.sharepoint.com", Geometry::new(0, 50, 840, 700)),
        ])
    }

    #[test]
    fn load_profile_populates_in_order() {
        let mut reg = WindowRegistry::new();
        reg.load_profile(profile()).unwrap();

        assert_eq!(reg.len(), 2);
        assert_eq!(
            reg.ids(),
            vec![WindowId::from("pbi"), WindowId::from("docs")]
        );
        let pbi = reg.get(&WindowId::from("pbi")).unwrap();
        assert_eq!(pbi.geometry(), Geometry::new(850, 50, 1000, 700));
        assert_eq!(pbi.state(), InteractionState::Normal);
    }

    #[test]
    fn duplicate_id_leaves_registry_unchanged() {
        let mut reg = WindowRegistry::new();
        reg.load_profile(profile()).unwrap();

        let dup = LayoutProfile::new(vec![
            WindowSpec::new("x", "https://a", Geometry::new(0, 0, 100, 100)),
            WindowSpec::new("x", "https://b", Geometry::new(0, 0, 100, 100)),
        ]);
        let err = reg.load_profile(dup).unwrap_err();
        assert!(matches!(err, LayoutError::DuplicateId(_)));

        // No partial load: previous windows intact
        assert_eq!(reg.len(), 2);
        assert!(reg.contains(&WindowId::from("pbi")));
        assert!(!reg.contains(&WindowId::from("x")));
    }

    #[test]
    fn update_geometry_mutates_and_publishes() {
        let mut reg = WindowRegistry::new();
        let mut rx = reg.subscribe();
        reg.load_profile(profile()).unwrap();

        let id = WindowId::from("pbi");
        let target = Geometry::new(0, 0, 640, 480);
        reg.update_geometry(&id, target).unwrap();
        assert_eq!(reg.get(&id).unwrap().geometry(), target);

        // First event is the profile load, second the geometry change
        assert!(matches!(
            rx.try_recv().unwrap(),
            RegistryEvent::ProfileLoaded { windows: 2 }
        ));
        match rx.try_recv().unwrap() {
            RegistryEvent::GeometryChanged { id: eid, geometry } => {
                assert_eq!(eid, id);
                assert_eq!(geometry, target);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn update_geometry_unknown_id_errors() {
        let mut reg = WindowRegistry::new();
        reg.load_profile(profile()).unwrap();
        let err = reg
            .update_geometry(&WindowId::from("ghost"), Geometry::new(0, 0, 1, 1))
            .unwrap_err();
        assert!(matches!(err, LayoutError::UnknownWindow(_)));
    }

    #[test]
    fn snapshot_round_trips_current_state() {
        let mut reg = WindowRegistry::new();
        let original = profile();
        reg.load_profile(original.clone()).unwrap();
        assert_eq!(reg.snapshot(), original);

        let moved = Geometry::new(10, 20, 1000, 700);
        reg.update_geometry(&WindowId::from("pbi"), moved).unwrap();
        let snap = reg.snapshot();
        assert_eq!(snap.entries[0].geometry, moved);
        assert_eq!(snap.entries[1], original.entries[1]);
    }

    #[test]
    fn remove_window() {
        let mut reg = WindowRegistry::new();
        reg.load_profile(profile()).unwrap();

        assert!(reg.remove(&WindowId::from("pbi")));
        assert!(!reg.remove(&WindowId::from("pbi")));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.ids(), vec![WindowId::from("docs")]);
        assert_eq!(reg.snapshot().len(), 1);
    }

    #[test]
    fn reset_interaction_states() {
        let mut reg = WindowRegistry::new();
        reg.load_profile(profile()).unwrap();

        let id = WindowId::from("pbi");
        reg.set_interaction_state(&id, InteractionState::Dragging)
            .unwrap();
        assert_eq!(reg.interaction_state(&id), Some(InteractionState::Dragging));

        reg.reset_interaction_states();
        assert_eq!(reg.interaction_state(&id), Some(InteractionState::Normal));
    }
}
