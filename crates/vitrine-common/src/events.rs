use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::id::WindowId;
use crate::types::Geometry;

/// Events the core emits outward, consumed by the shell for user feedback
/// and by anything observing layout state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ShellEvent {
    /// The set of windows or any geometry changed.
    LayoutChanged,
    /// A single window's geometry was updated (drag, resize, or restore).
    GeometryChanged { id: WindowId, geometry: Geometry },
    /// Edit mode was toggled.
    EditModeChanged { enabled: bool },
    /// An authentication popup reached a terminal verdict.
    PopupResolved { origin: String, success: bool },
    /// An authentication popup hit its completion deadline.
    PopupTimedOut { parent_id: WindowId },
    /// A content window was closed.
    WindowClosed { id: WindowId },
    Shutdown,
    #[serde(other)]
    Unknown,
}

pub struct EventBus {
    sender: broadcast::Sender<ShellEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ShellEvent> {
        self.sender.subscribe()
    }

    /// Publish an event, returning how many subscribers received it.
    pub fn publish(&self, event: ShellEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}
