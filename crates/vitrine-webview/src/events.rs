//! Surface event types.

use vitrine_common::{PopupId, WindowId};

/// Which surface an event came from. Content windows and popups live in
/// different id spaces; keeping the key typed makes correlation explicit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SurfaceKey {
    Content(WindowId),
    Popup(PopupId),
}

/// State of a page load lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLoadState {
    Started,
    Finished,
}

impl From<wry::PageLoadEvent> for PageLoadState {
    fn from(e: wry::PageLoadEvent) -> Self {
        match e {
            wry::PageLoadEvent::Started => Self::Started,
            wry::PageLoadEvent::Finished => Self::Finished,
        }
    }
}

/// Events emitted by managed surfaces, drained on the event loop.
#[derive(Debug, Clone)]
pub enum SurfaceEvent {
    /// A navigation is happening inside a surface.
    Navigation { key: SurfaceKey, url: String },
    /// Page load state changed.
    PageLoad {
        key: SurfaceKey,
        state: PageLoadState,
        url: String,
    },
    /// Document title changed.
    TitleChanged { key: SurfaceKey, title: String },
    /// A content window asked to open a new top-level window. The native
    /// popup is denied; the broker decides whether to track one.
    PopupRequested { parent: WindowId, url: String },
    /// A message posted from page script (explicit auth signals).
    IpcMessage { key: SurfaceKey, body: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_keys_are_distinct() {
        let content = SurfaceKey::Content(WindowId::from("pbi"));
        let popup = SurfaceKey::Popup(PopupId::new());
        assert_ne!(content, popup);
        assert_eq!(content, SurfaceKey::Content(WindowId::from("pbi")));
    }

    #[test]
    fn page_load_state_from_wry() {
        assert_eq!(
            PageLoadState::from(wry::PageLoadEvent::Started),
            PageLoadState::Started
        );
        assert_eq!(
            PageLoadState::from(wry::PageLoadEvent::Finished),
            PageLoadState::Finished
        );
    }
}
