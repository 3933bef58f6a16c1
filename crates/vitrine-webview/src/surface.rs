//! Surface lifecycle: building WebViews with the handlers the shell needs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};
use wry::raw_window_handle;
use wry::{WebView, WebViewBuilder};

use vitrine_common::{PopupId, WindowId};

use crate::events::{PageLoadState, SurfaceEvent, SurfaceKey};

/// Options for creating a surface.
#[derive(Debug, Clone)]
pub struct SurfaceConfig {
    /// User agent presented to embedded content. Enterprise proxies filter
    /// unknown agents, so the default imitates a desktop Chrome.
    pub user_agent: String,
    pub transparent: bool,
    pub devtools: bool,
    pub clipboard: bool,
    pub autoplay: bool,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                         AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/121.0.0.0 Safari/537.36"
                .to_string(),
            transparent: false,
            devtools: cfg!(debug_assertions),
            clipboard: true,
            autoplay: true,
        }
    }
}

/// Handle to one managed surface.
pub struct SurfaceHandle {
    webview: WebView,
    key: SurfaceKey,
    current_url: String,
}

impl SurfaceHandle {
    pub fn key(&self) -> &SurfaceKey {
        &self.key
    }

    pub fn current_url(&self) -> &str {
        &self.current_url
    }

    /// Navigate to a URL.
    pub fn load_url(&mut self, url: &str) -> Result<(), wry::Error> {
        self.current_url = url.to_string();
        self.webview.load_url(url)
    }

    /// Re-request the current URL. Used after authentication completes so
    /// the page picks up the freshly written session state.
    pub fn reload(&mut self) -> Result<(), wry::Error> {
        let url = self.current_url.clone();
        debug!(key = ?self.key, url = %url, "reloading surface");
        self.webview.load_url(&url)
    }

    /// Track a navigation observed via surface events.
    pub fn note_navigation(&mut self, url: &str) {
        self.current_url = url.to_string();
    }

    pub fn evaluate_script(&self, js: &str) -> Result<(), wry::Error> {
        self.webview.evaluate_script(js)
    }

    pub fn set_visible(&self, visible: bool) -> Result<(), wry::Error> {
        self.webview.set_visible(visible)
    }
}

/// Builds surfaces and collects their events into a sink the event loop
/// drains each turn.
pub struct SurfaceManager {
    events: Arc<Mutex<Vec<SurfaceEvent>>>,
}

impl SurfaceManager {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Drain all pending surface events.
    pub fn drain_events(&self) -> Vec<SurfaceEvent> {
        let mut events = self.events.lock().unwrap();
        std::mem::take(&mut *events)
    }

    /// Create the surface for a content window. New-window requests are
    /// denied natively and surfaced as `PopupRequested` for the broker.
    pub fn create_content<W: raw_window_handle::HasWindowHandle>(
        &self,
        id: WindowId,
        window: &W,
        url: &str,
        config: &SurfaceConfig,
    ) -> Result<SurfaceHandle, wry::Error> {
        let key = SurfaceKey::Content(id.clone());
        let parent = id.clone();
        let events = Arc::clone(&self.events);

        let builder = self
            .base_builder(key.clone(), url, config)
            .with_new_window_req_handler(move |req_url| {
                debug!(parent_id = %parent, url = %req_url, "new window requested by content");
                if let Ok(mut evts) = events.lock() {
                    evts.push(SurfaceEvent::PopupRequested {
                        parent: parent.clone(),
                        url: req_url,
                    });
                }
                false
            });

        let webview = builder.build(window)?;
        debug!(window_id = %id, url = %url, "content surface created");
        Ok(SurfaceHandle {
            webview,
            key,
            current_url: url.to_string(),
        })
    }

    /// Create the surface for a tracked popup. Nested new-window requests
    /// from a popup are refused outright.
    pub fn create_popup<W: raw_window_handle::HasWindowHandle>(
        &self,
        id: PopupId,
        window: &W,
        url: &str,
        config: &SurfaceConfig,
    ) -> Result<SurfaceHandle, wry::Error> {
        let key = SurfaceKey::Popup(id.clone());
        let popup = id.clone();

        let builder = self
            .base_builder(key.clone(), url, config)
            .with_new_window_req_handler(move |req_url| {
                warn!(popup_id = %popup, url = %req_url, "refusing nested popup");
                false
            });

        let webview = builder.build(window)?;
        debug!(popup_id = %id, url = %url, "popup surface created");
        Ok(SurfaceHandle {
            webview,
            key,
            current_url: url.to_string(),
        })
    }

    /// Common builder setup: content, handlers that feed the event sink.
    fn base_builder<'a>(
        &self,
        key: SurfaceKey,
        url: &str,
        config: &SurfaceConfig,
    ) -> WebViewBuilder<'a> {
        let mut builder = WebViewBuilder::new()
            .with_url(url)
            .with_transparent(config.transparent)
            .with_devtools(config.devtools)
            .with_clipboard(config.clipboard)
            .with_autoplay(config.autoplay)
            .with_user_agent(&config.user_agent);

        let events = Arc::clone(&self.events);
        let nav_key = key.clone();
        builder = builder.with_navigation_handler(move |nav_url| {
            debug!(key = ?nav_key, url = %nav_url, "navigation");
            if let Ok(mut evts) = events.lock() {
                evts.push(SurfaceEvent::Navigation {
                    key: nav_key.clone(),
                    url: nav_url.clone(),
                });
            }
            true
        });

        let events = Arc::clone(&self.events);
        let load_key = key.clone();
        builder = builder.with_on_page_load_handler(move |event, load_url| {
            let state = PageLoadState::from(event);
            if let Ok(mut evts) = events.lock() {
                evts.push(SurfaceEvent::PageLoad {
                    key: load_key.clone(),
                    state,
                    url: load_url,
                });
            }
        });

        let events = Arc::clone(&self.events);
        let title_key = key.clone();
        builder = builder.with_document_title_changed_handler(move |title| {
            if let Ok(mut evts) = events.lock() {
                evts.push(SurfaceEvent::TitleChanged {
                    key: title_key.clone(),
                    title,
                });
            }
        });

        let events = Arc::clone(&self.events);
        let ipc_key = key;
        builder = builder.with_ipc_handler(move |request| {
            let body = request.body().to_string();
            if serde_json::from_str::<serde_json::Value>(&body).is_err() {
                warn!(key = ?ipc_key, "surface message rejected: invalid JSON");
                return;
            }
            if let Ok(mut evts) = events.lock() {
                evts.push(SurfaceEvent::IpcMessage {
                    key: ipc_key.clone(),
                    body,
                });
            }
        });

        builder
    }
}

impl Default for SurfaceManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns the live surface handles, keyed the same way events are.
pub struct SurfaceRegistry {
    handles: HashMap<SurfaceKey, SurfaceHandle>,
}

impl SurfaceRegistry {
    pub fn new() -> Self {
        Self {
            handles: HashMap::new(),
        }
    }

    pub fn insert(&mut self, handle: SurfaceHandle) {
        self.handles.insert(handle.key.clone(), handle);
    }

    pub fn get_mut(&mut self, key: &SurfaceKey) -> Option<&mut SurfaceHandle> {
        self.handles.get_mut(key)
    }

    /// Drop a surface. Returns whether it existed (closing an
    /// already-closed popup is a no-op).
    pub fn destroy(&mut self, key: &SurfaceKey) -> bool {
        let existed = self.handles.remove(key).is_some();
        if existed {
            debug!(key = ?key, "surface destroyed");
        }
        existed
    }

    /// Show or hide every content surface. The engine consumes pointer
    /// input, so during edit mode the surfaces are hidden and the bare
    /// native windows receive the drag.
    pub fn set_content_visibility(&mut self, visible: bool) {
        for (key, handle) in self.handles.iter() {
            if matches!(key, SurfaceKey::Content(_)) {
                if let Err(e) = handle.set_visible(visible) {
                    warn!(key = ?key, "visibility change failed: {e}");
                }
            }
        }
    }

    /// Reload every content surface. Popups are left alone so in-flight
    /// authentication flows are not disturbed.
    pub fn reload_all_content(&mut self) {
        for (key, handle) in self.handles.iter_mut() {
            if matches!(key, SurfaceKey::Content(_)) {
                if let Err(e) = handle.reload() {
                    warn!(key = ?key, "reload failed: {e}");
                }
            }
        }
    }

    pub fn count(&self) -> usize {
        self.handles.len()
    }
}

impl Default for SurfaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
