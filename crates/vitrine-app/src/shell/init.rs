//! Startup: load the layout, create native windows and surfaces.

use std::collections::BTreeMap;
use std::sync::Arc;

use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event_loop::ActiveEventLoop;
use winit::window::Window;

use vitrine_common::{LayoutError, Notification, PopupId, WindowId};
use vitrine_layout::{LayoutProfile, WindowSpec};
use vitrine_webview::SurfaceKey;

use super::core::Shell;

impl Shell {
    /// Populate the registry from the startup layout and realize each
    /// entry as a frameless native window with a content surface.
    pub(super) fn init_windows(&mut self, event_loop: &ActiveEventLoop) {
        match &self.credentials {
            Some(_) => tracing::info!(
                "explicit credentials available to the authentication collaborator"
            ),
            None => tracing::info!("no explicit credentials, relying on platform SSO"),
        }

        let profile = self.load_startup_profile(event_loop);

        if let Err(e) = self.registry.load_profile(profile) {
            tracing::error!("layout rejected: {e}");
            self.notifications
                .push(Notification::error(format!("layout rejected: {e}")));
        }

        for id in self.registry.ids() {
            let Some(window) = self.registry.get(&id) else {
                continue;
            };
            let spec = WindowSpec {
                id: id.clone(),
                url: window.url().to_string(),
                geometry: window.geometry(),
            };
            self.create_content_window(event_loop, &spec);
        }

        if self.registry.is_empty() {
            tracing::warn!("no content windows configured, shell is idle");
        }
    }

    /// Resolve the startup layout: a stored layout under the requested
    /// name, a stored view of that name scaled to the primary screen, or
    /// an empty profile. Absence of either file is not fatal.
    fn load_startup_profile(&mut self, event_loop: &ActiveEventLoop) -> LayoutProfile {
        match self.store.load(&self.layout_name) {
            Ok(profile) => return profile,
            Err(LayoutError::NotFound(name)) => {
                tracing::info!(layout = %name, "no stored layout, checking views");
            }
            Err(e) => {
                tracing::error!("layout load failed: {e}");
                self.notifications
                    .push(Notification::error(format!("layout load failed: {e}")));
                return LayoutProfile::default();
            }
        }

        let views = match self.views.load_all() {
            Ok(views) => views,
            Err(e) => {
                tracing::warn!("view store unreadable: {e}");
                return LayoutProfile::default();
            }
        };
        let Some(view) = views.get(&self.layout_name) else {
            tracing::warn!(layout = %self.layout_name, "neither layout nor view found, starting empty");
            return LayoutProfile::default();
        };

        // Views reference window ids; URLs come from the default layout.
        let urls: BTreeMap<WindowId, String> = self
            .store
            .load(&self.config.general.default_layout)
            .map(|p| p.entries.into_iter().map(|s| (s.id, s.url)).collect())
            .unwrap_or_default();

        let (width, height) = event_loop
            .primary_monitor()
            .map(|m| {
                let size = m.size();
                (size.width, size.height)
            })
            .unwrap_or((1920, 1080));

        tracing::info!(view = %view.name, width, height, "resolving view against screen");
        view.resolve(width, height, &urls)
    }

    /// Create the native window + surface for one content spec. Failures
    /// are isolated: the window is skipped, the rest of the shell runs.
    pub(super) fn create_content_window(
        &mut self,
        event_loop: &ActiveEventLoop,
        spec: &WindowSpec,
    ) -> bool {
        let g = spec.geometry;
        let attrs = Window::default_attributes()
            .with_title(spec.id.as_str())
            .with_decorations(false)
            .with_position(PhysicalPosition::new(g.x, g.y))
            .with_inner_size(PhysicalSize::new(g.width as u32, g.height as u32));

        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                tracing::error!(window_id = %spec.id, "native window creation failed: {e}");
                return false;
            }
        };

        match self.surfaces.create_content(
            spec.id.clone(),
            window.as_ref(),
            &spec.url,
            &self.surface_config,
        ) {
            Ok(handle) => {
                self.probe_session_record(&spec.url);
                let key = SurfaceKey::Content(spec.id.clone());
                self.by_native_id.insert(window.id(), key.clone());
                self.native.insert(key, window);
                self.surface_registry.insert(handle);
                true
            }
            Err(e) => {
                tracing::error!(window_id = %spec.id, "surface creation failed: {e}");
                self.notifications.push(Notification::error(format!(
                    "window {} failed to start: {e}",
                    spec.id
                )));
                false
            }
        }
    }

    /// Create the native window + surface for a tracked popup. Popups keep
    /// their decorations so the user can abandon the flow.
    pub(super) fn create_popup_window(
        &mut self,
        event_loop: &ActiveEventLoop,
        popup_id: &PopupId,
        url: &str,
    ) -> bool {
        let attrs = Window::default_attributes()
            .with_title("Sign in")
            .with_inner_size(PhysicalSize::new(520u32, 680u32));

        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                tracing::error!(popup_id = %popup_id, "popup window creation failed: {e}");
                return false;
            }
        };

        match self
            .surfaces
            .create_popup(popup_id.clone(), window.as_ref(), url, &self.surface_config)
        {
            Ok(handle) => {
                let key = SurfaceKey::Popup(popup_id.clone());
                self.by_native_id.insert(window.id(), key.clone());
                self.native.insert(key, window);
                self.surface_registry.insert(handle);
                true
            }
            Err(e) => {
                tracing::error!(popup_id = %popup_id, "popup surface creation failed: {e}");
                false
            }
        }
    }

    /// Tear down a surface and its native window. Idempotent.
    pub(super) fn close_surface(&mut self, key: &SurfaceKey) {
        // Surface first: the webview must not outlive its window.
        self.surface_registry.destroy(key);
        if let Some(window) = self.native.remove(key) {
            self.by_native_id.remove(&window.id());
        }
    }

    /// Lazily check for a stored session record for this content's origin.
    fn probe_session_record(&self, url: &str) {
        let Some(origin) = vitrine_broker::origin_of(url) else {
            return;
        };
        match self.profile_store.load(&origin) {
            Ok(Some(_)) => tracing::debug!(origin = %origin, "stored session state found"),
            Ok(None) => tracing::debug!(origin = %origin, "no stored session state"),
            Err(e) => tracing::warn!(origin = %origin, "session store read failed: {e}"),
        }
    }
}
