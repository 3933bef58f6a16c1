//! `ApplicationHandler` implementation for the winit event loop.

use tokio::sync::broadcast::error::TryRecvError;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::window::WindowId as NativeWindowId;

use vitrine_broker::SessionInput;
use vitrine_common::{Notification, ShellEvent};
use vitrine_webview::SurfaceKey;
use vitrine_windows::{PointerEvent, RegistryEvent};

use super::core::{Shell, ShellUserEvent};

impl ApplicationHandler<ShellUserEvent> for Shell {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.initialized {
            return;
        }
        self.init_windows(event_loop);
        self.initialized = true;
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        native_id: NativeWindowId,
        event: WindowEvent,
    ) {
        let Some(key) = self.by_native_id.get(&native_id).cloned() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                self.handle_close_requested(key, event_loop);
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.cursor.insert(native_id, (position.x, position.y));
                if let SurfaceKey::Content(id) = &key {
                    if self.edit.is_enabled() {
                        let (sx, sy) = self.screen_position(&key, position.x, position.y);
                        let id = id.clone();
                        self.edit.pointer_event(
                            &id,
                            PointerEvent::Moved {
                                screen_x: sx,
                                screen_y: sy,
                            },
                            &mut self.registry,
                        );
                    }
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    self.handle_mouse_input(key, native_id, state);
                }
            }

            WindowEvent::ModifiersChanged(new_modifiers) => {
                self.modifiers = new_modifiers.state();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                self.handle_keyboard_input(event);
            }

            _ => {}
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: ShellUserEvent) {
        match event {
            ShellUserEvent::PopupDeadline(popup_id) => {
                let commands = self.broker.handle_input(&popup_id, SessionInput::TimerFired);
                self.execute_commands(commands);
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
            return;
        }
        self.pump_surface_events(event_loop);
        self.apply_registry_events();
        self.drain_bus_events();
    }
}

impl Shell {
    /// A native window is going away: cancel popup sessions, detach state.
    fn handle_close_requested(&mut self, key: SurfaceKey, event_loop: &ActiveEventLoop) {
        match &key {
            SurfaceKey::Content(id) => {
                tracing::info!(window_id = %id, "content window closed");
                // Cancel any in-flight authentication for this parent
                // before the registry forgets it.
                let commands = self.broker.parent_closed(id);
                self.execute_commands(commands);

                self.registry.remove(id);
                self.event_bus
                    .publish(ShellEvent::WindowClosed { id: id.clone() });
                self.close_surface(&key);

                if self.registry.is_empty() {
                    tracing::info!("last content window closed, quitting");
                    event_loop.exit();
                }
            }
            SurfaceKey::Popup(popup_id) => {
                tracing::info!(popup_id = %popup_id, "popup closed by user");
                let popup_id = popup_id.clone();
                let commands = self.broker.handle_input(&popup_id, SessionInput::PopupClosed);
                self.execute_commands(commands);
                // The broker's ClosePopup already tore the surface down;
                // this covers popups it no longer tracks.
                self.close_surface(&key);
            }
        }
    }

    fn handle_mouse_input(
        &mut self,
        key: SurfaceKey,
        native_id: NativeWindowId,
        state: ElementState,
    ) {
        let SurfaceKey::Content(id) = &key else {
            return;
        };
        if !self.edit.is_enabled() {
            return;
        }
        let id = id.clone();

        match state {
            ElementState::Pressed => {
                let (lx, ly) = self.cursor.get(&native_id).copied().unwrap_or((0.0, 0.0));
                let (sx, sy) = self.screen_position(&key, lx, ly);
                self.edit.pointer_event(
                    &id,
                    PointerEvent::Pressed {
                        local_x: lx,
                        local_y: ly,
                        screen_x: sx,
                        screen_y: sy,
                    },
                    &mut self.registry,
                );
            }
            ElementState::Released => {
                self.edit
                    .pointer_event(&id, PointerEvent::Released, &mut self.registry);
            }
        }
    }

    /// Window-local coordinates to screen coordinates. Falls back to local
    /// when the platform cannot report the window position.
    fn screen_position(&self, key: &SurfaceKey, local_x: f64, local_y: f64) -> (f64, f64) {
        match self.native.get(key).and_then(|w| w.outer_position().ok()) {
            Some(origin) => (origin.x as f64 + local_x, origin.y as f64 + local_y),
            None => (local_x, local_y),
        }
    }

    /// Apply observed geometry mutations to the native windows.
    pub(super) fn apply_registry_events(&mut self) {
        loop {
            let event = match self.registry_rx.try_recv() {
                Ok(event) => event,
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "registry event stream lagged");
                    continue;
                }
                Err(_) => break,
            };
            match event {
                RegistryEvent::GeometryChanged { id, geometry } => {
                    let key = SurfaceKey::Content(id.clone());
                    if let Some(window) = self.native.get(&key) {
                        window.set_outer_position(winit::dpi::PhysicalPosition::new(
                            geometry.x, geometry.y,
                        ));
                        let _ = window.request_inner_size(winit::dpi::PhysicalSize::new(
                            geometry.width.max(1) as u32,
                            geometry.height.max(1) as u32,
                        ));
                    }
                    self.event_bus
                        .publish(ShellEvent::GeometryChanged { id, geometry });
                }
                RegistryEvent::ProfileLoaded { windows } => {
                    tracing::debug!(windows, "registry populated");
                }
                RegistryEvent::WindowRemoved { .. } => {}
            }
        }
    }

    /// Turn outward shell events into user-visible notifications.
    pub(super) fn drain_bus_events(&mut self) {
        loop {
            let event = match self.bus_rx.try_recv() {
                Ok(event) => event,
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "shell event stream lagged");
                    continue;
                }
                Err(_) => break,
            };
            match event {
                ShellEvent::PopupResolved { origin, success } => {
                    if success {
                        self.notifications
                            .push(Notification::info(format!("signed in to {origin}")));
                    } else {
                        self.notifications.push(Notification::error(format!(
                            "authentication failed for {origin}"
                        )));
                    }
                }
                ShellEvent::PopupTimedOut { parent_id } => {
                    self.notifications.push(Notification::warning(format!(
                        "authentication timed out for {parent_id}, reload to retry"
                    )));
                }
                _ => {}
            }
        }
    }
}
