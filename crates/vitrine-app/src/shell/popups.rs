//! Popup plumbing: surface events in, broker commands out.

use winit::event_loop::ActiveEventLoop;

use vitrine_broker::{BrokerCommand, SessionInput};
use vitrine_common::{CorrelationError, Notification, WindowId};
use vitrine_webview::{SurfaceEvent, SurfaceKey};

use super::core::Shell;

/// Map an explicit page signal (`window.ipc.postMessage`) to a session
/// input. Content declares the outcome itself when URL matching cannot.
pub fn auth_signal(body: &str) -> Option<SessionInput> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("auth")?.as_str()? {
        "success" => Some(SessionInput::SuccessSignal),
        "failure" | "error" => Some(SessionInput::FailureSignal),
        _ => None,
    }
}

impl Shell {
    /// Drain surface events and feed them to the broker / surface state.
    pub(super) fn pump_surface_events(&mut self, event_loop: &ActiveEventLoop) {
        for event in self.surfaces.drain_events() {
            match event {
                SurfaceEvent::PopupRequested { parent, url } => {
                    self.handle_popup_request(event_loop, parent, url);
                }

                SurfaceEvent::Navigation { key, url } => {
                    if let Some(handle) = self.surface_registry.get_mut(&key) {
                        handle.note_navigation(&url);
                    }
                    if let SurfaceKey::Popup(popup_id) = key {
                        let commands = self
                            .broker
                            .handle_input(&popup_id, SessionInput::Navigated(url));
                        self.execute_commands(commands);
                    }
                }

                SurfaceEvent::IpcMessage { key, body } => {
                    if let SurfaceKey::Popup(popup_id) = key {
                        if let Some(input) = auth_signal(&body) {
                            let commands = self.broker.handle_input(&popup_id, input);
                            self.execute_commands(commands);
                        }
                    }
                }

                SurfaceEvent::PageLoad { key, state, url } => {
                    tracing::trace!(key = ?key, state = ?state, url = %url, "page load");
                }

                SurfaceEvent::TitleChanged { key, title } => {
                    tracing::trace!(key = ?key, title = %title, "title changed");
                }
            }
        }
    }

    /// A content window asked for a new top-level window. Ask the broker;
    /// if admitted, realize the tracked popup.
    fn handle_popup_request(
        &mut self,
        event_loop: &ActiveEventLoop,
        parent: WindowId,
        url: String,
    ) {
        if !self.registry.contains(&parent) {
            tracing::warn!(
                "{}",
                CorrelationError::UnknownParent(parent.to_string())
            );
            return;
        }

        // The parent's original URL plus whatever it shows now, for
        // return-to-origin matching.
        let mut parent_urls = Vec::new();
        if let Some(window) = self.registry.get(&parent) {
            parent_urls.push(window.url().to_string());
        }
        if let Some(handle) = self
            .surface_registry
            .get_mut(&SurfaceKey::Content(parent.clone()))
        {
            let current = handle.current_url().to_string();
            if !parent_urls.contains(&current) {
                parent_urls.push(current);
            }
        }

        let Some(popup_id) = self.broker.request_popup(parent.clone(), &url, parent_urls)
        else {
            return;
        };

        if self.create_popup_window(event_loop, &popup_id, &url) {
            let commands = self.broker.handle_input(&popup_id, SessionInput::Opened);
            self.execute_commands(commands);
        } else {
            // The session cannot proceed without a window; close it out.
            let commands = self
                .broker
                .handle_input(&popup_id, SessionInput::PopupClosed);
            self.execute_commands(commands);
        }
    }

    /// Carry out the effects a broker transition produced.
    pub(super) fn execute_commands(&mut self, commands: Vec<BrokerCommand>) {
        for command in commands {
            match command {
                BrokerCommand::ClosePopup { popup_id } => {
                    self.close_surface(&SurfaceKey::Popup(popup_id));
                }

                BrokerCommand::ReloadParent { parent_id } => {
                    match self
                        .surface_registry
                        .get_mut(&SurfaceKey::Content(parent_id.clone()))
                    {
                        Some(handle) => {
                            if let Err(e) = handle.reload() {
                                tracing::warn!(parent_id = %parent_id, "parent reload failed: {e}");
                            }
                        }
                        None => {
                            tracing::warn!(
                                "{}",
                                CorrelationError::UnknownParent(parent_id.to_string())
                            );
                        }
                    }
                }

                BrokerCommand::PersistSession { origin } => {
                    let now_unix = std::time::SystemTime::now()
                        .duration_since(std::time::UNIX_EPOCH)
                        .map(|d| d.as_secs())
                        .unwrap_or(0);
                    let record = serde_json::json!({ "last_authenticated_unix": now_unix });
                    if let Err(e) = self.profile_store.save(&origin, &record) {
                        tracing::warn!("session persist failed: {e}");
                        self.notifications.push(Notification::warning(format!(
                            "session for {origin} not persisted: {e}"
                        )));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_signal_parses() {
        assert_eq!(
            auth_signal(r#"{"auth": "success"}"#),
            Some(SessionInput::SuccessSignal)
        );
    }

    #[test]
    fn failure_signals_parse() {
        assert_eq!(
            auth_signal(r#"{"auth": "failure"}"#),
            Some(SessionInput::FailureSignal)
        );
        assert_eq!(
            auth_signal(r#"{"auth": "error"}"#),
            Some(SessionInput::FailureSignal)
        );
    }

    #[test]
    fn unrelated_messages_are_ignored() {
        assert_eq!(auth_signal(r#"{"auth": "pending"}"#), None);
        assert_eq!(auth_signal(r#"{"other": true}"#), None);
        assert_eq!(auth_signal("not json"), None);
    }
}
