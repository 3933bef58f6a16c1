//! Session tracking, correlation, timers, and effects.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use vitrine_common::{CorrelationError, EventBus, PopupId, ShellEvent, WindowId};

use crate::matcher::{CompletionMatcher, MatchContext, MatchOutcome};
use crate::session::{next_state, PopupSession, SessionInput, PopupState};

/// Default completion deadline for a popup session.
const DEFAULT_TIMEOUT_SECS: u64 = 90;

#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// How long a session may stay unresolved before it times out.
    pub timeout: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Effects the broker asks the shell to carry out. The broker itself never
/// touches a rendering handle; it only produces these.
#[derive(Debug, Clone, PartialEq)]
pub enum BrokerCommand {
    /// Destroy the popup window (idempotent: it may already be gone).
    ClosePopup { popup_id: PopupId },
    /// Reload the parent content window so fresh session state takes effect.
    ReloadParent { parent_id: WindowId },
    /// Persist session state for the resolved origin.
    PersistSession { origin: String },
}

/// Timer plumbing: expiry notifications are delivered over a channel the
/// shell pumps back in as `TimerFired` inputs, keeping transitions
/// event-driven.
struct TimerWiring {
    handle: tokio::runtime::Handle,
    expired: mpsc::UnboundedSender<PopupId>,
}

/// Tracks every in-flight popup session. Sessions are independent state
/// machines keyed by popup id; an event for one can never touch another.
pub struct PopupBroker {
    sessions: HashMap<PopupId, PopupSession>,
    matcher: Arc<dyn CompletionMatcher>,
    timeout: Duration,
    events: Arc<EventBus>,
    timer_wiring: Option<TimerWiring>,
    timers: HashMap<PopupId, JoinHandle<()>>,
}

impl PopupBroker {
    pub fn new(
        matcher: Arc<dyn CompletionMatcher>,
        config: BrokerConfig,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            sessions: HashMap::new(),
            matcher,
            timeout: config.timeout,
            events,
            timer_wiring: None,
            timers: HashMap::new(),
        }
    }

    /// Wire up real timers. Without this (pure unit tests), `TimerFired`
    /// inputs are injected by the caller.
    pub fn enable_timers(
        &mut self,
        handle: tokio::runtime::Handle,
        expired: mpsc::UnboundedSender<PopupId>,
    ) {
        self.timer_wiring = Some(TimerWiring { handle, expired });
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn state_of(&self, popup_id: &PopupId) -> Option<PopupState> {
        self.sessions.get(popup_id).map(|s| s.state)
    }

    pub fn sessions_for_parent(&self, parent_id: &WindowId) -> Vec<PopupId> {
        self.sessions
            .values()
            .filter(|s| &s.parent_id == parent_id)
            .map(|s| s.popup_id.clone())
            .collect()
    }

    /// Decide whether to honor a new-window request from a content window.
    ///
    /// Only http(s) targets become tracked popups; anything else is refused
    /// outright. On admission a session is created in `Requested` and its
    /// completion timer armed.
    pub fn request_popup(
        &mut self,
        parent_id: WindowId,
        requested_url: &str,
        parent_urls: Vec<String>,
    ) -> Option<PopupId> {
        match Url::parse(requested_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                warn!(
                    parent_id = %parent_id,
                    url = %requested_url,
                    "refusing popup request with non-http(s) target"
                );
                return None;
            }
        }

        let session = PopupSession::new(parent_id, requested_url.to_string(), parent_urls);
        let popup_id = session.popup_id.clone();
        info!(
            popup_id = %popup_id,
            parent_id = %session.parent_id,
            url = %requested_url,
            "tracking authentication popup"
        );
        self.sessions.insert(popup_id.clone(), session);
        self.arm_timer(popup_id.clone());
        Some(popup_id)
    }

    /// Feed one input to one session. Inputs for unknown sessions are
    /// correlation noise: logged and dropped, never fatal.
    pub fn handle_input(&mut self, popup_id: &PopupId, input: SessionInput) -> Vec<BrokerCommand> {
        let Some(session) = self.sessions.get_mut(popup_id) else {
            warn!(
                input = ?input,
                "{}",
                CorrelationError::UnknownPopup(popup_id.to_string())
            );
            return Vec::new();
        };

        let outcome = match &input {
            SessionInput::Navigated(url) => {
                let ctx = MatchContext {
                    candidate_url: url,
                    parent_urls: &session.parent_urls,
                };
                self.matcher.classify(&ctx)
            }
            _ => MatchOutcome::Neutral,
        };

        if let SessionInput::Navigated(url) = &input {
            session.last_observed_url = Some(url.clone());
        }

        let Some(next) = next_state(session.state, &input, outcome) else {
            debug!(popup_id = %popup_id, state = ?session.state, input = ?input, "input ignored");
            return Vec::new();
        };

        debug!(popup_id = %popup_id, from = ?session.state, to = ?next, "session transition");
        session.state = next;

        if next.is_terminal() {
            self.finalize(popup_id)
        } else {
            Vec::new()
        }
    }

    /// Cancel every session whose parent just went away. Their popups are
    /// closed without reloading anything.
    pub fn parent_closed(&mut self, parent_id: &WindowId) -> Vec<BrokerCommand> {
        let affected = self.sessions_for_parent(parent_id);
        let mut commands = Vec::new();
        for popup_id in affected {
            debug!(popup_id = %popup_id, parent_id = %parent_id, "cancelling session, parent closed");
            commands.extend(self.handle_input(&popup_id, SessionInput::ParentClosed));
        }
        commands
    }

    /// A terminal state was entered: cancel the timer, drop the session,
    /// and derive the effects the shell must execute.
    fn finalize(&mut self, popup_id: &PopupId) -> Vec<BrokerCommand> {
        self.cancel_timer(popup_id);
        let Some(session) = self.sessions.remove(popup_id) else {
            return Vec::new();
        };

        let mut commands = vec![BrokerCommand::ClosePopup {
            popup_id: session.popup_id.clone(),
        }];

        match session.state {
            PopupState::Completed => {
                info!(
                    popup_id = %session.popup_id,
                    parent_id = %session.parent_id,
                    "authentication completed, reloading parent"
                );
                commands.push(BrokerCommand::ReloadParent {
                    parent_id: session.parent_id.clone(),
                });
                let origin = origin_of(session.resolved_url());
                if let Some(origin) = &origin {
                    commands.push(BrokerCommand::PersistSession {
                        origin: origin.clone(),
                    });
                } else {
                    warn!(url = %session.resolved_url(), "cannot derive origin, skipping persist");
                }
                self.events.publish(ShellEvent::PopupResolved {
                    origin: origin.unwrap_or_else(|| session.resolved_url().to_string()),
                    success: true,
                });
            }
            PopupState::Failed => {
                warn!(
                    popup_id = %session.popup_id,
                    parent_id = %session.parent_id,
                    url = %session.resolved_url(),
                    "authentication failed"
                );
                self.events.publish(ShellEvent::PopupResolved {
                    origin: origin_of(session.resolved_url())
                        .unwrap_or_else(|| session.resolved_url().to_string()),
                    success: false,
                });
            }
            PopupState::TimedOut => {
                warn!(
                    popup_id = %session.popup_id,
                    parent_id = %session.parent_id,
                    "authentication popup timed out"
                );
                self.events.publish(ShellEvent::PopupTimedOut {
                    parent_id: session.parent_id.clone(),
                });
            }
            PopupState::Closed => {
                info!(popup_id = %session.popup_id, "popup closed before resolution");
            }
            // finalize is only reached from terminal states
            _ => {}
        }

        commands
    }

    fn arm_timer(&mut self, popup_id: PopupId) {
        let Some(wiring) = &self.timer_wiring else {
            return;
        };
        let expired = wiring.expired.clone();
        let timeout = self.timeout;
        let id = popup_id.clone();
        let task = wiring.handle.spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = expired.send(id);
        });
        self.timers.insert(popup_id, task);
    }

    fn cancel_timer(&mut self, popup_id: &PopupId) {
        if let Some(task) = self.timers.remove(popup_id) {
            task.abort();
        }
    }
}

/// Scheme://host[:port] of a URL, if it parses.
pub fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    if !parsed.has_host() {
        return None;
    }
    Some(parsed.origin().ascii_serialization())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::OriginReturnMatcher;

    const PARENT_URL: &str = "https://app.powerbi.com/reportEmbed";
    const IDP_URL: &str = "https://login.microsoftonline.com/common/oauth2/authorize";

    fn broker() -> PopupBroker {
        PopupBroker::new(
            Arc::new(OriginReturnMatcher::default()),
            BrokerConfig::default(),
            Arc::new(EventBus::new(16)),
        )
    }

    fn request(broker: &mut PopupBroker, parent: &str) -> PopupId {
        broker
            .request_popup(
                WindowId::from(parent),
                IDP_URL,
                vec![PARENT_URL.to_string()],
            )
            .unwrap()
    }

    fn nav(url: &str) -> SessionInput {
        SessionInput::Navigated(url.to_string())
    }

    // -- Admission --

    #[test]
    fn https_requests_are_admitted() {
        let mut b = broker();
        assert!(b
            .request_popup(WindowId::from("pbi"), IDP_URL, vec![])
            .is_some());
        assert_eq!(b.session_count(), 1);
    }

    #[test]
    fn non_http_schemes_are_refused() {
        let mut b = broker();
        for url in ["javascript:alert(1)", "data:text/html,x", "file:///etc/passwd", "garbage"] {
            assert!(b.request_popup(WindowId::from("pbi"), url, vec![]).is_none());
        }
        assert_eq!(b.session_count(), 0);
    }

    // -- Happy path --

    #[test]
    fn completed_flow_closes_reloads_and_persists() {
        let bus = Arc::new(EventBus::new(16));
        let mut b = PopupBroker::new(
            Arc::new(OriginReturnMatcher::default()),
            BrokerConfig::default(),
            bus.clone(),
        );
        let mut events = bus.subscribe();

        let id = request(&mut b, "pbi");
        assert!(b.handle_input(&id, SessionInput::Opened).is_empty());
        assert_eq!(b.state_of(&id), Some(PopupState::Opened));

        assert!(b.handle_input(&id, nav(IDP_URL)).is_empty());
        assert_eq!(b.state_of(&id), Some(PopupState::Authenticating));

        let commands = b.handle_input(&id, nav("https://app.powerbi.com/reportEmbed?code=ok"));
        assert_eq!(
            commands,
            vec![
                BrokerCommand::ClosePopup {
                    popup_id: id.clone()
                },
                BrokerCommand::ReloadParent {
                    parent_id: WindowId::from("pbi")
                },
                BrokerCommand::PersistSession {
                    origin: "https://app.powerbi.com".to_string()
                },
            ]
        );
        // Session removed on terminal state
        assert_eq!(b.session_count(), 0);
        assert!(b.state_of(&id).is_none());

        let event = events.try_recv().unwrap();
        assert!(
            matches!(event, ShellEvent::PopupResolved { ref origin, success } if origin == "https://app.powerbi.com" && success)
        );
    }

    #[test]
    fn explicit_success_signal_completes() {
        let mut b = broker();
        let id = request(&mut b, "pbi");
        b.handle_input(&id, SessionInput::Opened);
        let commands = b.handle_input(&id, SessionInput::SuccessSignal);
        assert!(commands
            .iter()
            .any(|c| matches!(c, BrokerCommand::ReloadParent { .. })));
    }

    // -- Failure --

    #[test]
    fn failed_flow_leaves_parent_untouched() {
        let bus = Arc::new(EventBus::new(16));
        let mut b = PopupBroker::new(
            Arc::new(OriginReturnMatcher::default()),
            BrokerConfig::default(),
            bus.clone(),
        );
        let mut events = bus.subscribe();

        let id = request(&mut b, "pbi");
        b.handle_input(&id, SessionInput::Opened);
        let commands =
            b.handle_input(&id, nav("https://login.microsoftonline.com/reply?error=access_denied"));

        assert_eq!(
            commands,
            vec![BrokerCommand::ClosePopup {
                popup_id: id.clone()
            }]
        );
        let event = events.try_recv().unwrap();
        assert!(matches!(event, ShellEvent::PopupResolved { success: false, .. }));
    }

    // -- Correlation --

    #[test]
    fn concurrent_sessions_progress_independently() {
        let mut b = broker();
        let s1 = request(&mut b, "window-a");
        let s2 = request(&mut b, "window-b");

        b.handle_input(&s1, SessionInput::Opened);
        b.handle_input(&s2, SessionInput::Opened);
        b.handle_input(&s1, nav(IDP_URL));

        // s1 progressed, s2 did not
        assert_eq!(b.state_of(&s1), Some(PopupState::Authenticating));
        assert_eq!(b.state_of(&s2), Some(PopupState::Opened));

        // Completing s1 reloads only window-a
        let commands = b.handle_input(&s1, nav("https://app.powerbi.com/reportEmbed?code=1"));
        let reloads: Vec<_> = commands
            .iter()
            .filter_map(|c| match c {
                BrokerCommand::ReloadParent { parent_id } => Some(parent_id.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(reloads, vec![WindowId::from("window-a")]);

        // s2 is untouched and still tracked
        assert_eq!(b.state_of(&s2), Some(PopupState::Opened));
        assert_eq!(b.session_count(), 1);
    }

    #[test]
    fn unknown_popup_input_is_dropped() {
        let mut b = broker();
        let _known = request(&mut b, "pbi");
        let ghost = PopupId::new();
        assert!(b.handle_input(&ghost, nav(IDP_URL)).is_empty());
        assert_eq!(b.session_count(), 1);
    }

    // -- User close / parent close --

    #[test]
    fn user_close_means_no_reload() {
        let mut b = broker();
        let id = request(&mut b, "pbi");
        b.handle_input(&id, SessionInput::Opened);
        b.handle_input(&id, nav(IDP_URL));

        let commands = b.handle_input(&id, SessionInput::PopupClosed);
        assert_eq!(
            commands,
            vec![BrokerCommand::ClosePopup {
                popup_id: id.clone()
            }]
        );
        assert_eq!(b.session_count(), 0);
    }

    #[test]
    fn parent_close_cancels_its_sessions_only() {
        let mut b = broker();
        let s1 = request(&mut b, "window-a");
        let s2 = request(&mut b, "window-b");
        b.handle_input(&s1, SessionInput::Opened);
        b.handle_input(&s1, nav(IDP_URL));
        b.handle_input(&s2, SessionInput::Opened);

        let commands = b.parent_closed(&WindowId::from("window-a"));
        assert_eq!(
            commands,
            vec![BrokerCommand::ClosePopup {
                popup_id: s1.clone()
            }]
        );
        assert!(b.state_of(&s1).is_none());
        assert_eq!(b.state_of(&s2), Some(PopupState::Opened));

        // Late events for the cancelled session are correlation noise
        let late = b.handle_input(&s1, nav("https://app.powerbi.com/reportEmbed?code=1"));
        assert!(late.is_empty());
    }

    // -- Timeout --

    #[test]
    fn timer_fired_times_out_without_reload() {
        let bus = Arc::new(EventBus::new(16));
        let mut b = PopupBroker::new(
            Arc::new(OriginReturnMatcher::default()),
            BrokerConfig::default(),
            bus.clone(),
        );
        let mut events = bus.subscribe();

        let id = request(&mut b, "pbi");
        b.handle_input(&id, SessionInput::Opened);
        b.handle_input(&id, nav(IDP_URL));

        let commands = b.handle_input(&id, SessionInput::TimerFired);
        assert_eq!(
            commands,
            vec![BrokerCommand::ClosePopup {
                popup_id: id.clone()
            }]
        );
        assert_eq!(b.session_count(), 0);

        let event = events.try_recv().unwrap();
        assert!(
            matches!(event, ShellEvent::PopupTimedOut { ref parent_id } if parent_id.as_str() == "pbi")
        );
    }

    #[tokio::test]
    async fn real_timer_delivers_expiry() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut b = PopupBroker::new(
            Arc::new(OriginReturnMatcher::default()),
            BrokerConfig {
                timeout: Duration::from_millis(20),
            },
            Arc::new(EventBus::new(16)),
        );
        b.enable_timers(tokio::runtime::Handle::current(), tx);

        let id = request(&mut b, "pbi");
        b.handle_input(&id, SessionInput::Opened);

        let fired = rx.recv().await.unwrap();
        assert_eq!(fired, id);

        let commands = b.handle_input(&id, SessionInput::TimerFired);
        assert!(commands
            .iter()
            .any(|c| matches!(c, BrokerCommand::ClosePopup { .. })));
        assert!(!commands
            .iter()
            .any(|c| matches!(c, BrokerCommand::ReloadParent { .. })));
    }

    #[tokio::test]
    async fn terminal_state_cancels_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut b = PopupBroker::new(
            Arc::new(OriginReturnMatcher::default()),
            BrokerConfig {
                timeout: Duration::from_millis(20),
            },
            Arc::new(EventBus::new(16)),
        );
        b.enable_timers(tokio::runtime::Handle::current(), tx);

        let id = request(&mut b, "pbi");
        b.handle_input(&id, SessionInput::Opened);
        b.handle_input(&id, SessionInput::SuccessSignal);

        // The aborted timer must never deliver
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    // -- Origin derivation --

    #[test]
    fn origin_of_urls() {
        assert_eq!(
            origin_of("https://app.powerbi.com/reportEmbed?x=1"),
            Some("https://app.powerbi.com".to_string())
        );
        assert_eq!(
            origin_of("https://host.example.com:8443/path"),
            Some("https://host.example.com:8443".to_string())
        );
        assert_eq!(origin_of("not a url"), None);
    }
}
