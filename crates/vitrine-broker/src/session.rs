//! One tracked popup: its state machine over typed inputs.

use std::time::Instant;

use vitrine_common::{PopupId, WindowId};

use crate::matcher::MatchOutcome;

/// Lifecycle of a popup session. `Completed`, `Failed`, `TimedOut` and
/// `Closed` are terminal; the broker removes the session on entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupState {
    /// Admission granted, window creation in flight.
    Requested,
    /// The popup window exists.
    Opened,
    /// At least one navigation observed inside the popup.
    Authenticating,
    Completed,
    Failed,
    TimedOut,
    /// Closed by the user, or cancelled because the parent went away.
    Closed,
}

impl PopupState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PopupState::Completed | PopupState::Failed | PopupState::TimedOut | PopupState::Closed
        )
    }
}

/// Typed inputs driving a session. Produced from surface events, the
/// timer channel, and registry lifecycle; injected synthetically in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionInput {
    /// The popup window was created.
    Opened,
    /// A navigation was observed inside the popup.
    Navigated(String),
    /// The popup content explicitly signalled success.
    SuccessSignal,
    /// The popup content explicitly signalled failure.
    FailureSignal,
    /// The popup window was closed (user action or window destruction).
    PopupClosed,
    /// The session's completion deadline elapsed.
    TimerFired,
    /// The parent content window no longer exists.
    ParentClosed,
}

/// Compute the successor state, if the input means anything in the current
/// state. `nav_outcome` is only consulted for `Navigated`.
///
/// A navigation observed while `Opened` both starts authentication and is
/// evaluated against the matcher, so an identity provider that bounces
/// straight back completes in a single input.
pub fn next_state(
    current: PopupState,
    input: &SessionInput,
    nav_outcome: MatchOutcome,
) -> Option<PopupState> {
    use PopupState::*;

    if current.is_terminal() {
        return None;
    }

    match input {
        SessionInput::Opened => match current {
            Requested => Some(Opened),
            _ => None,
        },
        SessionInput::Navigated(_) => match current {
            Opened | Authenticating => Some(match nav_outcome {
                MatchOutcome::Success => Completed,
                MatchOutcome::Failure => Failed,
                MatchOutcome::Neutral => Authenticating,
            }),
            _ => None,
        },
        SessionInput::SuccessSignal => match current {
            Opened | Authenticating => Some(Completed),
            _ => None,
        },
        SessionInput::FailureSignal => match current {
            Opened | Authenticating => Some(Failed),
            _ => None,
        },
        SessionInput::TimerFired => Some(TimedOut),
        SessionInput::PopupClosed | SessionInput::ParentClosed => Some(Closed),
    }
}

/// A tracked popup. `parent_id` is a lookup-only reference into the window
/// registry; the parent may close independently, which cancels the session.
#[derive(Debug)]
pub struct PopupSession {
    pub popup_id: PopupId,
    pub parent_id: WindowId,
    pub requested_url: String,
    /// Parent original + current URLs at request time, for return matching.
    pub parent_urls: Vec<String>,
    pub state: PopupState,
    pub created_at: Instant,
    pub last_observed_url: Option<String>,
}

impl PopupSession {
    pub fn new(parent_id: WindowId, requested_url: String, parent_urls: Vec<String>) -> Self {
        Self {
            popup_id: PopupId::new(),
            parent_id,
            requested_url,
            parent_urls,
            state: PopupState::Requested,
            created_at: Instant::now(),
            last_observed_url: None,
        }
    }

    /// The URL the flow ended on: last observed navigation, or the
    /// originally requested one if none was seen.
    pub fn resolved_url(&self) -> &str {
        self.last_observed_url
            .as_deref()
            .unwrap_or(&self.requested_url)
    }
}
