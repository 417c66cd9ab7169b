//! Session state shapes exposed to consumers.

use super::message::Message;
use serde::Serialize;

/// Lifecycle phase of the active session.
///
/// `Sending` is reachable only from `Fresh` or `Saved`. `Loading` is
/// reachable from any phase and always terminates back into `Fresh` or
/// `Saved`; a failed load restores whatever phase was active before.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No server-side record yet; the session is local-only.
    Fresh,
    /// One outbound chat request is in flight.
    Sending,
    /// The conversation has a server-side record and nothing is in flight.
    Saved,
    /// A different conversation's detail is being fetched.
    Loading,
}

/// An immutable view of the active session, cloned out on request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// `None` while the conversation is unsaved/local-only.
    pub conversation_id: Option<String>,
    pub context: Option<String>,
    pub storage_locator: Option<String>,
    /// Ordered message list; never empty while the session is active.
    pub messages: Vec<Message>,
    pub phase: SessionPhase,
}

impl SessionSnapshot {
    /// True while an outbound send is in flight.
    pub fn pending(&self) -> bool {
        self.phase == SessionPhase::Sending
    }
}
