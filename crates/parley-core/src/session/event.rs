//! Events published after every session transition.
//!
//! Consumers (UI, index refresher) subscribe to these instead of polling
//! session state.

use serde::Serialize;

/// High-level notifications emitted by the session after each transition.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// An optimistic user message was appended and a send went out.
    SendStarted,
    /// The send was confirmed and the assistant reply appended.
    SendCompleted { conversation_id: String },
    /// The send failed; the optimistic message was rolled back.
    SendFailed { message: String },
    /// The send was aborted by the caller; rolled back silently.
    SendCancelled,
    /// A different conversation's history replaced the session state.
    ConversationLoaded { id: String },
    /// The session was reset to a fresh local-only conversation.
    SessionReset,
    /// A persisted conversation was deleted server-side.
    ConversationDeleted { id: String },
}
