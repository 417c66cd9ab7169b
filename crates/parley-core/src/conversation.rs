//! Conversation records as the backend reports them.
//!
//! These are the read-only shapes owned by the index and produced by the
//! remote client when a conversation is listed or opened. Server-side
//! timestamps are kept as opaque strings; they are display-only and never
//! used for ordering.

use serde::{Deserialize, Serialize};

/// A single entry in the conversation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// Unique conversation identifier assigned by the backend.
    pub id: String,
    /// Human-readable title (the backend derives it from the context).
    pub title: String,
    /// User-supplied free text describing the conversation's topic.
    pub context: Option<String>,
    /// Opaque server-provided reference to the persisted record.
    pub storage_locator: String,
    /// Creation timestamp as reported by the server.
    pub created_at: String,
    /// Last-update timestamp as reported by the server.
    pub updated_at: String,
}

/// Role of a persisted message as stored server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersistedRole {
    User,
    Assistant,
    System,
}

/// A message as persisted server-side. The timestamp may be absent or
/// unparsable for reconstructed history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedMessage {
    pub role: PersistedRole,
    pub content: String,
    pub timestamp: Option<String>,
}

/// A full conversation record: summary plus the ordered message history.
///
/// Loading a detail into the session replaces session state wholesale;
/// there is no merge with in-memory messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationDetail {
    pub summary: ConversationSummary,
    pub messages: Vec<PersistedMessage>,
}
