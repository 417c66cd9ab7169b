//! The seam between the session core and the remote backend.
//!
//! `ConversationApi` is the contract a transport implementation has to
//! satisfy. The core never retries and never interprets transport details;
//! every failure arrives as a typed [`ChatError`](crate::error::ChatError).

use crate::conversation::{ConversationDetail, ConversationSummary};
use crate::error::Result;
use crate::session::MessageRole;
use async_trait::async_trait;

/// One entry of the outbound message history for a chat request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub role: MessageRole,
    pub content: String,
}

/// The backend's answer to a chat request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    /// The assistant's reply content.
    pub reply: String,
    /// The conversation id the exchange was persisted under.
    pub conversation_id: String,
    /// Where the server stored the conversation record.
    pub storage_locator: Option<String>,
    /// Context echoed (possibly refined) by the server.
    pub context: Option<String>,
}

/// Stateless request/response access to the backend's conversation and
/// chat endpoints.
///
/// Implementations translate transport outcomes into the typed error
/// taxonomy and perform no retries; retry policy belongs to the caller.
#[async_trait]
pub trait ConversationApi: Send + Sync {
    /// Sends the full message history and returns the assistant's reply.
    ///
    /// `history` must be non-empty.
    async fn send_message(
        &self,
        history: &[OutboundMessage],
        context: Option<&str>,
        conversation_id: Option<&str>,
    ) -> Result<ChatReply>;

    /// Lists all persisted conversations in server order.
    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>>;

    /// Fetches one conversation with its full message history.
    ///
    /// Fails with [`ChatError::NotFound`](crate::error::ChatError::NotFound)
    /// when the backend reports absence.
    async fn get_conversation(&self, id: &str) -> Result<ConversationDetail>;

    /// Deletes a persisted conversation.
    async fn delete_conversation(&self, id: &str) -> Result<()>;
}
