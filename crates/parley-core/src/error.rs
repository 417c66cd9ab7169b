//! Error types shared across the Parley client.

use thiserror::Error;

/// A shared error type for the conversational client.
///
/// The first four variants mirror how a request can go wrong against the
/// backend; the remaining ones are session-local preconditions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChatError {
    /// Network-level failure: the request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status. `message` is the
    /// human-readable text extracted from the error body and is shown to
    /// the user verbatim.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The backend reported that the conversation does not exist.
    ///
    /// Kept separate from [`ChatError::Api`] because the session treats
    /// an absent conversation as "already deleted elsewhere" rather than
    /// a retry-worthy failure.
    #[error("conversation not found: {id}")]
    NotFound { id: String },

    /// The response was well-formed HTTP but missing required fields.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A send or load is already in flight for this session.
    #[error("a request is already in flight for this session")]
    Busy,

    /// Message content was empty after trimming.
    #[error("message content is empty")]
    EmptyMessage,

    /// A chat request was attempted with no message history.
    #[error("message history must not be empty")]
    EmptyHistory,

    /// The in-flight send was aborted by the caller. Never surfaced as a
    /// user-facing error; rollback behaves exactly like a failed send.
    #[error("send cancelled")]
    Cancelled,
}

impl ChatError {
    /// Creates an API error from a status code and extracted message.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Creates a NotFound error for the given conversation id.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Check if this error means the resource is gone on the server.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether this error should be shown to the user. Cancellations are
    /// caller-initiated and stay silent.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

/// A type alias for `Result<T, ChatError>`.
pub type Result<T> = std::result::Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_displays_bare_message() {
        let err = ChatError::api(500, "boom");
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn cancelled_is_not_user_facing() {
        assert!(!ChatError::Cancelled.is_user_facing());
        assert!(ChatError::api(500, "boom").is_user_facing());
        assert!(ChatError::Transport("connection refused".into()).is_user_facing());
    }

    #[test]
    fn not_found_predicate() {
        assert!(ChatError::not_found("abc").is_not_found());
        assert!(!ChatError::api(500, "x").is_not_found());
    }
}
