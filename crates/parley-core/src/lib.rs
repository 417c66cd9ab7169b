//! Domain layer for the Parley conversational client.
//!
//! Owns the in-memory session state machine, the cached conversation
//! index, and the typed seam ([`api::ConversationApi`]) a transport
//! implementation plugs into. No HTTP code lives here.

pub mod api;
pub mod conversation;
pub mod error;
pub mod index;
pub mod session;

// Re-export common error types
pub use error::{ChatError, Result};
