//! Remote adapter for the Parley conversational client.
//!
//! Implements [`parley_core::api::ConversationApi`] over HTTP against the
//! backend's chat and conversation endpoints.

pub mod config;
pub mod http;
mod wire;

pub use config::ApiConfig;
pub use http::HttpConversationClient;
