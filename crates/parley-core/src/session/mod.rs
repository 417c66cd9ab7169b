//! Session domain module.
//!
//! This module contains the active conversation's state machine and the
//! types it exposes.
//!
//! # Module Structure
//!
//! - `message`: In-memory message types (`MessageRole`, `Message`)
//! - `model`: Session state shapes (`SessionPhase`, `SessionSnapshot`)
//! - `event`: Transition events (`SessionEvent`)
//! - `manager`: The state machine itself (`ConversationSession`)

mod event;
mod manager;
mod message;
mod model;

// Re-export public API
pub use event::SessionEvent;
pub use manager::{ConversationSession, SendOutcome};
pub use message::{Message, MessageRole};
pub use model::{SessionPhase, SessionSnapshot};
