//! Application layer for the Parley conversational client.
//!
//! Wires the session core to the HTTP backend and surfaces user-facing
//! notifications for the UI to render.

pub mod coordinator;
pub mod logging;
pub mod notification;

pub use coordinator::SessionCoordinator;
pub use notification::{Notification, Severity};
