//! Thin orchestration layer over the session and the index.
//!
//! The coordinator forwards user intent to [`ConversationSession`] and
//! translates failures into user-facing notifications. All state logic
//! stays in the session; nothing here mutates messages directly.

use crate::notification::Notification;
use parley_client::{ApiConfig, HttpConversationClient};
use parley_core::api::ConversationApi;
use parley_core::error::Result;
use parley_core::index::ConversationIndex;
use parley_core::session::{ConversationSession, SendOutcome, SessionEvent};
use std::sync::Arc;
use tokio::sync::broadcast;

const NOTIFICATION_CHANNEL_CAPACITY: usize = 32;

/// Wires the session, index, and remote client together and surfaces
/// user-facing notifications for failed or completed operations.
pub struct SessionCoordinator {
    session: Arc<ConversationSession>,
    index: Arc<ConversationIndex>,
    notifications: broadcast::Sender<Notification>,
}

impl SessionCoordinator {
    /// Creates a coordinator over any backend implementation.
    pub fn new(api: Arc<dyn ConversationApi>) -> Self {
        let index = Arc::new(ConversationIndex::new(api.clone()));
        let session = Arc::new(ConversationSession::new(api, index.clone()));
        let (notifications, _) = broadcast::channel(NOTIFICATION_CHANNEL_CAPACITY);
        Self {
            session,
            index,
            notifications,
        }
    }

    /// Creates a coordinator talking HTTP to the configured backend.
    pub fn from_config(config: ApiConfig) -> Self {
        Self::new(Arc::new(HttpConversationClient::new(config)))
    }

    pub fn session(&self) -> &Arc<ConversationSession> {
        &self.session
    }

    pub fn index(&self) -> &Arc<ConversationIndex> {
        &self.index
    }

    /// Subscribes to user-facing notifications.
    pub fn subscribe_notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    /// Subscribes to session transition events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.session.subscribe()
    }

    /// Loads the conversation list once at startup. A failure is
    /// reported as a notification, never as a hard error.
    pub async fn bootstrap(&self) {
        if let Err(err) = self.index.refresh().await {
            tracing::warn!(error = %err, "initial conversation list load failed");
            self.notify(Notification::error(
                "Could not load the conversation history",
                err.to_string(),
            ));
        }
    }

    /// Sends a user message, notifying on user-facing failures.
    pub async fn send_message(&self, content: &str) -> Result<SendOutcome> {
        match self.session.send_message(content).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                if err.is_user_facing() {
                    self.notify(Notification::error(
                        "Could not reach the agent",
                        err.to_string(),
                    ));
                }
                Err(err)
            }
        }
    }

    /// Switches to a persisted conversation, notifying on failure.
    pub async fn select_conversation(&self, id: &str) -> Result<()> {
        match self.session.select_conversation(id).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.notify(Notification::error(
                    "Could not open the conversation",
                    err.to_string(),
                ));
                Err(err)
            }
        }
    }

    /// Starts a fresh local-only conversation.
    pub async fn start_new_conversation(&self, context: Option<&str>) {
        self.session.start_new_conversation(context).await;
    }

    /// Deletes a persisted conversation, notifying either way.
    pub async fn delete_conversation(&self, id: &str) -> Result<()> {
        match self.session.delete_conversation(id).await {
            Ok(()) => {
                self.notify(Notification::info(
                    "Conversation removed",
                    "The stored history was deleted.",
                ));
                Ok(())
            }
            Err(err) => {
                self.notify(Notification::error(
                    "Could not delete the conversation",
                    err.to_string(),
                ));
                Err(err)
            }
        }
    }

    /// Aborts the in-flight send, if any. Stays silent: cancellation is
    /// caller-initiated and rolls back like a failure without a toast.
    pub async fn abort_send(&self) {
        self.session.abort_send().await;
    }

    fn notify(&self, notification: Notification) {
        let _ = self.notifications.send(notification);
    }
}
