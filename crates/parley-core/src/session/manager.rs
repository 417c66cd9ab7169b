//! The active conversation's state machine.
//!
//! Exactly one [`ConversationSession`] exists at a time. It owns the
//! in-memory message list, applies optimistic updates with rollback on
//! failure, and reconciles state against the remote backend.

use super::event::SessionEvent;
use super::message::Message;
use super::model::{SessionPhase, SessionSnapshot};
use crate::api::{ConversationApi, OutboundMessage};
use crate::conversation::{ConversationDetail, PersistedRole};
use crate::error::{ChatError, Result};
use crate::index::ConversationIndex;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tokio_util::sync::CancellationToken;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// How a completed `send_message` call resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The backend confirmed the exchange and the reply was appended.
    Delivered { conversation_id: String },
    /// The session moved to a different conversation while the request
    /// was in flight; the result was discarded without touching state.
    Superseded,
    /// The caller aborted the send; the optimistic message was rolled
    /// back and no user-facing error is raised.
    Cancelled,
}

/// Live state of the single active conversation.
struct SessionState {
    conversation_id: Option<String>,
    context: Option<String>,
    storage_locator: Option<String>,
    messages: Vec<Message>,
    phase: SessionPhase,
    /// Bumped on every wholesale state replacement. An in-flight send
    /// that resolves against a different epoch applies nothing.
    epoch: u64,
    cancel: Option<CancellationToken>,
}

impl SessionState {
    fn fresh(context: Option<String>) -> Self {
        let greeting = greeting_message(context.as_deref());
        Self {
            conversation_id: None,
            context,
            storage_locator: None,
            messages: vec![greeting],
            phase: SessionPhase::Fresh,
            epoch: 0,
            cancel: None,
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            conversation_id: self.conversation_id.clone(),
            context: self.context.clone(),
            storage_locator: self.storage_locator.clone(),
            messages: self.messages.clone(),
            phase: self.phase,
        }
    }
}

/// Manages the active conversation's lifecycle.
///
/// `ConversationSession` is responsible for:
/// - Sending a message with optimistic append and rollback on failure
/// - Switching to a different persisted conversation
/// - Starting a fresh local-only conversation
/// - Deleting a conversation, resetting if it was the active one
///
/// State lives behind a lock that is never held across a network await,
/// so switch/new/delete intents remain possible while a send is in
/// flight; the epoch guard discards the stale result when they happen.
pub struct ConversationSession {
    api: Arc<dyn ConversationApi>,
    index: Arc<ConversationIndex>,
    state: RwLock<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl ConversationSession {
    /// Creates a session holding a single default greeting.
    pub fn new(api: Arc<dyn ConversationApi>, index: Arc<ConversationIndex>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            api,
            index,
            state: RwLock::new(SessionState::fresh(None)),
            events,
        }
    }

    /// Subscribes to session transition events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Returns an immutable view of the current session state.
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.read().await.snapshot()
    }

    /// Sends a user message to the remote agent.
    ///
    /// The message is appended optimistically before the request goes
    /// out. On success the assistant reply is appended and the session
    /// becomes `Saved`; on failure the pre-send message list is restored
    /// verbatim and the error is surfaced.
    ///
    /// Rejected synchronously with [`ChatError::Busy`] while another
    /// request is in flight, and [`ChatError::EmptyMessage`] for
    /// whitespace-only content.
    pub async fn send_message(&self, content: &str) -> Result<SendOutcome> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let token = CancellationToken::new();
        let (snapshot, prior_phase, epoch, history, context, conversation_id) = {
            let mut state = self.state.write().await;
            if !matches!(state.phase, SessionPhase::Fresh | SessionPhase::Saved) {
                return Err(ChatError::Busy);
            }
            let snapshot = state.messages.clone();
            let prior_phase = state.phase;
            state.messages.push(Message::user(trimmed));
            state.phase = SessionPhase::Sending;
            state.cancel = Some(token.clone());
            let history: Vec<OutboundMessage> = state
                .messages
                .iter()
                .map(|m| OutboundMessage {
                    role: m.role,
                    content: m.content.clone(),
                })
                .collect();
            (
                snapshot,
                prior_phase,
                state.epoch,
                history,
                state.context.clone(),
                state.conversation_id.clone(),
            )
        };
        self.emit(SessionEvent::SendStarted);

        let result = tokio::select! {
            _ = token.cancelled() => Err(ChatError::Cancelled),
            res = self.api.send_message(&history, context.as_deref(), conversation_id.as_deref()) => res,
        };

        let mut state = self.state.write().await;
        if state.epoch != epoch {
            // The session moved to another conversation while the request
            // was in flight; neither success nor rollback may be applied.
            tracing::debug!("discarding send result for a superseded session");
            return Ok(SendOutcome::Superseded);
        }
        state.cancel = None;

        match result {
            Ok(reply) => {
                state.messages.push(Message::assistant(reply.reply.clone()));
                state.conversation_id = Some(reply.conversation_id.clone());
                state.storage_locator = reply.storage_locator;
                if reply.context.is_some() {
                    state.context = reply.context;
                }
                state.phase = SessionPhase::Saved;
                drop(state);
                self.emit(SessionEvent::SendCompleted {
                    conversation_id: reply.conversation_id.clone(),
                });
                self.refresh_index_in_background();
                Ok(SendOutcome::Delivered {
                    conversation_id: reply.conversation_id,
                })
            }
            Err(ChatError::Cancelled) => {
                state.messages = snapshot;
                state.phase = prior_phase;
                drop(state);
                self.emit(SessionEvent::SendCancelled);
                Ok(SendOutcome::Cancelled)
            }
            Err(err) => {
                state.messages = snapshot;
                state.phase = prior_phase;
                drop(state);
                self.emit(SessionEvent::SendFailed {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Aborts the in-flight send, if any. The rollback happens inside the
    /// pending `send_message` call, which resolves to
    /// [`SendOutcome::Cancelled`].
    pub async fn abort_send(&self) {
        let token = self.state.write().await.cancel.take();
        if let Some(token) = token {
            token.cancel();
        }
    }

    /// Switches the session to a persisted conversation.
    ///
    /// Re-selecting the active conversation is a no-op and issues no
    /// request. On success the session state is replaced wholesale; on
    /// failure it is left exactly as it was.
    pub async fn select_conversation(&self, id: &str) -> Result<()> {
        let (prior_phase, epoch) = {
            let mut state = self.state.write().await;
            if state.conversation_id.as_deref() == Some(id) {
                return Ok(());
            }
            let prior = state.phase;
            state.phase = SessionPhase::Loading;
            (prior, state.epoch)
        };

        match self.api.get_conversation(id).await {
            Ok(detail) => {
                let messages = messages_from_detail(&detail);
                let mut state = self.state.write().await;
                if let Some(token) = state.cancel.take() {
                    token.cancel();
                }
                state.conversation_id = Some(detail.summary.id.clone());
                state.context = detail.summary.context.clone();
                state.storage_locator = Some(detail.summary.storage_locator.clone());
                state.messages = messages;
                state.phase = SessionPhase::Saved;
                state.epoch += 1;
                drop(state);
                self.emit(SessionEvent::ConversationLoaded { id: id.to_string() });
                Ok(())
            }
            Err(err) => {
                {
                    let mut state = self.state.write().await;
                    // An in-flight send may have settled the phase while
                    // the fetch was pending; only undo the Loading marker
                    // this call set.
                    if state.phase == SessionPhase::Loading && state.epoch == epoch {
                        state.phase = prior_phase;
                    }
                }
                if err.is_not_found() {
                    // Deleted elsewhere; drop the stale list entry.
                    self.index.remove(id).await;
                }
                Err(err)
            }
        }
    }

    /// Resets the session to a fresh local-only conversation seeded with
    /// the given context. Nothing is created server-side until the first
    /// successful send.
    pub async fn start_new_conversation(&self, context: Option<&str>) {
        let context = context
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_owned);
        {
            let mut state = self.state.write().await;
            if let Some(token) = state.cancel.take() {
                token.cancel();
            }
            let epoch = state.epoch;
            *state = SessionState::fresh(context);
            state.epoch = epoch + 1;
        }
        self.emit(SessionEvent::SessionReset);
    }

    /// Deletes a persisted conversation.
    ///
    /// On success the entry is dropped from the index and, if the deleted
    /// conversation was the active one, the session resets to a fresh
    /// greeting while keeping the current context. A backend "not found"
    /// is treated as already deleted rather than a failure.
    pub async fn delete_conversation(&self, id: &str) -> Result<()> {
        match self.api.delete_conversation(id).await {
            Ok(()) => {}
            Err(err) if err.is_not_found() => {
                tracing::debug!(conversation_id = id, "conversation was already gone");
            }
            Err(err) => return Err(err),
        }

        self.index.remove(id).await;

        let active_context = {
            let state = self.state.read().await;
            if state.conversation_id.as_deref() == Some(id) {
                Some(state.context.clone())
            } else {
                None
            }
        };
        if let Some(context) = active_context {
            self.start_new_conversation(context.as_deref()).await;
        }

        self.emit(SessionEvent::ConversationDeleted { id: id.to_string() });
        Ok(())
    }

    fn emit(&self, event: SessionEvent) {
        // Nobody listening is fine.
        let _ = self.events.send(event);
    }

    /// Post-send index refresh is best-effort: a failure here must never
    /// roll back the already-confirmed send.
    fn refresh_index_in_background(&self) {
        let index = self.index.clone();
        tokio::spawn(async move {
            if let Err(err) = index.refresh().await {
                tracing::warn!(error = %err, "conversation index refresh after send failed");
            }
        });
    }
}

/// Builds the assistant greeting a fresh session starts with.
fn greeting_message(context: Option<&str>) -> Message {
    let content = match context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(ctx) => format!("Context noted: \"{ctx}\". How can I help you with it?"),
        None => "Hello! I'm your AI assistant. How can I help you today?".to_string(),
    };
    Message::assistant(content)
}

/// Maps persisted messages into the in-memory shape.
///
/// Messages keep their server order. When a persisted timestamp is absent
/// or unparsable, a synthesized strictly increasing fallback is assigned
/// so positional order survives even without reliable clocks.
fn messages_from_detail(detail: &ConversationDetail) -> Vec<Message> {
    let fallback_base = Utc::now();
    detail
        .messages
        .iter()
        .enumerate()
        .map(|(position, persisted)| {
            let timestamp = persisted
                .timestamp
                .as_deref()
                .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                .map(|parsed| parsed.with_timezone(&Utc))
                .unwrap_or_else(|| fallback_base + Duration::milliseconds(position as i64));
            let role = match persisted.role {
                PersistedRole::User => super::message::MessageRole::User,
                // System entries render as agent-side bubbles; dropping
                // them would shift positional order.
                PersistedRole::Assistant | PersistedRole::System => {
                    super::message::MessageRole::Assistant
                }
            };
            Message {
                id: uuid::Uuid::new_v4().to_string(),
                role,
                content: persisted.content.clone(),
                timestamp,
            }
        })
        .collect()
}
