//! Cached conversation list.
//!
//! The index is a pure cache over the backend's conversation list. It
//! holds no session logic; entries are replaced wholesale on refresh to
//! avoid drift between locally-known and server-known state.

use crate::api::ConversationApi;
use crate::conversation::ConversationSummary;
use crate::error::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock};

/// Holds the ordered list of conversation summaries.
pub struct ConversationIndex {
    api: Arc<dyn ConversationApi>,
    entries: RwLock<Vec<ConversationSummary>>,
    /// Bumped after every completed refresh; lets a queued caller detect
    /// that the list it waited for is already in the cache.
    generation: AtomicU64,
    refresh_gate: Mutex<()>,
}

impl ConversationIndex {
    /// Creates an empty index backed by the given client.
    pub fn new(api: Arc<dyn ConversationApi>) -> Self {
        Self {
            api,
            entries: RwLock::new(Vec::new()),
            generation: AtomicU64::new(0),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Fetches the conversation list and replaces the cache wholesale.
    ///
    /// Concurrent refreshes collapse: a caller that arrives while a
    /// refresh is in flight waits for it and observes its result instead
    /// of issuing a duplicate request.
    pub async fn refresh(&self) -> Result<Vec<ConversationSummary>> {
        let seen = self.generation.load(Ordering::Acquire);
        let _gate = self.refresh_gate.lock().await;
        if self.generation.load(Ordering::Acquire) != seen {
            return Ok(self.entries.read().await.clone());
        }

        let list = self.api.list_conversations().await?;
        tracing::debug!(count = list.len(), "conversation index refreshed");
        *self.entries.write().await = list.clone();
        self.generation.fetch_add(1, Ordering::AcqRel);
        Ok(list)
    }

    /// Drops one entry from the cache without a round-trip. Used right
    /// after a confirmed delete so the visible list updates before the
    /// next full refresh completes.
    pub async fn remove(&self, id: &str) {
        self.entries.write().await.retain(|entry| entry.id != id);
    }

    /// Returns the currently cached entries in server order.
    pub async fn entries(&self) -> Vec<ConversationSummary> {
        self.entries.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ChatReply, OutboundMessage};
    use crate::conversation::ConversationDetail;
    use crate::error::ChatError;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    fn summary(id: &str) -> ConversationSummary {
        ConversationSummary {
            id: id.to_string(),
            title: format!("Conversation {id}"),
            context: None,
            storage_locator: format!("{id}.json"),
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    /// List-only backend double; the first list call parks until notified.
    struct SlowListApi {
        list: Vec<ConversationSummary>,
        list_calls: AtomicUsize,
        gate: Notify,
    }

    #[async_trait::async_trait]
    impl ConversationApi for SlowListApi {
        async fn send_message(
            &self,
            _history: &[OutboundMessage],
            _context: Option<&str>,
            _conversation_id: Option<&str>,
        ) -> crate::error::Result<ChatReply> {
            Err(ChatError::Transport("unused".into()))
        }

        async fn list_conversations(&self) -> crate::error::Result<Vec<ConversationSummary>> {
            let first = self.list_calls.fetch_add(1, Ordering::SeqCst) == 0;
            if first {
                self.gate.notified().await;
            }
            Ok(self.list.clone())
        }

        async fn get_conversation(&self, id: &str) -> crate::error::Result<ConversationDetail> {
            Err(ChatError::not_found(id))
        }

        async fn delete_conversation(&self, _id: &str) -> crate::error::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn concurrent_refreshes_collapse_into_one_request() {
        let api = Arc::new(SlowListApi {
            list: vec![summary("a"), summary("b")],
            list_calls: AtomicUsize::new(0),
            gate: Notify::new(),
        });
        let index = Arc::new(ConversationIndex::new(api.clone()));

        let first = {
            let index = index.clone();
            tokio::spawn(async move { index.refresh().await })
        };
        let second = {
            let index = index.clone();
            tokio::spawn(async move { index.refresh().await })
        };
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
        api.gate.notify_one();

        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(api.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn remove_drops_only_the_matching_entry() {
        let api = Arc::new(SlowListApi {
            list: vec![summary("a"), summary("b")],
            list_calls: AtomicUsize::new(1), // skip the gate
            gate: Notify::new(),
        });
        let index = ConversationIndex::new(api);
        index.refresh().await.unwrap();

        index.remove("a").await;

        let entries = index.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "b");
    }

    #[tokio::test]
    async fn refresh_replaces_entries_wholesale() {
        let api = Arc::new(SlowListApi {
            list: vec![summary("a")],
            list_calls: AtomicUsize::new(1),
            gate: Notify::new(),
        });
        let index = ConversationIndex::new(api);
        index.remove("ghost").await;

        let entries = index.refresh().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(index.entries().await, entries);
    }
}
