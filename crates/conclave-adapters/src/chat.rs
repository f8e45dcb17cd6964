//! Chat-thread ingestion adapter — the parallel structure to the
//! pull-request adapter, keyed by `(channel_id, thread_ts)` instead of
//! `(repo, pr_number)`.

use std::sync::Arc;

use conclave_events::{ConclaveEvent, EventMetadata};
use conclave_mapping::{MappingConfig, MappingStore};
use conclave_session::SessionStore;
use serde_json::Value;
use tracing::trace;

use crate::config::IntegrationConfig;
use crate::types::{ChatExtra, ChatKey, HandleOutcome, ThreadStatus};

/// Translates chat-platform events into Conclave events, maintaining the
/// thread-to-session mapping and its lifecycle status.
pub struct ChatAdapter {
    mappings: MappingStore<ChatKey, ChatExtra>,
    config: IntegrationConfig,
    sessions: Arc<SessionStore>,
}

impl ChatAdapter {
    /// Create a new adapter bound to a session store.
    #[must_use]
    pub fn new(config: IntegrationConfig, mapping_config: MappingConfig, sessions: Arc<SessionStore>) -> Self {
        Self {
            mappings: MappingStore::new(mapping_config),
            config,
            sessions,
        }
    }

    /// The underlying mapping store.
    #[must_use]
    pub fn mappings(&self) -> &MappingStore<ChatKey, ChatExtra> {
        &self.mappings
    }

    fn is_from_bot(&self, author: Option<&str>) -> bool {
        matches!((&self.config.bot_username, author), (Some(bot), Some(who)) if bot == who)
    }

    /// Handle an inbound chat message, creating or touching the thread's
    /// mapping. The first message in a thread creates a session when
    /// `auto_create_sessions` is set; subsequent messages just touch it.
    pub async fn handle_message(&self, channel_id: &str, thread_ts: &str, payload: &Value) -> HandleOutcome {
        let author = payload.get("user").and_then(Value::as_str);
        if self.is_from_bot(author) {
            trace!("ignoring chat message authored by the configured bot account");
            return HandleOutcome::ignored();
        }

        let key = ChatKey {
            channel_id: channel_id.to_string(),
            thread_ts: thread_ts.to_string(),
        };

        if let Some(existing) = self.mappings.get(&key) {
            let _ = self.mappings.touch(&key);
            return HandleOutcome::ok(ConclaveEvent::ThreadUpdated {
                metadata: EventMetadata::now(),
                channel_id: key.channel_id,
                thread_ts: key.thread_ts,
                session_id: Some(existing.session_id),
            });
        }

        let session_id = if self.config.auto_create_sessions {
            let external_id = format!("{channel_id}#{thread_ts}");
            Some(self.sessions.create(external_id).await.id)
        } else {
            None
        };

        if let Some(session_id) = session_id {
            self.mappings.create_or_get(key.clone(), session_id);
        }

        HandleOutcome::ok(ConclaveEvent::ThreadCreated {
            metadata: EventMetadata::now(),
            channel_id: key.channel_id,
            thread_ts: key.thread_ts,
            session_id,
        })
    }

    /// Update a thread's lifecycle status. `cleanup_stale` on the
    /// underlying mapping store exempts threads currently `processing`.
    pub fn set_status(&self, key: &ChatKey, status: ThreadStatus) -> conclave_mapping::MappingResult<()> {
        self.mappings.update_extra(key, |extra| extra.status = status)
    }

    /// Mark a thread `completed`, returning the event to publish.
    pub fn mark_completed(&self, key: &ChatKey) -> Option<ConclaveEvent> {
        let mapping = self.mappings.get(key)?;
        let _ = self.set_status(key, ThreadStatus::Completed);
        Some(ConclaveEvent::ThreadCompleted {
            metadata: EventMetadata::now(),
            channel_id: key.channel_id.clone(),
            thread_ts: key.thread_ts.clone(),
            session_id: Some(mapping.session_id),
        })
    }
}

impl std::fmt::Debug for ChatAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatAdapter")
            .field("mappings_count", &self.mappings.count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_events::EventBus;
    use serde_json::json;

    fn adapter() -> ChatAdapter {
        let sessions = Arc::new(SessionStore::new(
            EventBus::new(),
            conclave_session::SessionStoreConfig::default(),
        ));
        ChatAdapter::new(
            IntegrationConfig {
                auto_create_sessions: true,
                ..Default::default()
            },
            MappingConfig::default(),
            sessions,
        )
    }

    #[tokio::test]
    async fn first_message_creates_a_thread_and_session() {
        let adapter = adapter();
        let outcome = adapter
            .handle_message("C1", "1234.5678", &json!({"user": "ana"}))
            .await;
        match outcome.event.unwrap() {
            ConclaveEvent::ThreadCreated { session_id, .. } => assert!(session_id.is_some()),
            other => panic!("expected ThreadCreated, got {other:?}"),
        }
        assert_eq!(adapter.mappings().count(), 1);
    }

    #[tokio::test]
    async fn second_message_touches_instead_of_recreating() {
        let adapter = adapter();
        adapter
            .handle_message("C1", "1234.5678", &json!({"user": "ana"}))
            .await;
        let outcome = adapter
            .handle_message("C1", "1234.5678", &json!({"user": "bo"}))
            .await;
        assert!(matches!(outcome.event.unwrap(), ConclaveEvent::ThreadUpdated { .. }));
        assert_eq!(adapter.mappings().count(), 1);
    }

    #[tokio::test]
    async fn processing_threads_survive_a_stale_sweep() {
        let adapter = adapter();
        adapter
            .handle_message("C1", "1234.5678", &json!({"user": "ana"}))
            .await;
        let key = ChatKey {
            channel_id: "C1".to_string(),
            thread_ts: "1234.5678".to_string(),
        };
        adapter.set_status(&key, ThreadStatus::Processing).unwrap();

        let removed = adapter.mappings().cleanup_stale();
        assert!(removed.is_empty());
    }

    #[tokio::test]
    async fn mark_completed_emits_thread_completed() {
        let adapter = adapter();
        adapter
            .handle_message("C1", "1234.5678", &json!({"user": "ana"}))
            .await;
        let key = ChatKey {
            channel_id: "C1".to_string(),
            thread_ts: "1234.5678".to_string(),
        };
        let event = adapter.mark_completed(&key).unwrap();
        assert!(matches!(event, ConclaveEvent::ThreadCompleted { .. }));
    }
}
