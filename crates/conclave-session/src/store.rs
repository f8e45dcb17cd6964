//! The session store: a `DashMap` of per-session locks.
//!
//! Lookup in the map is always brief — just a clone of an `Arc` — and is
//! never held while awaiting or while the per-session `Mutex` is locked
//! across anything but synchronous mutation. This mirrors the session map /
//! per-session lock split used elsewhere in the stack, which exists to stop
//! a slow mutation on one session from blocking lookups for every other
//! session.

use std::sync::Arc;

use conclave_conflict::{resolve, Outcome, StateDelta};
use conclave_core::{
    ClientId, ClientType, Cursor, Priority, Prompt, PromptId, SessionId, UserId,
};
use conclave_events::{ConclaveEvent, EventBus, EventMetadata, MergeOutcome};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::instrument;

use crate::config::SessionStoreConfig;
use crate::error::{SessionError, SessionResult};
use crate::session::Session;

/// Holds every live session behind its own lock, plus the event bus every
/// mutator publishes to.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<SessionId, Arc<Mutex<Session>>>>,
    external_index: Arc<DashMap<String, SessionId>>,
    bus: EventBus,
    config: SessionStoreConfig,
}

impl SessionStore {
    /// Create an empty store bound to `bus`, with the given config.
    #[must_use]
    pub fn new(bus: EventBus, config: SessionStoreConfig) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            external_index: Arc::new(DashMap::new()),
            bus,
            config,
        }
    }

    fn handle(&self, session_id: SessionId) -> SessionResult<Arc<Mutex<Session>>> {
        self.sessions
            .get(&session_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(SessionError::SessionNotFound(session_id))
    }

    /// `create` — returns the existing session if `external_session_id` is
    /// already in use by a live session, otherwise mints a fresh one.
    #[instrument(skip(self))]
    pub async fn create(&self, external_session_id: impl Into<String> + std::fmt::Debug) -> Session {
        let external_session_id = external_session_id.into();
        if let Some(existing_id) = self.external_index.get(&external_session_id) {
            if let Some(entry) = self.sessions.get(&*existing_id) {
                return entry.lock().await.clone();
            }
        }
        let session = Session::new(external_session_id.clone());
        let id = session.id;
        self.external_index.insert(external_session_id, id);
        self.sessions.insert(id, Arc::new(Mutex::new(session.clone())));
        self.bus.publish(ConclaveEvent::SessionCreated {
            metadata: EventMetadata::now(),
            session_id: id,
        });
        session
    }

    /// Delete a session outright (administrative action).
    pub fn delete(&self, session_id: SessionId) -> SessionResult<()> {
        let (_, session) = self
            .sessions
            .remove(&session_id)
            .ok_or(SessionError::SessionNotFound(session_id))?;
        drop(session);
        self.external_index.retain(|_, v| *v != session_id);
        self.bus.publish(ConclaveEvent::SessionDeleted {
            metadata: EventMetadata::now(),
            session_id,
        });
        Ok(())
    }

    /// A snapshot of every live session.
    #[must_use]
    pub fn all(&self) -> Vec<SessionId> {
        self.sessions.iter().map(|e| *e.key()).collect()
    }

    /// Fetch a snapshot of one session's state.
    pub async fn get(&self, session_id: SessionId) -> SessionResult<Session> {
        let handle = self.handle(session_id)?;
        Ok(handle.lock().await.clone())
    }

    /// `join`.
    #[instrument(skip(self, name))]
    pub async fn join(
        &self,
        session_id: SessionId,
        user_id: UserId,
        name: impl Into<String> + std::fmt::Debug,
        email: Option<String>,
        avatar: Option<String>,
        color: Option<String>,
    ) -> SessionResult<conclave_core::User> {
        let handle = self.handle(session_id)?;
        let mut session = handle.lock().await;
        let user = session.join(
            user_id,
            name,
            email,
            avatar,
            color,
            self.config.max_users_per_session,
        )?;
        self.bus.publish(ConclaveEvent::UserJoined {
            metadata: EventMetadata::now(),
            session_id,
            user: user.clone(),
        });
        Ok(user)
    }

    /// `leave` — emits `client.disconnected`* → `lock.released`? →
    /// `user.left` → `state.changed` (once), in that order.
    #[instrument(skip(self))]
    pub async fn leave(&self, session_id: SessionId, user_id: UserId) -> SessionResult<()> {
        let handle = self.handle(session_id)?;
        let mut session = handle.lock().await;
        let (disconnected, lock_released) = session.leave(user_id)?;
        if lock_released {
            session.state.version = session.state.version.saturating_add(1);
        }
        let final_state = session.state.clone();
        drop(session);

        for client_id in disconnected {
            self.bus.publish(ConclaveEvent::ClientDisconnected {
                metadata: EventMetadata::now(),
                session_id,
                client_id,
                user_id,
            });
        }
        if lock_released {
            self.bus.publish(ConclaveEvent::LockReleased {
                metadata: EventMetadata::now(),
                session_id,
                user_id,
            });
        }
        self.bus.publish(ConclaveEvent::UserLeft {
            metadata: EventMetadata::now(),
            session_id,
            user_id,
        });
        self.bus.publish(ConclaveEvent::StateChanged {
            metadata: EventMetadata::now(),
            session_id,
            state: final_state,
        });
        Ok(())
    }

    /// `connect`.
    #[instrument(skip(self))]
    pub async fn connect(
        &self,
        session_id: SessionId,
        user_id: UserId,
        client_type: ClientType,
    ) -> SessionResult<conclave_core::Client> {
        let handle = self.handle(session_id)?;
        let mut session = handle.lock().await;
        let client = session.connect(user_id, client_type, self.config.max_clients_per_user)?;
        self.bus.publish(ConclaveEvent::ClientConnected {
            metadata: EventMetadata::now(),
            session_id,
            client: client.clone(),
        });
        Ok(client)
    }

    /// `disconnect`.
    #[instrument(skip(self))]
    pub async fn disconnect(&self, session_id: SessionId, client_id: ClientId) -> SessionResult<()> {
        let handle = self.handle(session_id)?;
        let mut session = handle.lock().await;
        let user_id = session
            .clients()
            .iter()
            .find(|c| c.client_id == client_id)
            .map(|c| c.user_id)
            .ok_or(SessionError::ClientNotFound(client_id))?;
        session.disconnect(client_id)?;
        drop(session);
        self.bus.publish(ConclaveEvent::ClientDisconnected {
            metadata: EventMetadata::now(),
            session_id,
            client_id,
            user_id,
        });
        Ok(())
    }

    /// `updateCursor` — does not change `state.version`.
    pub async fn update_cursor(
        &self,
        session_id: SessionId,
        user_id: UserId,
        cursor: Cursor,
    ) -> SessionResult<()> {
        let handle = self.handle(session_id)?;
        let mut session = handle.lock().await;
        session.update_cursor(user_id, cursor.clone())?;
        drop(session);
        self.bus.publish(ConclaveEvent::CursorMoved {
            metadata: EventMetadata::now(),
            session_id,
            user_id,
            cursor,
        });
        Ok(())
    }

    /// `acquireLock`.
    pub async fn acquire_lock(&self, session_id: SessionId, user_id: UserId) -> SessionResult<bool> {
        let handle = self.handle(session_id)?;
        let mut session = handle.lock().await;
        let acquired = session.acquire_lock(user_id)?;
        if acquired {
            self.bus.publish(ConclaveEvent::LockAcquired {
                metadata: EventMetadata::now(),
                session_id,
                user_id,
            });
        }
        Ok(acquired)
    }

    /// `releaseLock`.
    pub async fn release_lock(&self, session_id: SessionId, user_id: UserId) -> SessionResult<()> {
        let handle = self.handle(session_id)?;
        let mut session = handle.lock().await;
        session.release_lock(user_id)?;
        drop(session);
        self.bus.publish(ConclaveEvent::LockReleased {
            metadata: EventMetadata::now(),
            session_id,
            user_id,
        });
        Ok(())
    }

    /// `canEdit`.
    pub async fn can_edit(&self, session_id: SessionId, user_id: UserId) -> SessionResult<bool> {
        let handle = self.handle(session_id)?;
        Ok(handle.lock().await.can_edit(user_id))
    }

    /// `updateState` — routes through the conflict resolver with this
    /// store's configured strategy, emitting whichever of
    /// `conflict.detected` / `.resolved` / `.rejected` applies, always
    /// followed by `state.changed` when the state actually mutated.
    #[instrument(skip(self, delta))]
    pub async fn update_state(
        &self,
        session_id: SessionId,
        base_version: u64,
        delta: StateDelta,
    ) -> SessionResult<Outcome> {
        let handle = self.handle(session_id)?;
        let mut session = handle.lock().await;
        let outcome = resolve(&session.state, base_version, &delta, &self.config.conflict)
            .map_err(|_| SessionError::FutureVersion { session: session_id })?;

        match &outcome {
            Outcome::Applied { new_state } => {
                session.state = new_state.clone();
            }
            Outcome::Resolved {
                new_state,
                conflicting_fields,
                merged_fields,
                rejected_updates,
            } => {
                self.bus.publish(ConclaveEvent::ConflictDetected {
                    metadata: EventMetadata::now(),
                    session_id,
                    conflicting_fields: conflicting_fields.clone(),
                });
                session.state = new_state.clone();
                self.bus.publish(ConclaveEvent::ConflictResolved {
                    metadata: EventMetadata::now(),
                    session_id,
                    outcome: MergeOutcome {
                        merged_fields: merged_fields.clone(),
                        rejected_updates: rejected_updates.clone(),
                    },
                });
            }
            Outcome::Rejected {
                conflicting_fields,
                reason,
            } => {
                self.bus.publish(ConclaveEvent::ConflictDetected {
                    metadata: EventMetadata::now(),
                    session_id,
                    conflicting_fields: conflicting_fields.clone(),
                });
                self.bus.publish(ConclaveEvent::ConflictRejected {
                    metadata: EventMetadata::now(),
                    session_id,
                    reason: reason.clone(),
                });
                return Ok(outcome);
            }
        }

        let final_state = session.state.clone();
        drop(session);
        self.bus.publish(ConclaveEvent::StateChanged {
            metadata: EventMetadata::now(),
            session_id,
            state: final_state,
        });
        Ok(outcome)
    }

    /// `enqueue`.
    #[instrument(skip(self, content))]
    pub async fn enqueue(
        &self,
        session_id: SessionId,
        user_id: UserId,
        content: impl Into<String> + std::fmt::Debug,
        priority: Priority,
    ) -> SessionResult<Prompt> {
        let handle = self.handle(session_id)?;
        let mut session = handle.lock().await;
        let prompt = session.enqueue(user_id, content, priority, self.config.max_queue_size)?;
        drop(session);
        self.bus.publish(ConclaveEvent::PromptQueued {
            metadata: EventMetadata::now(),
            session_id,
            prompt: prompt.clone(),
        });
        Ok(prompt)
    }

    /// `startNext`.
    pub async fn start_next(&self, session_id: SessionId) -> SessionResult<Option<Prompt>> {
        let handle = self.handle(session_id)?;
        let mut session = handle.lock().await;
        let Some(prompt) = session.start_next() else {
            return Ok(None);
        };
        session.state.agent_status = conclave_core::AgentStatus::Executing;
        session.state.version = session.state.version.saturating_add(1);
        let state = session.state.clone();
        drop(session);

        self.bus.publish(ConclaveEvent::PromptStarted {
            metadata: EventMetadata::now(),
            session_id,
            prompt_id: prompt.prompt_id,
        });
        self.bus.publish(ConclaveEvent::StateChanged {
            metadata: EventMetadata::now(),
            session_id,
            state,
        });
        Ok(Some(prompt))
    }

    /// `complete`.
    pub async fn complete(&self, session_id: SessionId) -> SessionResult<Option<Prompt>> {
        let handle = self.handle(session_id)?;
        let mut session = handle.lock().await;
        let Some(prompt) = session.complete() else {
            return Ok(None);
        };
        session.state.agent_status = conclave_core::AgentStatus::Idle;
        session.state.version = session.state.version.saturating_add(1);
        let state = session.state.clone();
        drop(session);

        self.bus.publish(ConclaveEvent::PromptCompleted {
            metadata: EventMetadata::now(),
            session_id,
            prompt_id: prompt.prompt_id,
        });
        self.bus.publish(ConclaveEvent::StateChanged {
            metadata: EventMetadata::now(),
            session_id,
            state,
        });
        Ok(Some(prompt))
    }

    /// `cancel`.
    pub async fn cancel(
        &self,
        session_id: SessionId,
        prompt_id: PromptId,
        user_id: UserId,
    ) -> SessionResult<()> {
        let handle = self.handle(session_id)?;
        let mut session = handle.lock().await;
        session.cancel(prompt_id, user_id)?;
        drop(session);
        self.bus.publish(ConclaveEvent::PromptCancelled {
            metadata: EventMetadata::now(),
            session_id,
            prompt_id,
        });
        Ok(())
    }

    /// `reorder`.
    pub async fn reorder(
        &self,
        session_id: SessionId,
        prompt_id: PromptId,
        user_id: UserId,
        new_index: usize,
    ) -> SessionResult<()> {
        let handle = self.handle(session_id)?;
        let mut session = handle.lock().await;
        session.reorder(prompt_id, user_id, new_index)?;
        drop(session);
        self.bus.publish(ConclaveEvent::PromptReordered {
            metadata: EventMetadata::now(),
            session_id,
            prompt_id,
            new_index,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new(EventBus::new(), SessionStoreConfig::default())
    }

    #[tokio::test]
    async fn create_mints_a_fresh_session() {
        let store = store();
        let session = store.create("ext-1").await;
        assert_eq!(session.external_session_id, "ext-1");
        assert_eq!(store.all().len(), 1);
    }

    #[tokio::test]
    async fn create_with_a_known_external_id_returns_the_existing_session() {
        let store = store();
        let first = store.create("ext-1").await;
        let second = store.create("ext-1").await;
        assert_eq!(first.id, second.id);
        assert_eq!(store.all().len(), 1);
    }

    #[tokio::test]
    async fn join_emits_and_connect_respects_membership() {
        let store = store();
        let session = store.create("ext-1").await;
        let user_id = UserId::new();
        store
            .join(session.id, user_id, "ana", None, None, None)
            .await
            .unwrap();
        let client = store
            .connect(session.id, user_id, ClientType::Web)
            .await
            .unwrap();
        assert_eq!(client.user_id, user_id);
    }

    #[tokio::test]
    async fn update_state_last_write_wins_by_default() {
        let store = store();
        let session = store.create("ext-1").await;
        let delta = StateDelta {
            agent_status: Some(conclave_core::AgentStatus::Thinking),
            ..Default::default()
        };
        let outcome = store.update_state(session.id, 0, delta).await.unwrap();
        assert!(matches!(outcome, Outcome::Applied { .. }));
        let fetched = store.get(session.id).await.unwrap();
        assert_eq!(fetched.state.version, 1);
    }

    #[tokio::test]
    async fn prompt_lifecycle_flows_through_the_store() {
        let store = store();
        let session = store.create("ext-1").await;
        let user_id = UserId::new();
        store
            .join(session.id, user_id, "ana", None, None, None)
            .await
            .unwrap();
        store
            .enqueue(session.id, user_id, "do the thing", Priority::Normal)
            .await
            .unwrap();
        let started = store.start_next(session.id).await.unwrap().unwrap();
        let fetched = store.get(session.id).await.unwrap();
        assert_eq!(fetched.state.agent_status, conclave_core::AgentStatus::Executing);
        let completed = store.complete(session.id).await.unwrap().unwrap();
        assert_eq!(completed.prompt_id, started.prompt_id);
        let fetched = store.get(session.id).await.unwrap();
        assert_eq!(fetched.state.agent_status, conclave_core::AgentStatus::Idle);
    }

    #[tokio::test]
    async fn delete_removes_the_session_and_its_external_mapping() {
        let store = store();
        let session = store.create("ext-1").await;
        store.delete(session.id).unwrap();
        assert!(store.get(session.id).await.is_err());
        let recreated = store.create("ext-1").await;
        assert_ne!(recreated.id, session.id);
    }
}
