//! Builder for a preloaded [`SessionStore`].

use std::collections::HashMap;

use conclave_core::{SessionId, UserId};
use conclave_events::EventBus;
use conclave_session::{SessionStore, SessionStoreConfig};

/// A [`SessionStore`] plus bookkeeping of what this fixture has already
/// created, so a test can chain `with_session`/`with_user` calls and then
/// read back the ids it generated.
pub struct SessionStoreFixture {
    /// The store under construction.
    pub store: SessionStore,
    /// The event bus the store publishes to.
    pub bus: EventBus,
    sessions: Vec<SessionId>,
    users: HashMap<SessionId, Vec<UserId>>,
}

impl SessionStoreFixture {
    /// An empty store with default capacity limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SessionStoreConfig::default())
    }

    /// An empty store with the given capacity limits, for tests exercising
    /// capacity edge cases.
    #[must_use]
    pub fn with_config(config: SessionStoreConfig) -> Self {
        let bus = EventBus::new();
        Self {
            store: SessionStore::new(bus.clone(), config),
            bus,
            sessions: Vec::new(),
            users: HashMap::new(),
        }
    }

    /// Create a session and make it the "current" session for subsequent
    /// `with_user` calls.
    #[must_use = "with_session returns the fixture with the new session appended"]
    pub async fn with_session(mut self, external_session_id: impl Into<String>) -> Self {
        let session = self.store.create(external_session_id).await;
        self.users.insert(session.id, Vec::new());
        self.sessions.push(session.id);
        self
    }

    /// Join a fresh user into the current session.
    ///
    /// # Panics
    ///
    /// Panics if called before `with_session`, or if the join is rejected
    /// (a fixture building a capacity-exceeded scenario should call
    /// `store.join` directly instead).
    #[must_use = "with_user returns the fixture with the new user appended"]
    pub async fn with_user(mut self, name: impl Into<String>) -> Self {
        let session_id = self.session_id();
        let user_id = UserId::new();
        self.store
            .join(session_id, user_id, name, None, None, None)
            .await
            .expect("fixture join should succeed");
        self.users.get_mut(&session_id).expect("session tracked").push(user_id);
        self
    }

    /// The most recently created session.
    ///
    /// # Panics
    ///
    /// Panics if no session has been created yet.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        *self.sessions.last().expect("call with_session before session_id")
    }

    /// Every user joined to the current session, in join order.
    #[must_use]
    pub fn user_ids(&self) -> &[UserId] {
        self.users.get(&self.session_id()).map_or(&[], Vec::as_slice)
    }
}

impl Default for SessionStoreFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builds_a_session_with_users() {
        let fixture = SessionStoreFixture::new()
            .with_session("ext-1")
            .await
            .with_user("alice")
            .await
            .with_user("bob")
            .await;

        assert_eq!(fixture.user_ids().len(), 2);
        let session = fixture.store.get(fixture.session_id()).await.unwrap();
        assert_eq!(session.users().len(), 2);
    }
}
