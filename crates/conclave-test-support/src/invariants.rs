//! Universal invariant checks (spec §8, invariants 1–3 and 5), runnable
//! against a point-in-time session snapshot after any mutator in a test.

use conclave_session::{Session, SessionStoreConfig};

/// Assert that `session` satisfies every universal invariant that can be
/// checked from a single snapshot (the history-dependent invariants 4, 6,
/// 7, 8 are checked by the sequential-history tests instead).
///
/// # Panics
///
/// Panics with a descriptive message on the first invariant violated.
pub fn check_invariants(session: &Session, config: &SessionStoreConfig) {
    check_edit_lock_held_by_member(session);
    check_every_client_has_a_member(session);
    check_capacity(session, config);
    check_at_most_one_executing(session);
}

/// Invariant 1: `state.edit_lock` is either unset or a current member.
fn check_edit_lock_held_by_member(session: &Session) {
    if let Some(holder) = session.state.edit_lock {
        assert!(
            session.user(holder).is_some(),
            "edit_lock {holder:?} does not reference a current session member",
        );
    }
}

/// Invariant 2: every connected client belongs to a current member.
fn check_every_client_has_a_member(session: &Session) {
    for client in session.clients() {
        assert!(
            session.user(client.user_id).is_some(),
            "client {:?} references non-member user {:?}",
            client.client_id,
            client.user_id,
        );
    }
}

/// Invariant 3: membership and per-user connection counts stay within the
/// configured caps.
fn check_capacity(session: &Session, config: &SessionStoreConfig) {
    let users = session.users();
    assert!(
        users.len() <= config.max_users_per_session,
        "session has {} users, exceeding max_users_per_session {}",
        users.len(),
        config.max_users_per_session,
    );

    for user in &users {
        let count = session
            .clients()
            .iter()
            .filter(|c| c.user_id == user.user_id)
            .count();
        assert!(
            count <= config.max_clients_per_user,
            "user {:?} has {count} clients, exceeding max_clients_per_user {}",
            user.user_id,
            config.max_clients_per_user,
        );
    }
}

/// Invariant 5: the executing prompt, if any, is not also sitting in the
/// queue, and there is never more than one.
fn check_at_most_one_executing(session: &Session) {
    if let Some(executing) = &session.executing {
        assert!(
            !session
                .prompt_queue()
                .iter()
                .any(|p| p.prompt_id == executing.prompt_id),
            "executing prompt {:?} is also present in the queue",
            executing.prompt_id,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::SessionStoreFixture;

    #[tokio::test]
    async fn fresh_session_satisfies_invariants() {
        let fixture = SessionStoreFixture::new()
            .with_session("ext-1")
            .await
            .with_user("alice")
            .await;
        let session = fixture.store.get(fixture.session_id()).await.unwrap();
        check_invariants(&session, &SessionStoreConfig::default());
    }

    #[tokio::test]
    #[should_panic(expected = "does not reference a current session member")]
    async fn detects_dangling_edit_lock() {
        let fixture = SessionStoreFixture::new().with_session("ext-1").await;
        let mut session = fixture.store.get(fixture.session_id()).await.unwrap();
        session.state.edit_lock = Some(conclave_core::UserId::new());
        check_invariants(&session, &SessionStoreConfig::default());
    }
}
