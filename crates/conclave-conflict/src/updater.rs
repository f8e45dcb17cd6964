//! Client-side optimistic-updater companion: tracks updates sent but not
//! yet confirmed, so a reconnecting client can replay them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use conclave_core::ClientId;
use dashmap::DashMap;

use crate::StateDelta;

/// One update awaiting confirmation from the server.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingUpdate {
    /// The client that issued the update.
    pub client_id: ClientId,
    /// The version the update was based on.
    pub base_version: u64,
    /// The delta sent.
    pub delta: StateDelta,
    /// When it was sent.
    pub sent_at: DateTime<Utc>,
}

/// Tracks in-flight optimistic updates keyed by a caller-generated id.
///
/// This mirrors what a thin client SDK holds locally, but lives here so a
/// gateway-side session can replay a reconnecting client's unacknowledged
/// updates without depending on gateway internals.
#[derive(Debug, Default)]
pub struct OptimisticUpdater {
    pending: DashMap<String, PendingUpdate>,
}

impl OptimisticUpdater {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
        }
    }

    /// Record a newly sent update under `update_id`.
    pub fn track(&self, update_id: impl Into<String>, update: PendingUpdate) {
        self.pending.insert(update_id.into(), update);
    }

    /// The server confirmed `update_id`; stop tracking it.
    pub fn confirm(&self, update_id: &str) {
        self.pending.remove(update_id);
    }

    /// The server rejected `update_id`; return it and stop tracking it, so
    /// the caller can decide whether to retry.
    pub fn rollback(&self, update_id: &str) -> Option<PendingUpdate> {
        self.pending.remove(update_id).map(|(_, update)| update)
    }

    /// All updates still awaiting confirmation, for reconnect replay.
    #[must_use]
    pub fn pending(&self) -> HashMap<String, PendingUpdate> {
        self.pending
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Number of updates currently pending.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no updates are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_update() -> PendingUpdate {
        PendingUpdate {
            client_id: ClientId::new(),
            base_version: 3,
            delta: StateDelta::default(),
            sent_at: Utc::now(),
        }
    }

    #[test]
    fn confirm_removes_a_tracked_update() {
        let updater = OptimisticUpdater::new();
        updater.track("u1", sample_update());
        assert_eq!(updater.len(), 1);
        updater.confirm("u1");
        assert!(updater.is_empty());
    }

    #[test]
    fn rollback_returns_and_removes() {
        let updater = OptimisticUpdater::new();
        let update = sample_update();
        updater.track("u1", update.clone());
        let rolled_back = updater.rollback("u1").unwrap();
        assert_eq!(rolled_back.base_version, update.base_version);
        assert!(updater.is_empty());
    }

    #[test]
    fn pending_lists_everything_not_yet_resolved() {
        let updater = OptimisticUpdater::new();
        updater.track("u1", sample_update());
        updater.track("u2", sample_update());
        updater.confirm("u1");
        let pending = updater.pending();
        assert_eq!(pending.len(), 1);
        assert!(pending.contains_key("u2"));
    }
}
