//! Session-store tunables.

use conclave_conflict::ConflictConfig;
use serde::{Deserialize, Serialize};

/// Capacity limits and conflict-resolution defaults for a [`crate::SessionStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionStoreConfig {
    /// Maximum members per session.
    pub max_users_per_session: usize,
    /// Maximum connections per user within a session.
    pub max_clients_per_user: usize,
    /// Maximum prompts queued (excluding the executing one) per session.
    pub max_queue_size: usize,
    /// Conflict-resolver configuration applied by `update_state`.
    pub conflict: ConflictConfig,
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        Self {
            max_users_per_session: 32,
            max_clients_per_user: 4,
            max_queue_size: 100,
            conflict: ConflictConfig::default(),
        }
    }
}
