//! Resolver configuration.

use crate::Strategy;
use serde::{Deserialize, Serialize};

/// Tunables for [`crate::resolve`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictConfig {
    /// Which strategy to dispatch to once a conflict is detected.
    pub strategy: Strategy,
    /// Fields that can never be silently merged; a conflicting update that
    /// touches one of these is rejected outright under `merge`.
    pub non_mergeable_fields: Vec<String>,
    /// Maximum allowed `current.version - base_version` before the update
    /// is rejected regardless of strategy.
    pub max_version_drift: u64,
}

impl Default for ConflictConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::LastWriteWins,
            non_mergeable_fields: vec!["edit_lock".to_string()],
            max_version_drift: 10,
        }
    }
}
