//! The resolution algorithm.

use conclave_core::{AgentStatus, GitSyncStatus, SessionState, UserId};
use serde::Serialize;

use crate::{ConflictConfig, ConflictError, ConflictResult, Strategy};

/// A typed partial update over [`SessionState`]'s mutable fields.
///
/// Each field is `Option<_>` at the outer level to mean "this update
/// touches this field"; `edit_lock` is doubly-optional because the field
/// itself is optional (`Some(None)` clears the lock, `None` leaves it
/// untouched by this delta).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateDelta {
    /// New edit-lock holder, or `Some(None)` to clear it. `None` means this
    /// delta doesn't touch the lock.
    pub edit_lock: Option<Option<UserId>>,
    /// New git sync status, if this delta touches it.
    pub git_sync_status: Option<GitSyncStatus>,
    /// New agent status, if this delta touches it.
    pub agent_status: Option<AgentStatus>,
}

impl StateDelta {
    /// Names of the fields this delta sets, in a stable order. This is the
    /// `updates`'s key set the specification's algorithm refers to.
    #[must_use]
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::with_capacity(3);
        if self.edit_lock.is_some() {
            names.push("edit_lock");
        }
        if self.git_sync_status.is_some() {
            names.push("git_sync_status");
        }
        if self.agent_status.is_some() {
            names.push("agent_status");
        }
        names
    }

    fn apply_to(&self, state: &mut SessionState) {
        if let Some(lock) = self.edit_lock.clone() {
            state.edit_lock = lock;
        }
        if let Some(status) = self.git_sync_status {
            state.git_sync_status = status;
        }
        if let Some(status) = self.agent_status {
            state.agent_status = status;
        }
    }
}

/// The result of a single [`resolve`] call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The update applied cleanly because `base_version == current.version`.
    Applied {
        /// The new state, post-mutation.
        new_state: SessionState,
    },
    /// A conflict was detected and resolved by applying some or all of the
    /// update (`last-write-wins` applies all; `merge` applies a subset).
    Resolved {
        /// The new state, post-mutation.
        new_state: SessionState,
        /// Field names present in both the update and the current state.
        conflicting_fields: Vec<String>,
        /// Field names from the update that were actually applied.
        merged_fields: Vec<String>,
        /// Field names from the update that were dropped.
        rejected_updates: Vec<String>,
    },
    /// The update was rejected outright: state is unchanged.
    Rejected {
        /// Field names present in both the update and the current state.
        conflicting_fields: Vec<String>,
        /// Why the update was rejected.
        reason: String,
    },
}

/// Apply `delta` to `current` given the caller's `base_version`, per the
/// resolver's configured strategy.
///
/// # Errors
///
/// Returns [`ConflictError::FutureVersion`] if `base_version` is greater
/// than `current.version` — that can only mean the caller observed a state
/// that doesn't exist yet, which is a bug in the caller, not a conflict.
pub fn resolve(
    current: &SessionState,
    base_version: u64,
    delta: &StateDelta,
    config: &ConflictConfig,
) -> ConflictResult<Outcome> {
    if base_version > current.version {
        return Err(ConflictError::FutureVersion {
            base_version,
            current_version: current.version,
        });
    }

    if base_version == current.version {
        let mut new_state = current.clone();
        delta.apply_to(&mut new_state);
        new_state.version = new_state.version.saturating_add(1);
        return Ok(Outcome::Applied { new_state });
    }

    let conflicting_fields: Vec<String> = delta.field_names().iter().map(|s| (*s).to_string()).collect();

    if current.version.saturating_sub(base_version) > config.max_version_drift {
        return Ok(Outcome::Rejected {
            conflicting_fields,
            reason: "version drift exceeds max_version_drift".to_string(),
        });
    }

    match config.strategy {
        Strategy::LastWriteWins => {
            let mut new_state = current.clone();
            delta.apply_to(&mut new_state);
            new_state.version = new_state.version.saturating_add(1);
            Ok(Outcome::Resolved {
                new_state,
                merged_fields: conflicting_fields.clone(),
                rejected_updates: Vec::new(),
                conflicting_fields,
            })
        }
        Strategy::Reject => Ok(Outcome::Rejected {
            conflicting_fields,
            reason: "conflict strategy is reject".to_string(),
        }),
        Strategy::Merge => {
            let blocks_merge = conflicting_fields
                .iter()
                .any(|f| config.non_mergeable_fields.iter().any(|nm| nm == f));
            if blocks_merge {
                return Ok(Outcome::Rejected {
                    conflicting_fields,
                    reason: "conflicting update touches a non-mergeable field".to_string(),
                });
            }

            // No non-mergeable field is in play, so every field the delta
            // touches merges cleanly; nothing is individually rejected.
            let merged_fields = conflicting_fields.clone();
            let mut new_state = current.clone();
            delta.apply_to(&mut new_state);
            new_state.version = new_state.version.saturating_add(1);

            Ok(Outcome::Resolved {
                new_state,
                conflicting_fields,
                merged_fields,
                rejected_updates: Vec::new(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_core::UserId;

    fn base_state() -> SessionState {
        SessionState::default()
    }

    #[test]
    fn matching_base_version_applies_cleanly() {
        let current = base_state();
        let delta = StateDelta {
            agent_status: Some(AgentStatus::Thinking),
            ..Default::default()
        };
        let outcome = resolve(&current, 0, &delta, &ConflictConfig::default()).unwrap();
        match outcome {
            Outcome::Applied { new_state } => {
                assert_eq!(new_state.version, 1);
                assert_eq!(new_state.agent_status, AgentStatus::Thinking);
            }
            other => panic!("expected Applied, got {other:?}"),
        }
    }

    #[test]
    fn future_version_is_an_error() {
        let current = base_state();
        let err = resolve(&current, 5, &StateDelta::default(), &ConflictConfig::default())
            .unwrap_err();
        assert_eq!(
            err,
            ConflictError::FutureVersion {
                base_version: 5,
                current_version: 0
            }
        );
    }

    #[test]
    fn drift_beyond_max_is_rejected_regardless_of_strategy() {
        let mut current = base_state();
        current.version = 20;
        let config = ConflictConfig {
            max_version_drift: 10,
            ..ConflictConfig::default()
        };
        let outcome = resolve(&current, 0, &StateDelta::default(), &config).unwrap();
        assert!(matches!(outcome, Outcome::Rejected { .. }));
    }

    #[test]
    fn last_write_wins_applies_despite_conflict() {
        let mut current = base_state();
        current.version = 3;
        current.agent_status = AgentStatus::Executing;
        let delta = StateDelta {
            agent_status: Some(AgentStatus::Idle),
            ..Default::default()
        };
        let config = ConflictConfig {
            strategy: Strategy::LastWriteWins,
            ..ConflictConfig::default()
        };
        let outcome = resolve(&current, 0, &delta, &config).unwrap();
        match outcome {
            Outcome::Resolved { new_state, merged_fields, rejected_updates, .. } => {
                assert_eq!(new_state.version, 4);
                assert_eq!(new_state.agent_status, AgentStatus::Idle);
                assert_eq!(merged_fields, vec!["agent_status"]);
                assert!(rejected_updates.is_empty());
            }
            other => panic!("expected Resolved, got {other:?}"),
        }
    }

    #[test]
    fn reject_strategy_never_mutates_state() {
        let mut current = base_state();
        current.version = 3;
        let delta = StateDelta {
            agent_status: Some(AgentStatus::Idle),
            ..Default::default()
        };
        let config = ConflictConfig {
            strategy: Strategy::Reject,
            ..ConflictConfig::default()
        };
        let outcome = resolve(&current, 0, &delta, &config).unwrap();
        assert!(matches!(outcome, Outcome::Rejected { .. }));
    }

    #[test]
    fn merge_rejects_whole_update_when_edit_lock_conflicts() {
        let mut current = base_state();
        current.version = 3;
        let user = UserId::new();
        let delta = StateDelta {
            edit_lock: Some(Some(user)),
            agent_status: Some(AgentStatus::Idle),
            ..Default::default()
        };
        let config = ConflictConfig {
            strategy: Strategy::Merge,
            ..ConflictConfig::default()
        };
        let outcome = resolve(&current, 0, &delta, &config).unwrap();
        match outcome {
            Outcome::Rejected { conflicting_fields, .. } => {
                assert!(conflicting_fields.contains(&"edit_lock".to_string()));
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn merge_applies_non_conflicting_fields_when_no_non_mergeable_field_present() {
        let mut current = base_state();
        current.version = 3;
        let delta = StateDelta {
            agent_status: Some(AgentStatus::Thinking),
            git_sync_status: Some(GitSyncStatus::Synced),
            ..Default::default()
        };
        let config = ConflictConfig {
            strategy: Strategy::Merge,
            ..ConflictConfig::default()
        };
        let outcome = resolve(&current, 0, &delta, &config).unwrap();
        match outcome {
            Outcome::Resolved {
                new_state,
                merged_fields,
                rejected_updates,
                ..
            } => {
                assert_eq!(new_state.version, 4);
                assert_eq!(new_state.agent_status, AgentStatus::Thinking);
                assert_eq!(new_state.git_sync_status, GitSyncStatus::Synced);
                assert_eq!(merged_fields.len(), 2);
                assert!(rejected_updates.is_empty());
            }
            other => panic!("expected Resolved, got {other:?}"),
        }
    }

    #[test]
    fn an_empty_delta_under_merge_is_a_semantic_no_op_success() {
        let mut current = base_state();
        current.version = 3;
        let config = ConflictConfig {
            strategy: Strategy::Merge,
            ..ConflictConfig::default()
        };
        let outcome = resolve(&current, 0, &StateDelta::default(), &config).unwrap();
        match outcome {
            Outcome::Resolved {
                new_state,
                merged_fields,
                ..
            } => {
                assert_eq!(new_state.version, 4);
                assert!(merged_fields.is_empty());
            }
            other => panic!("expected Resolved (no-op success), got {other:?}"),
        }
    }
}
