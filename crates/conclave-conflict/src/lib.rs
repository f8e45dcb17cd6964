//! Optimistic concurrency resolver for versioned session state.
//!
//! This crate has one job: given the caller's `base_version` and a partial
//! update, decide whether to apply it to a `{..., version}` value, and how,
//! under one of three configurable strategies. It never touches storage —
//! callers hold the lock over the current value and pass it in by reference.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod config;
mod error;
mod resolver;
mod updater;

pub use config::ConflictConfig;
pub use error::{ConflictError, ConflictResult};
pub use resolver::{resolve, Outcome, StateDelta};
pub use updater::{OptimisticUpdater, PendingUpdate};

/// Resolution strategy applied when `baseVersion != current.version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Apply the full update anyway, discarding the conflict.
    #[default]
    LastWriteWins,
    /// Refuse any update that doesn't target the current version.
    Reject,
    /// Apply only the update's non-conflicting keys; reject the whole
    /// update if a conflicting key is in `non_mergeable_fields`.
    Merge,
}
