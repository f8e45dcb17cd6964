//! Error type for conflict resolution.

use thiserror::Error;

/// Errors the resolver can report. Note that a *rejected* update is not an
/// error — [`crate::resolve`] reports that through [`crate::Outcome`], since
/// it's an expected, well-formed result the caller must relay to the client
/// (typically as an HTTP 409 / WebSocket `conflict.rejected`).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConflictError {
    /// The update referenced a version that hasn't existed yet.
    #[error("base version {base_version} is ahead of current version {current_version}")]
    FutureVersion {
        /// The version the update claimed to be based on.
        base_version: u64,
        /// The actual current version.
        current_version: u64,
    },
}

/// Result alias for conflict-resolver operations.
pub type ConflictResult<T> = Result<T, ConflictError>;
