//! Adapter-level errors.

use thiserror::Error;

/// Errors surfaced by outbound response posting. Inbound translation never
/// errors this way — a malformed or unrecognized event comes back through
/// [`crate::HandleOutcome::error`] instead, per the specification's "never
/// throws" contract for `handle`.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The outbound HTTP call failed after retries were exhausted.
    #[error("outbound request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// The external platform rejected the request.
    #[error("external platform returned {status}: {body}")]
    PlatformRejected {
        /// HTTP status returned.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
}

/// Result alias for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;
