//! Crate-wide error taxonomy.
//!
//! Every mutator in the session coordination core returns
//! `Result<T, ConclaveError>` rather than throwing — the error kinds here
//! map directly onto the HTTP status table in the specification's error
//! handling section.

use thiserror::Error;

use crate::ids::{PromptId, SessionId, UserId};

/// Errors produced by the session coordination core.
#[derive(Debug, Error)]
pub enum ConclaveError {
    /// The referenced session does not exist.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// The referenced prompt does not exist in the session's queue.
    #[error("prompt not found: {0}")]
    PromptNotFound(PromptId),

    /// The referenced client does not exist.
    #[error("client not found: {0}")]
    ClientNotFound(String),

    /// The referenced external mapping does not exist.
    #[error("mapping not found: {0}")]
    MappingNotFound(String),

    /// The caller is not a member of the session.
    #[error("user {user} is not a member of session {session}")]
    NotMember {
        /// The session the caller attempted to act on.
        session: SessionId,
        /// The user that is not a member.
        user: UserId,
    },

    /// The caller does not hold the edit lock, or does not own the prompt
    /// it is trying to cancel/reorder.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// An optimistic update was rejected because the base version had
    /// drifted too far, or the configured strategy rejects on conflict.
    #[error("conflict: base version {base_version} vs current {current_version}")]
    Conflict {
        /// The version the caller thought it was updating from.
        base_version: u64,
        /// The actual current version.
        current_version: u64,
    },

    /// A capacity limit (session membership, client count, queue size,
    /// mapping store) was exceeded.
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// The request was malformed: bad payload shape, unknown event type,
    /// or a webhook signature that failed verification.
    #[error("invalid request: {0}")]
    Invalid(String),

    /// An outbound call (webhook response posting, external fetch) failed
    /// and may be retried.
    #[error("transient failure: {0}")]
    Transient(String),
}

impl ConclaveError {
    /// Short, stable machine-readable code for this error kind, used as the
    /// `code` field on WebSocket `error` frames.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::SessionNotFound(_) => "SESSION_NOT_FOUND",
            Self::PromptNotFound(_) => "PROMPT_NOT_FOUND",
            Self::ClientNotFound(_) => "CLIENT_NOT_FOUND",
            Self::MappingNotFound(_) => "MAPPING_NOT_FOUND",
            Self::NotMember { .. } => "USER_NOT_IN_SESSION",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Conflict { .. } => "CONFLICT",
            Self::CapacityExceeded(_) => "CAPACITY_EXCEEDED",
            Self::Invalid(_) => "INVALID_MESSAGE",
            Self::Transient(_) => "TRANSIENT",
        }
    }
}

/// Convenience alias for results produced by the session coordination core.
pub type ConclaveResult<T> = Result<T, ConclaveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_not_found_carries_the_id_in_its_message() {
        let id = SessionId::new();
        let err = ConclaveError::SessionNotFound(id);
        assert!(err.to_string().contains(&id.to_string()));
        assert_eq!(err.code(), "SESSION_NOT_FOUND");
    }

    #[test]
    fn conflict_reports_both_versions() {
        let err = ConclaveError::Conflict {
            base_version: 3,
            current_version: 5,
        };
        assert_eq!(err.code(), "CONFLICT");
        assert!(err.to_string().contains('3'));
        assert!(err.to_string().contains('5'));
    }
}
