//! Session-store error taxonomy.

use conclave_core::{ClientId, PromptId, SessionId, UserId};
use thiserror::Error;

/// Errors a session-store mutator can fail with.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No session exists with this id.
    #[error("session {0} not found")]
    SessionNotFound(SessionId),
    /// The session is at `max_users_per_session` and the joining user isn't
    /// already a member.
    #[error("session {0} is full")]
    SessionFull(SessionId),
    /// The user referenced isn't a member of the session.
    #[error("user {user} is not a member of session {session}")]
    UserNotInSession {
        /// The session.
        session: SessionId,
        /// The user.
        user: UserId,
    },
    /// The user is already at `max_clients_per_user` connections.
    #[error("user {user} has reached the client limit for session {session}")]
    ClientLimitReached {
        /// The session.
        session: SessionId,
        /// The user.
        user: UserId,
    },
    /// No client exists with this id in the session.
    #[error("client {0} not found")]
    ClientNotFound(ClientId),
    /// The edit lock is already held by someone else.
    #[error("edit lock already held in session {0}")]
    LockAlreadyHeld(SessionId),
    /// The caller tried to release a lock they don't hold.
    #[error("user {user} does not hold the edit lock in session {session}")]
    NotLockHolder {
        /// The session.
        session: SessionId,
        /// The user.
        user: UserId,
    },
    /// The queue is at `max_queue_size`.
    #[error("prompt queue for session {0} is full")]
    QueueFull(SessionId),
    /// No prompt exists with this id in the session's queue.
    #[error("prompt {0} not found")]
    PromptNotFound(PromptId),
    /// The caller doesn't own the prompt and lacks a manage capability.
    #[error("user {user} does not own prompt {prompt}")]
    NotPromptOwner {
        /// The prompt.
        prompt: PromptId,
        /// The user.
        user: UserId,
    },
    /// The targeted prompt is currently executing and can't be cancelled or
    /// reordered via queue operations.
    #[error("prompt {0} is currently executing")]
    PromptExecuting(PromptId),
    /// A reorder would move the prompt across priority classes.
    #[error("reorder of prompt {0} would cross a priority-class boundary")]
    CrossPriorityReorder(PromptId),
    /// An `updateState` call named a `base_version` ahead of the session's
    /// actual current version.
    #[error("session {session} received a base_version ahead of its current version")]
    FutureVersion {
        /// The session.
        session: SessionId,
    },
}

/// Result alias for session-store operations.
pub type SessionResult<T> = Result<T, SessionError>;
