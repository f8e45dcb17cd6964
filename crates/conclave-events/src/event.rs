//! The sealed set of event variants the bus carries.
//!
//! Every variant names enough context to identify the affected session (or
//! external-integration scope), matching the specification's requirement
//! that events "always include enough context to identify the affected
//! session".

use chrono::{DateTime, Utc};
use conclave_core::{Client, ClientId, Cursor, Prompt, PromptId, SessionId, User, UserId};
use serde::{Deserialize, Serialize};

/// Common metadata carried on every event: when it happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
}

impl EventMetadata {
    /// Stamp a new metadata value for "now".
    #[must_use]
    pub fn now() -> Self {
        Self {
            timestamp: Utc::now(),
        }
    }
}

/// Outcome of a conflict-resolver merge attempt, carried on
/// [`ConclaveEvent::ConflictResolved`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeOutcome {
    /// Field names that were applied from the update.
    pub merged_fields: Vec<String>,
    /// Field names present in the update but rejected (conflicting and
    /// non-mergeable, or dropped by a `last-write-wins`/`reject` strategy).
    pub rejected_updates: Vec<String>,
}

/// The external integration an ingestion event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationKind {
    /// Source-control pull-request integration.
    PullRequest,
    /// Chat-platform thread integration.
    Chat,
}

/// A single comment/review context attached to an integration event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentRef {
    /// Opaque comment identifier assigned by the external platform.
    pub comment_id: String,
    /// File path the comment is anchored to, if it's an inline comment.
    pub path: Option<String>,
    /// Line number the comment is anchored to, if it's an inline comment.
    pub line: Option<u32>,
}

/// The full tagged union of events the bus can carry.
///
/// Every variant is `#[non_exhaustive]`-free by design: this is a *sealed*
/// set matching the specification's event kind list exactly, so
/// subscribers can match exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ConclaveEvent {
    // --- Session lifecycle ---
    /// A new session was created.
    SessionCreated {
        /// Event metadata.
        metadata: EventMetadata,
        /// The new session's identifier.
        session_id: SessionId,
    },
    /// A session was deleted.
    SessionDeleted {
        /// Event metadata.
        metadata: EventMetadata,
        /// The deleted session's identifier.
        session_id: SessionId,
    },

    // --- Membership ---
    /// A user joined a session.
    UserJoined {
        /// Event metadata.
        metadata: EventMetadata,
        /// The session joined.
        session_id: SessionId,
        /// The user that joined.
        user: User,
    },
    /// A user left a session.
    UserLeft {
        /// Event metadata.
        metadata: EventMetadata,
        /// The session left.
        session_id: SessionId,
        /// The user that left.
        user_id: UserId,
    },
    /// A client connected to a session.
    ClientConnected {
        /// Event metadata.
        metadata: EventMetadata,
        /// The session connected to.
        session_id: SessionId,
        /// The new client.
        client: Client,
    },
    /// A client disconnected from a session.
    ClientDisconnected {
        /// Event metadata.
        metadata: EventMetadata,
        /// The session disconnected from.
        session_id: SessionId,
        /// The client that disconnected.
        client_id: ClientId,
        /// The user the client belonged to.
        user_id: UserId,
    },

    // --- Presence ---
    /// A user moved their cursor.
    CursorMoved {
        /// Event metadata.
        metadata: EventMetadata,
        /// The session.
        session_id: SessionId,
        /// The user whose cursor moved.
        user_id: UserId,
        /// The new cursor position.
        cursor: Cursor,
    },

    // --- Coordination ---
    /// The edit lock was acquired.
    LockAcquired {
        /// Event metadata.
        metadata: EventMetadata,
        /// The session.
        session_id: SessionId,
        /// The user that acquired the lock.
        user_id: UserId,
    },
    /// The edit lock was released.
    LockReleased {
        /// Event metadata.
        metadata: EventMetadata,
        /// The session.
        session_id: SessionId,
        /// The user that released the lock (or whose departure released it).
        user_id: UserId,
    },
    /// The session's versioned state changed.
    StateChanged {
        /// Event metadata.
        metadata: EventMetadata,
        /// The session.
        session_id: SessionId,
        /// The new state, post-mutation.
        state: conclave_core::SessionState,
    },

    // --- Queue ---
    /// A prompt was enqueued.
    PromptQueued {
        /// Event metadata.
        metadata: EventMetadata,
        /// The session.
        session_id: SessionId,
        /// The enqueued prompt.
        prompt: Prompt,
    },
    /// A prompt began executing.
    PromptStarted {
        /// Event metadata.
        metadata: EventMetadata,
        /// The session.
        session_id: SessionId,
        /// The prompt that started.
        prompt_id: PromptId,
    },
    /// A prompt finished executing.
    PromptCompleted {
        /// Event metadata.
        metadata: EventMetadata,
        /// The session.
        session_id: SessionId,
        /// The prompt that completed.
        prompt_id: PromptId,
    },
    /// A prompt was cancelled before it started executing.
    PromptCancelled {
        /// Event metadata.
        metadata: EventMetadata,
        /// The session.
        session_id: SessionId,
        /// The prompt that was cancelled.
        prompt_id: PromptId,
    },
    /// A prompt was moved within the queue.
    PromptReordered {
        /// Event metadata.
        metadata: EventMetadata,
        /// The session.
        session_id: SessionId,
        /// The prompt that moved.
        prompt_id: PromptId,
        /// Its new index within the queue.
        new_index: usize,
    },

    // --- Conflict ---
    /// A version mismatch was detected on an optimistic update.
    ConflictDetected {
        /// Event metadata.
        metadata: EventMetadata,
        /// The session.
        session_id: SessionId,
        /// Field names present in both the update and the current state.
        conflicting_fields: Vec<String>,
    },
    /// A conflicting update was resolved (applied in full or in part).
    ConflictResolved {
        /// Event metadata.
        metadata: EventMetadata,
        /// The session.
        session_id: SessionId,
        /// Which fields were merged vs. rejected.
        outcome: MergeOutcome,
    },
    /// A conflicting update was rejected outright.
    ConflictRejected {
        /// Event metadata.
        metadata: EventMetadata,
        /// The session.
        session_id: SessionId,
        /// Human-readable reason (drift exceeded, or `reject` strategy).
        reason: String,
    },

    // --- Integration: pull requests ---
    /// A pull request was opened or reopened.
    PrOpened {
        /// Event metadata.
        metadata: EventMetadata,
        /// Repository in `owner/repo` form.
        repo: String,
        /// Pull request number.
        pr_number: u64,
        /// The mapped session, if one was created.
        session_id: Option<SessionId>,
    },
    /// A pull request was edited, synchronized, or relabeled.
    PrUpdated {
        /// Event metadata.
        metadata: EventMetadata,
        /// Repository in `owner/repo` form.
        repo: String,
        /// Pull request number.
        pr_number: u64,
        /// The mapped session, if known.
        session_id: Option<SessionId>,
    },
    /// A pull request was closed without merging.
    PrClosed {
        /// Event metadata.
        metadata: EventMetadata,
        /// Repository in `owner/repo` form.
        repo: String,
        /// Pull request number.
        pr_number: u64,
        /// The mapped session, if known.
        session_id: Option<SessionId>,
    },
    /// A pull request was merged.
    PrMerged {
        /// Event metadata.
        metadata: EventMetadata,
        /// Repository in `owner/repo` form.
        repo: String,
        /// Pull request number.
        pr_number: u64,
        /// The mapped session, if known.
        session_id: Option<SessionId>,
    },
    /// A review comment was created or an issue comment was created on a PR.
    CommentCreated {
        /// Event metadata.
        metadata: EventMetadata,
        /// Repository in `owner/repo` form.
        repo: String,
        /// Pull request number.
        pr_number: u64,
        /// The comment reference (path/line populated for inline comments).
        comment: CommentRef,
    },
    /// A review comment was edited.
    CommentUpdated {
        /// Event metadata.
        metadata: EventMetadata,
        /// Repository in `owner/repo` form.
        repo: String,
        /// Pull request number.
        pr_number: u64,
        /// The comment reference.
        comment: CommentRef,
    },
    /// A pull request review was submitted.
    ReviewSubmitted {
        /// Event metadata.
        metadata: EventMetadata,
        /// Repository in `owner/repo` form.
        repo: String,
        /// Pull request number.
        pr_number: u64,
        /// Review state (e.g. `"approved"`, `"changes_requested"`).
        state: String,
    },
    /// A response was posted back to an external integration.
    ResponsePosted {
        /// Event metadata.
        metadata: EventMetadata,
        /// Which integration this response went to.
        integration: IntegrationKind,
        /// Whether posting succeeded.
        success: bool,
        /// Error detail, if posting failed.
        error: Option<String>,
    },

    // --- Integration: chat threads ---
    /// A chat thread mapping was created.
    ThreadCreated {
        /// Event metadata.
        metadata: EventMetadata,
        /// Chat channel identifier.
        channel_id: String,
        /// Thread timestamp (the platform's thread identifier).
        thread_ts: String,
        /// The mapped session, if one was created.
        session_id: Option<SessionId>,
    },
    /// A chat thread mapping was touched by a new event.
    ThreadUpdated {
        /// Event metadata.
        metadata: EventMetadata,
        /// Chat channel identifier.
        channel_id: String,
        /// Thread timestamp.
        thread_ts: String,
        /// The mapped session, if known.
        session_id: Option<SessionId>,
    },
    /// A chat thread reached a terminal `completed` status.
    ThreadCompleted {
        /// Event metadata.
        metadata: EventMetadata,
        /// Chat channel identifier.
        channel_id: String,
        /// Thread timestamp.
        thread_ts: String,
        /// The mapped session, if known.
        session_id: Option<SessionId>,
    },
}

impl ConclaveEvent {
    /// The event's wire-format type tag, e.g. `"user.joined"`.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SessionCreated { .. } => "session.created",
            Self::SessionDeleted { .. } => "session.deleted",
            Self::UserJoined { .. } => "user.joined",
            Self::UserLeft { .. } => "user.left",
            Self::ClientConnected { .. } => "client.connected",
            Self::ClientDisconnected { .. } => "client.disconnected",
            Self::CursorMoved { .. } => "cursor.moved",
            Self::LockAcquired { .. } => "lock.acquired",
            Self::LockReleased { .. } => "lock.released",
            Self::StateChanged { .. } => "state.changed",
            Self::PromptQueued { .. } => "prompt.queued",
            Self::PromptStarted { .. } => "prompt.started",
            Self::PromptCompleted { .. } => "prompt.completed",
            Self::PromptCancelled { .. } => "prompt.cancelled",
            Self::PromptReordered { .. } => "prompt.reordered",
            Self::ConflictDetected { .. } => "conflict.detected",
            Self::ConflictResolved { .. } => "conflict.resolved",
            Self::ConflictRejected { .. } => "conflict.rejected",
            Self::PrOpened { .. } => "pr.opened",
            Self::PrUpdated { .. } => "pr.updated",
            Self::PrClosed { .. } => "pr.closed",
            Self::PrMerged { .. } => "pr.merged",
            Self::CommentCreated { .. } => "comment.created",
            Self::CommentUpdated { .. } => "comment.updated",
            Self::ReviewSubmitted { .. } => "review.submitted",
            Self::ResponsePosted { .. } => "response.posted",
            Self::ThreadCreated { .. } => "thread.created",
            Self::ThreadUpdated { .. } => "thread.updated",
            Self::ThreadCompleted { .. } => "thread.completed",
        }
    }

    /// The session this event belongs to, if it's scoped to one. Integration
    /// events before a mapping exists (e.g. a `pr.opened` that didn't
    /// auto-create a session) return `None`.
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        match self {
            Self::SessionCreated { session_id, .. }
            | Self::SessionDeleted { session_id, .. }
            | Self::UserJoined { session_id, .. }
            | Self::UserLeft { session_id, .. }
            | Self::ClientConnected { session_id, .. }
            | Self::ClientDisconnected { session_id, .. }
            | Self::CursorMoved { session_id, .. }
            | Self::LockAcquired { session_id, .. }
            | Self::LockReleased { session_id, .. }
            | Self::StateChanged { session_id, .. }
            | Self::PromptQueued { session_id, .. }
            | Self::PromptStarted { session_id, .. }
            | Self::PromptCompleted { session_id, .. }
            | Self::PromptCancelled { session_id, .. }
            | Self::PromptReordered { session_id, .. }
            | Self::ConflictDetected { session_id, .. }
            | Self::ConflictResolved { session_id, .. }
            | Self::ConflictRejected { session_id, .. } => Some(*session_id),
            Self::PrOpened { session_id, .. }
            | Self::PrUpdated { session_id, .. }
            | Self::PrClosed { session_id, .. }
            | Self::PrMerged { session_id, .. }
            | Self::ThreadCreated { session_id, .. }
            | Self::ThreadUpdated { session_id, .. }
            | Self::ThreadCompleted { session_id, .. } => *session_id,
            Self::CommentCreated { .. }
            | Self::CommentUpdated { .. }
            | Self::ReviewSubmitted { .. }
            | Self::ResponsePosted { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_matches_the_spec_wire_name() {
        let event = ConclaveEvent::UserJoined {
            metadata: EventMetadata::now(),
            session_id: SessionId::new(),
            user: User {
                user_id: UserId::new(),
                name: "ana".to_string(),
                email: None,
                avatar: None,
                color: "#000".to_string(),
                joined_at: Utc::now(),
                cursor: None,
            },
        };
        assert_eq!(event.event_type(), "user.joined");
        assert!(event.session_id().is_some());
    }

    #[test]
    fn integration_events_without_a_mapping_have_no_session() {
        let event = ConclaveEvent::CommentCreated {
            metadata: EventMetadata::now(),
            repo: "owner/repo".to_string(),
            pr_number: 1,
            comment: CommentRef::default(),
        };
        assert_eq!(event.session_id(), None);
    }

    #[test]
    fn serializes_with_tag_and_content() {
        let event = ConclaveEvent::SessionCreated {
            metadata: EventMetadata::now(),
            session_id: SessionId::new(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "SessionCreated");
        assert!(json["data"]["session_id"].is_string());
    }
}
