//! Key and extra-data types for each integration's mapping store.

use conclave_mapping::{ExternalKey, MappingExtra};
use serde::{Deserialize, Serialize};

/// External key for a source-control pull request: `(repo, pr_number)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrKey {
    /// `owner/repo`.
    pub repo: String,
    /// Pull request number.
    pub pr_number: u64,
}

impl ExternalKey for PrKey {
    fn scope(&self) -> String {
        self.repo.clone()
    }
}

/// Comment context: where a review comment is anchored, if at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentContext {
    /// File path, for inline comments.
    pub path: Option<String>,
    /// Line number, for inline comments.
    pub line: Option<u32>,
}

/// PR mappings carry no extra status beyond the comment-context table, so
/// this is a unit extra.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrExtra;

impl MappingExtra for PrExtra {}

/// External key for a chat thread: `(channel_id, thread_ts)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatKey {
    /// Chat channel identifier.
    pub channel_id: String,
    /// Platform-assigned thread timestamp/identifier.
    pub thread_ts: String,
}

impl ExternalKey for ChatKey {
    fn scope(&self) -> String {
        self.channel_id.clone()
    }
}

/// Lifecycle status of a chat thread mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadStatus {
    /// Accepting new messages.
    #[default]
    Active,
    /// The agent is currently working the thread.
    Processing,
    /// Waiting on external input.
    Waiting,
    /// Terminal: done.
    Completed,
    /// Terminal: failed.
    Error,
}

/// Extra data carried by a chat thread mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatExtra {
    /// Current thread status.
    pub status: ThreadStatus,
}

impl MappingExtra for ChatExtra {
    fn protected_from_idle_eviction(&self) -> bool {
        self.status == ThreadStatus::Processing
    }
}

/// Outcome of [`crate::PullRequestAdapter::handle`] or
/// [`crate::ChatAdapter::handle`].
#[derive(Debug, Clone, PartialEq)]
pub struct HandleOutcome {
    /// Whether this event type/payload was recognized and processed.
    pub handled: bool,
    /// The event to publish to the bus, if any.
    pub event: Option<conclave_events::ConclaveEvent>,
    /// An explanatory error, set only when `handled` is `false`.
    pub error: Option<String>,
}

impl HandleOutcome {
    pub(crate) fn ok(event: conclave_events::ConclaveEvent) -> Self {
        Self {
            handled: true,
            event: Some(event),
            error: None,
        }
    }

    pub(crate) fn ignored() -> Self {
        Self {
            handled: true,
            event: None,
            error: None,
        }
    }

    pub(crate) fn unhandled(error: impl Into<String>) -> Self {
        Self {
            handled: false,
            event: None,
            error: Some(error.into()),
        }
    }
}
