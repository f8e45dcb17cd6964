//! Plain data types shared by the event bus, session store, and gateway.
//!
//! These carry no behavior beyond small constructors and helpers — the
//! mutators that enforce invariants over them live in `conclave-session`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ClientId, PromptId, UserId};

/// 8-entry palette assigned to joiners who didn't supply their own color.
pub const COLOR_PALETTE: [&str; 8] = [
    "#e06c75", "#61afef", "#98c379", "#e5c07b", "#c678dd", "#56b6c2", "#d19a66", "#abb2bf",
];

/// A collaborator in a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier for this user within the session.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Optional email address.
    pub email: Option<String>,
    /// Optional avatar URL.
    pub avatar: Option<String>,
    /// Presence color, assigned from [`COLOR_PALETTE`] if not supplied.
    pub color: String,
    /// When the user joined.
    pub joined_at: DateTime<Utc>,
    /// Current cursor position, if known.
    pub cursor: Option<Cursor>,
}

/// A cursor position within a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// File path the cursor is in.
    pub file: Option<String>,
    /// Line number (0-indexed), if known.
    pub line: Option<u32>,
    /// Column number (0-indexed), if known.
    pub column: Option<u32>,
}

/// The kind of UI instance a client connection represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    /// Web browser client.
    Web,
    /// Chat-platform client (messages relayed through a bot).
    Chat,
    /// Browser extension client.
    Extension,
    /// Mobile app client.
    Mobile,
    /// Voice client.
    Voice,
}

/// One connected UI instance belonging to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    /// Unique identifier for this connection.
    pub client_id: ClientId,
    /// The user this client belongs to.
    pub user_id: UserId,
    /// Kind of client.
    #[serde(rename = "type")]
    pub client_type: ClientType,
    /// When the client connected.
    pub connected_at: DateTime<Utc>,
    /// Last time this client sent or received activity.
    pub last_activity: DateTime<Utc>,
}

/// Source-control sync status for a session's workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GitSyncStatus {
    /// Not yet synced.
    #[default]
    Pending,
    /// Currently syncing.
    Syncing,
    /// Successfully synced.
    Synced,
    /// Last sync attempt failed.
    Failed,
}

/// Agent execution status for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// No prompt is executing or queued for immediate execution.
    #[default]
    Idle,
    /// The agent is reasoning before acting.
    Thinking,
    /// A prompt is currently executing.
    Executing,
    /// The agent is waiting on external input (e.g. an approval).
    Waiting,
}

/// The versioned value the conflict resolver operates on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// The user currently holding the exclusive edit lock, if any.
    pub edit_lock: Option<UserId>,
    /// Source-control sync status.
    pub git_sync_status: GitSyncStatus,
    /// Agent execution status.
    pub agent_status: AgentStatus,
    /// Monotonically increasing version, starting at 0.
    pub version: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            edit_lock: None,
            git_sync_status: GitSyncStatus::default(),
            agent_status: AgentStatus::default(),
            version: 0,
        }
    }
}

/// Priority class for a queued prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Default priority.
    #[default]
    Normal,
    /// Above normal.
    High,
    /// Jumps ahead of `High` and `Normal`.
    Urgent,
}

impl Priority {
    /// Rank used for ordering: lower sorts first (urgent=0, high=1, normal=2).
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::Urgent => 0,
            Self::High => 1,
            Self::Normal => 2,
        }
    }
}

/// A user request awaiting (or undergoing) agent execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    /// Unique identifier.
    pub prompt_id: PromptId,
    /// The user who submitted this prompt.
    pub user_id: UserId,
    /// Prompt text.
    pub content: String,
    /// When the prompt was enqueued.
    pub queued_at: DateTime<Utc>,
    /// When the prompt began executing, if it has.
    pub started_at: Option<DateTime<Utc>>,
    /// When the prompt completed, if it has.
    pub completed_at: Option<DateTime<Utc>>,
    /// Priority class.
    pub priority: Priority,
}

impl Prompt {
    /// Create a new queued prompt.
    #[must_use]
    pub fn new(user_id: UserId, content: impl Into<String>, priority: Priority) -> Self {
        Self {
            prompt_id: PromptId::new(),
            user_id,
            content: content.into(),
            queued_at: Utc::now(),
            started_at: None,
            completed_at: None,
            priority,
        }
    }
}
