//! Serializable snapshots of session-store state sent to clients.
//!
//! `Session` itself keeps its membership/connection maps private to the
//! store; `SessionView` is the read-only projection the WebSocket and HTTP
//! surfaces hand out, matching the specification's "external readers get
//! snapshots (copies)" policy.

use chrono::{DateTime, Utc};
use conclave_core::{Client, Prompt, SessionId, SessionState, User};
use conclave_session::Session;
use serde::Serialize;

/// A point-in-time copy of a session's externally visible state.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    /// Internal identifier.
    pub id: SessionId,
    /// Client-visible identifier.
    pub external_session_id: String,
    /// Execution-environment identifier, if assigned.
    pub sandbox_id: Option<String>,
    /// Current members.
    pub users: Vec<User>,
    /// Current connections.
    pub clients: Vec<Client>,
    /// Queued prompts, head first.
    pub prompt_queue: Vec<Prompt>,
    /// The currently executing prompt, if any.
    pub executing: Option<Prompt>,
    /// Versioned conflict-resolved state.
    pub state: SessionState,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id,
            external_session_id: session.external_session_id.clone(),
            sandbox_id: session.sandbox_id.clone(),
            users: session.users().into_iter().cloned().collect(),
            clients: session.clients().into_iter().cloned().collect(),
            prompt_queue: session.prompt_queue().to_vec(),
            executing: session.executing.clone(),
            state: session.state.clone(),
            created_at: session.created_at,
        }
    }
}

impl From<Session> for SessionView {
    fn from(session: Session) -> Self {
        Self::from(&session)
    }
}
