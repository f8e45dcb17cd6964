//! HTTP control surface (component H): request/response endpoints for
//! every session/prompt/membership operation not suited to the socket.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use conclave_conflict::{Outcome, StateDelta};
use conclave_core::{AgentStatus, Client, ClientId, ClientType, Cursor, GitSyncStatus, Priority, Prompt, PromptId, SessionId, User, UserId};
use conclave_session::SessionStore;
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::state::AppState;
use crate::view::SessionView;

#[derive(Debug, Deserialize)]
pub(crate) struct CreateSessionRequest {
    pub external_session_id: String,
}

pub(crate) async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionRequest>,
) -> Json<SessionView> {
    let session = state.sessions.create(body.external_session_id).await;
    Json(SessionView::from(&session))
}

pub(crate) async fn list_sessions(State(state): State<AppState>) -> ApiResult<Json<Vec<SessionView>>> {
    let mut sessions = Vec::new();
    for id in state.sessions.all() {
        if let Ok(session) = state.sessions.get(id).await {
            sessions.push(SessionView::from(&session));
        }
    }
    Ok(Json(sessions))
}

pub(crate) async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> ApiResult<Json<SessionView>> {
    let session = state.sessions.get(session_id).await?;
    Ok(Json(SessionView::from(&session)))
}

pub(crate) async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> ApiResult<()> {
    state.sessions.delete(session_id)?;
    Ok(())
}

#[derive(Debug, Deserialize)]
pub(crate) struct JoinRequest {
    pub user_id: UserId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

pub(crate) async fn join(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    Json(body): Json<JoinRequest>,
) -> ApiResult<Json<User>> {
    let user = state
        .sessions
        .join(session_id, body.user_id, body.name, body.email, body.avatar, body.color)
        .await?;
    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserRequest {
    pub user_id: UserId,
}

pub(crate) async fn leave(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    Json(body): Json<UserRequest>,
) -> ApiResult<()> {
    state.sessions.leave(session_id, body.user_id).await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConnectRequest {
    pub user_id: UserId,
    pub client_type: ClientType,
}

pub(crate) async fn connect_client(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    Json(body): Json<ConnectRequest>,
) -> ApiResult<Json<Client>> {
    let client = state.sessions.connect(session_id, body.user_id, body.client_type).await?;
    Ok(Json(client))
}

pub(crate) async fn disconnect_client(
    State(state): State<AppState>,
    Path((session_id, client_id)): Path<(SessionId, ClientId)>,
) -> ApiResult<()> {
    state.sessions.disconnect(session_id, client_id).await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
pub(crate) struct CursorRequest {
    pub user_id: UserId,
    pub cursor: Cursor,
}

pub(crate) async fn update_cursor(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    Json(body): Json<CursorRequest>,
) -> ApiResult<()> {
    state.sessions.update_cursor(session_id, body.user_id, body.cursor).await?;
    Ok(())
}

#[derive(Debug, Serialize)]
pub(crate) struct LockResponse {
    pub acquired: bool,
}

pub(crate) async fn acquire_lock(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    Json(body): Json<UserRequest>,
) -> ApiResult<Json<LockResponse>> {
    let acquired = state.sessions.acquire_lock(session_id, body.user_id).await?;
    Ok(Json(LockResponse { acquired }))
}

pub(crate) async fn release_lock(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    Json(body): Json<UserRequest>,
) -> ApiResult<()> {
    state.sessions.release_lock(session_id, body.user_id).await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateStateRequest {
    pub base_version: u64,
    #[serde(default)]
    pub edit_lock: Option<Option<UserId>>,
    #[serde(default)]
    pub git_sync_status: Option<GitSyncStatus>,
    #[serde(default)]
    pub agent_status: Option<AgentStatus>,
}

impl From<UpdateStateRequest> for StateDelta {
    fn from(req: UpdateStateRequest) -> Self {
        Self {
            edit_lock: req.edit_lock,
            git_sync_status: req.git_sync_status,
            agent_status: req.agent_status,
        }
    }
}

/// `POST`/`PUT /multiplayer/:id/state` — always returns 200 with the
/// resolver's [`Outcome`]; a `Rejected` outcome is not an HTTP error, it's
/// the documented conflict-resolution result (callers inspect the body).
pub(crate) async fn update_state(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    Json(body): Json<UpdateStateRequest>,
) -> ApiResult<Json<Outcome>> {
    let base_version = body.base_version;
    let outcome = state
        .sessions
        .update_state(session_id, base_version, body.into())
        .await?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnqueueRequest {
    pub user_id: UserId,
    pub content: String,
    #[serde(default)]
    pub priority: Priority,
}

pub(crate) async fn enqueue_prompt(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    Json(body): Json<EnqueueRequest>,
) -> ApiResult<Json<Prompt>> {
    let prompt = state
        .sessions
        .enqueue(session_id, body.user_id, body.content, body.priority)
        .await?;
    Ok(Json(prompt))
}

pub(crate) async fn list_queue(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> ApiResult<Json<Vec<Prompt>>> {
    let session = state.sessions.get(session_id).await?;
    Ok(Json(session.prompt_queue().to_vec()))
}

pub(crate) async fn cancel_prompt(
    State(state): State<AppState>,
    Path((session_id, prompt_id)): Path<(SessionId, PromptId)>,
    Json(body): Json<UserRequest>,
) -> ApiResult<()> {
    state.sessions.cancel(session_id, prompt_id, body.user_id).await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReorderRequest {
    pub user_id: UserId,
    pub new_index: usize,
}

pub(crate) async fn reorder_prompt(
    State(state): State<AppState>,
    Path((session_id, prompt_id)): Path<(SessionId, PromptId)>,
    Json(body): Json<ReorderRequest>,
) -> ApiResult<()> {
    state
        .sessions
        .reorder(session_id, prompt_id, body.user_id, body.new_index)
        .await?;
    Ok(())
}

/// Promote the next queued prompt to executing. Not in the representative
/// route table (it's normally triggered by agent dispatch completing the
/// previous turn), but exposed for administrative/manual use.
pub(crate) async fn start_next(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> ApiResult<Json<Option<Prompt>>> {
    let prompt = state.sessions.start_next(session_id).await?;
    Ok(Json(prompt))
}

/// Mark the currently executing prompt complete.
pub(crate) async fn complete_prompt(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> ApiResult<Json<Option<Prompt>>> {
    let prompt = state.sessions.complete(session_id).await?;
    Ok(Json(prompt))
}

/// Shared by tests in sibling modules that need a bare `SessionStore`.
#[cfg(test)]
pub(crate) fn test_store() -> Arc<SessionStore> {
    Arc::new(SessionStore::new(
        conclave_events::EventBus::new(),
        conclave_session::SessionStoreConfig::default(),
    ))
}
