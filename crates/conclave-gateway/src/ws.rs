//! WebSocket gateway (component G): per-connection upgrade, snapshot,
//! event forwarding, and inbound command dispatch.

use std::str::FromStr;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::response::Response;
use conclave_core::{ClientType, SessionId, UserId};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{instrument, trace, warn};

use crate::error::ApiError;
use crate::frames::{event_frame, ClientFrame, ServerFrame};
use crate::state::AppState;
use crate::view::SessionView;

/// Close code for policy-violation rejections (session/user/client
/// problems), per the specification's WebSocket protocol.
const POLICY_VIOLATION: u16 = 1008;

#[derive(Debug, Deserialize)]
pub(crate) struct ConnectQuery {
    #[serde(alias = "userID")]
    user_id: String,
    #[serde(alias = "clientType", default)]
    client_type: Option<ClientType>,
}

/// `GET /multiplayer/:id/ws` — upgrade to a WebSocket connection.
pub(crate) async fn upgrade(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    Query(query): Query<ConnectQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_connection(socket, state, session_id, query))
}

async fn send_frame(socket: &mut WebSocket, frame: &ServerFrame) {
    let Ok(text) = serde_json::to_string(frame) else {
        // All outbound JSON serialization failures are swallowed.
        return;
    };
    let _ = socket.send(Message::Text(text.into())).await;
}

async fn reject(mut socket: WebSocket, message: impl Into<String>, code: &'static str) {
    send_frame(
        &mut socket,
        &ServerFrame::Error {
            message: message.into(),
            code,
        },
    )
    .await;
    let _ = socket
        .send(Message::Close(Some(axum::extract::ws::CloseFrame {
            code: POLICY_VIOLATION,
            reason: code.into(),
        })))
        .await;
}

#[instrument(skip(socket, state, query))]
async fn handle_connection(socket: WebSocket, state: AppState, session_id: SessionId, query: ConnectQuery) {
    let Ok(user_id) = UserId::from_str(&query.user_id) else {
        reject(socket, "malformed userID", "PARSE_ERROR").await;
        return;
    };

    let session = match state.sessions.get(session_id).await {
        Ok(session) => session,
        Err(err) => {
            reject(socket, err.to_string(), ApiError::from(err).code()).await;
            return;
        }
    };
    if session.user(user_id).is_none() {
        reject(socket, "user is not a member of this session", "USER_NOT_IN_SESSION").await;
        return;
    }

    let client_type = query.client_type.unwrap_or(ClientType::Web);
    let client = match state.sessions.connect(session_id, user_id, client_type).await {
        Ok(client) => client,
        Err(err) => {
            reject(socket, err.to_string(), ApiError::from(err).code()).await;
            return;
        }
    };

    run_connection(socket, state, session_id, user_id, client.client_id).await;
}

async fn run_connection(
    mut socket: WebSocket,
    state: AppState,
    session_id: SessionId,
    user_id: UserId,
    client_id: conclave_core::ClientId,
) {
    let snapshot = state
        .sessions
        .get(session_id)
        .await
        .map(|s| SessionView::from(&s))
        .ok();
    if let Some(session) = snapshot {
        send_frame(&mut socket, &ServerFrame::SessionSnapshot { session }).await;
    }

    let mut events = state.bus.subscribe();
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                if event.session_id() != Some(session_id) {
                    continue;
                }
                let Ok(text) = serde_json::to_string(&event_frame(&event)) else { continue };
                if sink.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = dispatch(&state, session_id, user_id, &text).await {
                            let Ok(text) = serde_json::to_string(&reply) else { continue };
                            if sink.send(Message::Text(text.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => {
                        trace!(error = %err, "websocket receive error");
                        break;
                    }
                }
            }
        }
    }

    if let Err(err) = state.sessions.disconnect(session_id, client_id).await {
        warn!(error = %err, "failed to disconnect client on socket close");
    }
}

/// Dispatch one inbound frame, returning a direct reply if one is due
/// (`pong`, or an `error` on a failed `lock.acquire`). Other successful
/// commands rely entirely on the event-bus echo to inform the caller.
async fn dispatch(state: &AppState, session_id: SessionId, user_id: UserId, text: &str) -> Option<ServerFrame> {
    let frame: ClientFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(_) => {
            return Some(ServerFrame::Error {
                message: "could not parse inbound frame".to_string(),
                code: "PARSE_ERROR",
            })
        }
    };

    match frame {
        ClientFrame::Ping => Some(ServerFrame::Pong),
        ClientFrame::CursorUpdate { cursor } => {
            if let Err(err) = state.sessions.update_cursor(session_id, user_id, cursor).await {
                return Some(ServerFrame::Error {
                    message: err.to_string(),
                    code: ApiError::from(err).code(),
                });
            }
            None
        }
        ClientFrame::LockAcquire => match state.sessions.acquire_lock(session_id, user_id).await {
            Ok(_) => None,
            Err(err) => {
                let code = ApiError::from(err.clone()).code();
                Some(ServerFrame::Error {
                    message: err.to_string(),
                    code,
                })
            }
        },
        ClientFrame::LockRelease => {
            if let Err(err) = state.sessions.release_lock(session_id, user_id).await {
                return Some(ServerFrame::Error {
                    message: err.to_string(),
                    code: ApiError::from(err).code(),
                });
            }
            None
        }
    }
}
