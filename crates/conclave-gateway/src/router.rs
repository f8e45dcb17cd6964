//! Assembles the axum [`Router`] serving the WebSocket gateway, the HTTP
//! control surface, and the inbound webhook receivers.

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::health::healthz;
use crate::state::AppState;
use crate::{control, webhook, ws};

/// Build the full router for the given state.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/multiplayer", post(control::create_session).get(control::list_sessions))
        .route(
            "/multiplayer/{id}",
            get(control::get_session).delete(control::delete_session),
        )
        .route("/multiplayer/{id}/join", post(control::join))
        .route("/multiplayer/{id}/leave", post(control::leave))
        .route(
            "/multiplayer/{id}/clients",
            post(control::connect_client),
        )
        .route("/multiplayer/{id}/clients/{client_id}", delete(control::disconnect_client))
        .route("/multiplayer/{id}/cursor", put(control::update_cursor))
        .route(
            "/multiplayer/{id}/lock",
            post(control::acquire_lock).delete(control::release_lock),
        )
        .route(
            "/multiplayer/{id}/state",
            post(control::update_state).put(control::update_state),
        )
        .route(
            "/multiplayer/{id}/prompt",
            post(control::enqueue_prompt).get(control::list_queue),
        )
        .route(
            "/multiplayer/{id}/prompt/{prompt_id}",
            delete(control::cancel_prompt).put(control::reorder_prompt),
        )
        .route("/multiplayer/{id}/prompt/next", post(control::start_next))
        .route("/multiplayer/{id}/prompt/complete", post(control::complete_prompt))
        .route("/multiplayer/{id}/ws", get(ws::upgrade))
        .route("/webhook/source-control", post(webhook::source_control))
        .route("/webhook/chat/events", post(webhook::chat_events))
        .route("/webhook/chat/interactions", post(webhook::chat_interactions))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
