//! Liveness endpoint.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// `GET /healthz` — liveness only; does not verify storage or outbound
/// connectivity.
pub(crate) async fn healthz(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "live_sessions": state.sessions.all().len(),
    }))
}
