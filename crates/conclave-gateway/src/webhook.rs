//! Inbound webhook HTTP surface: source-control and chat-platform
//! ingestion receivers, per the specification's exact contracts.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use conclave_adapters::verify_signature;
use serde_json::{json, Value};
use tracing::warn;

use crate::state::AppState;

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name)?.to_str().ok()
}

/// `POST /webhook/<source-control>` — requires `X-GitHub-Event`; body is
/// JSON; an optional `X-Hub-Signature-256: sha256=<hex>` is verified
/// against the configured secret. Invalid/missing event → 400; signature
/// mismatch → 401.
pub(crate) async fn source_control(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let Some(event_type) = header_str(&headers, "x-github-event") else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "missing X-GitHub-Event" })));
    };

    if let Some(signature) = header_str(&headers, "x-hub-signature-256") {
        if !verify_signature(&body, signature, &state.source_control_secret) {
            return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "signature verification failed" })));
        }
    }

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(_) => return (StatusCode::BAD_REQUEST, Json(json!({ "error": "malformed JSON body" }))),
    };

    let outcome = state.pull_requests.handle(event_type, &payload).await;
    if let Some(event) = &outcome.event {
        state.bus.publish(event.clone());
    }
    if !outcome.handled {
        warn!(event_type, error = ?outcome.error, "unhandled source-control webhook event");
    }
    (
        StatusCode::OK,
        Json(json!({ "handled": outcome.handled, "error": outcome.error })),
    )
}

/// `POST /webhook/<chat>/events` — URL-verification challenges are echoed
/// back; other payloads are translated and acknowledged.
pub(crate) async fn chat_events(State(state): State<AppState>, Json(body): Json<Value>) -> Json<Value> {
    if body.get("type").and_then(Value::as_str) == Some("url_verification") {
        let challenge = body.get("challenge").cloned().unwrap_or(Value::Null);
        return Json(json!({ "challenge": challenge }));
    }

    let Some(channel_id) = body.get("channel").and_then(Value::as_str) else {
        return Json(json!({ "ok": false, "error": "missing channel" }));
    };
    let Some(thread_ts) = body
        .get("thread_ts")
        .or_else(|| body.get("ts"))
        .and_then(Value::as_str)
    else {
        return Json(json!({ "ok": false, "error": "missing thread_ts" }));
    };

    let outcome = state.chat.handle_message(channel_id, thread_ts, &body).await;
    if let Some(event) = &outcome.event {
        state.bus.publish(event.clone());
    }
    Json(json!({ "ok": outcome.handled, "error": outcome.error }))
}

/// `POST /webhook/<chat>/interactions` — accepts either
/// `application/x-www-form-urlencoded` with a `payload` field containing
/// JSON, or raw JSON.
pub(crate) async fn chat_interactions(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let content_type = header_str(&headers, "content-type").unwrap_or_default();
    let payload: Value = if content_type.starts_with("application/x-www-form-urlencoded") {
        let form: Vec<(String, String)> = match serde_urlencoded::from_bytes(&body) {
            Ok(form) => form,
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "malformed form body" })),
                )
            }
        };
        let Some((_, raw)) = form.into_iter().find(|(k, _)| k == "payload") else {
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": "missing payload field" })));
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(_) => return (StatusCode::BAD_REQUEST, Json(json!({ "error": "malformed payload JSON" }))),
        }
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(_) => return (StatusCode::BAD_REQUEST, Json(json!({ "error": "malformed JSON body" }))),
        }
    };

    let channel_id = payload
        .get("channel")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let thread_ts = payload
        .get("thread_ts")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let outcome = state.chat.handle_message(&channel_id, &thread_ts, &payload).await;
    if let Some(event) = &outcome.event {
        state.bus.publish(event.clone());
    }
    (StatusCode::OK, Json(json!({ "ok": outcome.handled })))
}
