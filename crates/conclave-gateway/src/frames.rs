//! The WebSocket JSON wire protocol: server→client and client→server frames.

use conclave_core::Cursor;
use conclave_events::ConclaveEvent;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::view::SessionView;

/// Messages the gateway sends to a connected client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerFrame {
    /// Sent once, immediately after a connection is registered.
    #[serde(rename = "session.snapshot")]
    SessionSnapshot {
        /// The session's current state.
        session: SessionView,
    },
    /// A single-frame error, sent before closing a rejected connection or
    /// in response to a failed inbound command.
    #[serde(rename = "error")]
    Error {
        /// Human-readable explanation.
        message: String,
        /// Stable machine-readable code (see [`crate::error::ApiError::code`]).
        code: &'static str,
    },
    /// Heartbeat reply to an inbound `ping`.
    #[serde(rename = "pong")]
    Pong,
}

/// Render a bus event as its wire frame: the event's dotted `event_type()`
/// as `type`, with the event's own fields spliced in (rather than the
/// derived enum-variant tag `ConclaveEvent`'s `Serialize` impl uses
/// internally, which is for storage, not the wire).
#[must_use]
pub fn event_frame(event: &ConclaveEvent) -> Value {
    let mut value = serde_json::to_value(event).unwrap_or(Value::Null);
    if let Value::Object(map) = &mut value {
        map.insert("type".to_string(), Value::String(event.event_type().to_string()));
    }
    value
}

/// Messages a connected client sends to the gateway.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ClientFrame {
    /// Move the sender's cursor.
    #[serde(rename = "cursor.update")]
    CursorUpdate {
        /// The new cursor position.
        cursor: Cursor,
    },
    /// Attempt to acquire the session's edit lock.
    #[serde(rename = "lock.acquire")]
    LockAcquire,
    /// Release the edit lock, if held by the sender.
    #[serde(rename = "lock.release")]
    LockRelease,
    /// Heartbeat; replied to with [`ServerFrame::Pong`].
    #[serde(rename = "ping")]
    Ping,
}

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_core::{SessionId, UserId};
    use conclave_events::EventMetadata;

    #[test]
    fn event_frame_uses_the_dotted_event_type_as_tag() {
        let event = ConclaveEvent::UserLeft {
            metadata: EventMetadata::now(),
            session_id: SessionId::new(),
            user_id: UserId::new(),
        };
        let frame = event_frame(&event);
        assert_eq!(frame["type"], "user.left");
    }

    #[test]
    fn client_frame_parses_cursor_update() {
        let json = r#"{"type":"cursor.update","cursor":{"file":"a.rs","line":1,"column":2}}"#;
        let frame: ClientFrame = serde_json::from_str(json).unwrap();
        assert!(matches!(frame, ClientFrame::CursorUpdate { .. }));
    }

    #[test]
    fn client_frame_parses_ping() {
        let frame: ClientFrame = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert!(matches!(frame, ClientFrame::Ping));
    }

    #[test]
    fn server_frame_error_serializes_with_code() {
        let frame = ServerFrame::Error {
            message: "nope".to_string(),
            code: "SESSION_NOT_FOUND",
        };
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["code"], "SESSION_NOT_FOUND");
    }
}
