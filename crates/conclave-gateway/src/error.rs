//! Error taxonomy → HTTP status / WebSocket error-code mapping.
//!
//! Every handler in this crate returns `Result<_, ApiError>`; [`ApiError`]
//! wraps whatever the core crates reported and renders it either as an
//! axum response or as a WebSocket `error` frame code, per the
//! specification's error handling section.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use conclave_session::SessionError;
use serde_json::json;

/// Errors surfaced by the gateway's HTTP and WebSocket handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A session-store mutator failed.
    #[error(transparent)]
    Session(#[from] SessionError),
    /// The request body or path was malformed.
    #[error("{0}")]
    Invalid(String),
    /// A webhook's signature failed verification.
    #[error("signature verification failed")]
    BadSignature,
}

impl ApiError {
    /// HTTP status this error renders as, per the specification's
    /// NotFound→404 / Forbidden→403 / Conflict→409 / CapacityExceeded→400 /
    /// Invalid→400/401 taxonomy.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Session(err) => session_error_status(err),
            Self::Invalid(_) => StatusCode::BAD_REQUEST,
            Self::BadSignature => StatusCode::UNAUTHORIZED,
        }
    }

    /// Stable machine-readable code, used both in REST bodies and as the
    /// `code` field on WebSocket `error` frames. The WebSocket protocol
    /// names a closed set: `SESSION_NOT_FOUND`, `USER_NOT_IN_SESSION`,
    /// `CLIENT_LIMIT_REACHED`, `INVALID_MESSAGE`, `LOCK_HELD`,
    /// `PARSE_ERROR`; other codes only ever appear in REST bodies.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Session(err) => session_error_code(err),
            Self::Invalid(_) => "INVALID_MESSAGE",
            Self::BadSignature => "INVALID_SIGNATURE",
        }
    }
}

fn session_error_status(err: &SessionError) -> StatusCode {
    match err {
        SessionError::SessionNotFound(_)
        | SessionError::ClientNotFound(_)
        | SessionError::PromptNotFound(_) => StatusCode::NOT_FOUND,
        SessionError::UserNotInSession { .. }
        | SessionError::NotLockHolder { .. }
        | SessionError::NotPromptOwner { .. } => StatusCode::FORBIDDEN,
        SessionError::LockAlreadyHeld(_) | SessionError::FutureVersion { .. } => StatusCode::CONFLICT,
        SessionError::SessionFull(_) | SessionError::ClientLimitReached { .. } | SessionError::QueueFull(_) => {
            StatusCode::BAD_REQUEST
        }
        SessionError::PromptExecuting(_) => StatusCode::CONFLICT,
        SessionError::CrossPriorityReorder(_) => StatusCode::BAD_REQUEST,
    }
}

fn session_error_code(err: &SessionError) -> &'static str {
    match err {
        SessionError::SessionNotFound(_) => "SESSION_NOT_FOUND",
        SessionError::ClientNotFound(_) => "CLIENT_NOT_FOUND",
        SessionError::PromptNotFound(_) => "PROMPT_NOT_FOUND",
        SessionError::UserNotInSession { .. } => "USER_NOT_IN_SESSION",
        SessionError::NotLockHolder { .. } => "NOT_LOCK_HOLDER",
        SessionError::NotPromptOwner { .. } => "NOT_PROMPT_OWNER",
        SessionError::LockAlreadyHeld(_) => "LOCK_HELD",
        SessionError::FutureVersion { .. } => "CONFLICT",
        SessionError::SessionFull(_) => "SESSION_FULL",
        SessionError::ClientLimitReached { .. } => "CLIENT_LIMIT_REACHED",
        SessionError::QueueFull(_) => "QUEUE_FULL",
        SessionError::PromptExecuting(_) => "PROMPT_EXECUTING",
        SessionError::CrossPriorityReorder(_) => "CROSS_PRIORITY_REORDER",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Result alias for gateway handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_core::SessionId;

    #[test]
    fn lock_already_held_maps_to_conflict() {
        let err = ApiError::from(SessionError::LockAlreadyHeld(SessionId::new()));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "LOCK_HELD");
    }

    #[test]
    fn session_not_found_maps_to_404() {
        let err = ApiError::from(SessionError::SessionNotFound(SessionId::new()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "SESSION_NOT_FOUND");
    }

    #[test]
    fn bad_signature_is_unauthorized() {
        assert_eq!(ApiError::BadSignature.status(), StatusCode::UNAUTHORIZED);
    }
}
