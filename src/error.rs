use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

/// Errors produced anywhere along the relay path.
///
/// Every failure a request can hit maps onto one of these variants, and the
/// variant decides both the HTTP status and how much detail leaves the
/// process. Upstream detail (status codes, provider error bodies) is logged
/// but never echoed to the client.
#[derive(Debug)]
pub enum RelayError {
    /// The inbound request is unusable (empty prompt, missing user key).
    BadRequest(String),
    /// The selected credential does not match the provider's key format.
    CredentialFormat(String),
    /// The provider rejected the request or went away mid-stream.
    Upstream {
        status: Option<u16>,
        detail: String,
    },
    /// The provider sent an event payload we could not decode.
    Parse(String),
    Internal(String),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match &self {
            RelayError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request_error", msg.clone())
            }
            RelayError::CredentialFormat(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request_error", msg.clone())
            }
            RelayError::Upstream { status, detail } => {
                warn!(upstream_status = ?status, detail = %truncate(detail), "upstream failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "upstream_error",
                    "The generation service is busy, please try again later.".to_string(),
                )
            }
            RelayError::Parse(msg) => {
                warn!(detail = %msg, "event stream parse failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "parse_error",
                    "The generation service returned an unreadable response.".to_string(),
                )
            }
            RelayError::Internal(msg) => {
                warn!(detail = %msg, "internal failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error.".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": message,
                "type": kind,
            }
        }));

        (status, body).into_response()
    }
}

impl std::fmt::Display for RelayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelayError::BadRequest(msg) => write!(f, "bad request: {}", msg),
            RelayError::CredentialFormat(msg) => write!(f, "credential format: {}", msg),
            RelayError::Upstream { status: Some(code), detail } => {
                write!(f, "upstream error (HTTP {}): {}", code, truncate(detail))
            }
            RelayError::Upstream { status: None, detail } => {
                write!(f, "upstream error: {}", truncate(detail))
            }
            RelayError::Parse(msg) => write!(f, "parse error: {}", msg),
            RelayError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for RelayError {}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RelayError::Upstream {
                status: None,
                detail: "request timed out before the backend responded".to_string(),
            }
        } else if err.is_connect() {
            RelayError::Upstream {
                status: None,
                detail: "unable to reach the backend service".to_string(),
            }
        } else {
            RelayError::Upstream {
                status: err.status().map(|s| s.as_u16()),
                detail: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::Parse(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for RelayError {
    fn from(err: std::io::Error) -> Self {
        RelayError::Internal(format!("I/O error: {}", err))
    }
}

/// Upstream bodies can be arbitrarily large; log a bounded prefix.
fn truncate(detail: &str) -> &str {
    let cap = 2048;
    match detail.char_indices().nth(cap) {
        Some((idx, _)) => &detail[..idx],
        None => detail,
    }
}
