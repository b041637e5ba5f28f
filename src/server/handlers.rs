//! # Server Handlers
//!
//! HTTP route handlers. The generate handler is the relay's boundary: it
//! validates, selects a credential, dispatches upstream, and pipes the
//! transformed stream back as the response body. Headers go out before
//! generation completes; a failure after that point can only surface as an
//! abrupt close of the chunked body.

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json as JsonResponse, Response},
    Json,
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    error::RelayError,
    relay::RelayStream,
    schemas::{CompletionRequest, GenerateRequest},
    sse::EventStream,
};

use super::AppState;

/// Generate handler: validate, dispatch, stream.
pub async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Response, RelayError> {
    let notes = req.prompt.trim();
    if notes.is_empty() {
        return Err(RelayError::BadRequest(
            "No prompt in the request.".to_string(),
        ));
    }

    // Both validation steps happen before any outbound call.
    let credential = state.keys().select(req.api_key.as_deref())?;

    let config = state.config();
    let payload = CompletionRequest {
        model: config.model.clone(),
        messages: state.prompt().build(notes),
        temperature: config.temperature,
        top_p: config.top_p,
        frequency_penalty: config.frequency_penalty,
        presence_penalty: config.presence_penalty,
        max_tokens: config.max_tokens,
        stream: true,
        n: config.sample_count,
    };

    let request_id = Uuid::new_v4();
    debug!(%request_id, model = %payload.model, "dispatching completion request");

    let bytes = state.upstream().open_stream(&payload, &credential).await?;
    let deltas = RelayStream::new(EventStream::new(bytes));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from_stream(deltas))
        .map_err(|err| RelayError::Internal(format!("failed to build response: {}", err)))
}

/// Health check handler
pub async fn health_check() -> impl IntoResponse {
    let health_status = serde_json::json!({
        "status": "healthy",
        "service": "report-relay",
        "version": env!("CARGO_PKG_VERSION")
    });

    (StatusCode::OK, JsonResponse(health_status))
}
