//! Chat classifier proxy endpoint
//!
//! Endpoints:
//! - GET/POST /OpenAI
//!
//! Forwards the caller's message to the chat-completions deployment with
//! the fixed scoring rubric and returns the completion envelope as-is.
//! Configuration is read from the environment on every call; score
//! ranges in the model output are not validated here.

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::error;

use super::ApiState;
use crate::llm::{self, LlmConfig};

pub fn routes() -> Router<ApiState> {
    Router::new().route("/OpenAI", get(chat_classify).post(chat_classify))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize, Default)]
pub struct MessageParams {
    #[serde(default)]
    pub message: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

async fn chat_classify(
    State(state): State<ApiState>,
    Query(query): Query<MessageParams>,
    body: Option<Json<MessageParams>>,
) -> Result<Response, (StatusCode, String)> {
    let config = LlmConfig::from_env().map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let message = query
        .message
        .or(body.and_then(|Json(b)| b.message))
        .unwrap_or_default();
    if message.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Please provide a 'message' parameter.".to_string(),
        ));
    }

    let completion = llm::classify(&state.http, &config, &message)
        .await
        .map_err(|e| {
            error!("Chat classification failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An error occurred while processing your request.".to_string(),
            )
        })?;

    Ok(([(header::CONTENT_TYPE, "application/json")], completion).into_response())
}
