//! Dialogue script endpoint
//!
//! Endpoints:
//! - GET /SELECTEVENTS?eventId=N

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use rpg_core::DialogueLine;

use super::{store_error, ApiState};

pub fn routes() -> Router<ApiState> {
    Router::new().route("/SELECTEVENTS", get(select_events))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct EventQuery {
    #[serde(rename = "eventId", default)]
    pub event_id: Option<String>,
}

#[derive(Serialize)]
pub struct EventLineRecord {
    #[serde(rename = "EventId")]
    pub event_id: i64,
    #[serde(rename = "Seq")]
    pub seq: i64,
    #[serde(rename = "Speaker")]
    pub speaker: String,
    #[serde(rename = "Text")]
    pub text: String,
}

impl From<DialogueLine> for EventLineRecord {
    fn from(line: DialogueLine) -> Self {
        Self {
            event_id: line.event_id,
            seq: line.seq,
            speaker: line.speaker,
            text: line.text,
        }
    }
}

#[derive(Serialize)]
pub struct EventLinesResponse {
    #[serde(rename = "EventLines")]
    pub event_lines: Vec<EventLineRecord>,
}

// ============================================================================
// Handlers
// ============================================================================

async fn select_events(
    State(state): State<ApiState>,
    Query(query): Query<EventQuery>,
) -> Result<Json<EventLinesResponse>, (StatusCode, String)> {
    // Missing and non-numeric share the one rejection path
    let event_id: i64 = query
        .event_id
        .as_deref()
        .unwrap_or("")
        .trim()
        .parse()
        .map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                "eventId パラメータが必要です。".to_string(),
            )
        })?;

    let lines = state
        .store
        .fetch_event_lines(event_id)
        .await
        .map_err(|e| store_error(e, "SQLエラーが発生しました"))?;

    // Unknown event is an empty list, not a 404
    Ok(Json(EventLinesResponse {
        event_lines: lines.into_iter().map(EventLineRecord::from).collect(),
    }))
}
