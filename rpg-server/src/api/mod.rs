//! HTTP/JSON API Layer
//!
//! Serves the game client's backend calls as JSON-over-HTTP.
//!
//! ## Architecture
//! ```text
//! Game Client (UI scenes, JSON bodies)
//!       ↓ HTTP GET/POST
//! Axum Router (port 7070)
//!       ↓
//! Endpoint Handlers (account, player, events, chat)
//!       ↓
//! SqliteStore / chat-completions deployment
//! ```
//!
//! ## Endpoint Convention
//! Paths keep the upper-case operation names the client already calls:
//! `POST /LOGIN`, `GET /SELECTEVENTS?eventId=1`, `POST /UPDATE`, ...
//!
//! Handlers return `Result<_, (StatusCode, String)>`: the `Err` side
//! carries validation text (400), missing rows (404), duplicates (409)
//! or a generic per-operation failure message (500). Store and upstream
//! details are logged, never returned to the client.

pub mod account;
pub mod chat;
pub mod events;
pub mod player;

use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::storage::sqlite::{SqliteStore, StoreError};

/// Shared state available to all API handlers
#[derive(Clone)]
pub struct ApiState {
    pub store: SqliteStore,
    /// Shared HTTP client for the chat classifier proxy
    pub http: reqwest::Client,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the full API router with all endpoints
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(account::routes())
        .merge(player::routes())
        .merge(events::routes())
        .merge(chat::routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Start the HTTP API server on the given address
pub async fn start_api_server(
    store: SqliteStore,
    bind_addr: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let state = ApiState {
        store,
        http: reqwest::Client::new(),
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("API server listening on {}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Map a storage failure onto the response taxonomy.
///
/// Duplicate keys and missing rows keep a user-facing message; everything
/// else is logged and collapsed into the operation's generic message.
pub(crate) fn store_error(e: StoreError, generic: &str) -> (StatusCode, String) {
    match e {
        StoreError::DuplicateUser(_) => (
            StatusCode::CONFLICT,
            "このUserIdは既に登録されています。".to_string(),
        ),
        StoreError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            "PlayerData が見つかりません。".to_string(),
        ),
        other => {
            tracing::error!("Storage error: {}", other);
            (StatusCode::INTERNAL_SERVER_ERROR, generic.to_string())
        }
    }
}
