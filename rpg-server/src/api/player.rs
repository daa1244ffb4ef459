//! Player data endpoints - creation, lookup and partial update
//!
//! Endpoints:
//! - POST /INSERTPLAYER
//! - GET/POST /SELECTPLAYER
//! - GET /SELECTALLPLAYER
//! - GET/POST /UPDATE
//!
//! /SELECTPLAYER and /UPDATE accept their parameters from the query
//! string or a JSON body; a query value wins over the body value for
//! the same field.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use rpg_core::constants::{PARAM_MAX, PARAM_MIN};
use rpg_core::{CharacterClass, PlayerProgress};

use super::{store_error, ApiState};
use crate::storage::sqlite::PlayerUpdate;

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/INSERTPLAYER", post(insert_player))
        .route("/SELECTPLAYER", get(select_player).post(select_player))
        .route("/SELECTALLPLAYER", get(select_all_players))
        .route("/UPDATE", get(update_player).post(update_player))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize, Default)]
pub struct UserIdParams {
    #[serde(rename = "UserId", default)]
    pub user_id: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct UpdateParams {
    #[serde(rename = "UserId", default)]
    pub user_id: Option<String>,
    #[serde(rename = "CharId", default)]
    pub char_id: Option<i64>,
    #[serde(rename = "Exp", default)]
    pub exp: Option<i64>,
    #[serde(rename = "Parameter1", default)]
    pub parameter1: Option<i64>,
    #[serde(rename = "Parameter2", default)]
    pub parameter2: Option<i64>,
    #[serde(rename = "Parameter3", default)]
    pub parameter3: Option<i64>,
    #[serde(rename = "Parameter4", default)]
    pub parameter4: Option<i64>,
    #[serde(rename = "CurrentEventId", default)]
    pub current_event_id: Option<i64>,
    #[serde(rename = "CurrentSeq", default)]
    pub current_seq: Option<i64>,
}

/// One player row on the wire
#[derive(Serialize)]
pub struct PlayerRecord {
    #[serde(rename = "UserId")]
    pub user_id: String,
    #[serde(rename = "CharId")]
    pub char_id: i64,
    #[serde(rename = "Exp")]
    pub exp: i64,
    #[serde(rename = "Parameter1")]
    pub parameter1: i64,
    #[serde(rename = "Parameter2")]
    pub parameter2: i64,
    #[serde(rename = "Parameter3")]
    pub parameter3: i64,
    #[serde(rename = "Parameter4")]
    pub parameter4: i64,
    #[serde(rename = "CurrentEventId")]
    pub current_event_id: i64,
    #[serde(rename = "CurrentSeq")]
    pub current_seq: i64,
}

impl From<PlayerProgress> for PlayerRecord {
    fn from(p: PlayerProgress) -> Self {
        Self {
            user_id: p.user_id,
            char_id: p.class.code(),
            exp: p.exp,
            parameter1: p.parameter1,
            parameter2: p.parameter2,
            parameter3: p.parameter3,
            parameter4: p.parameter4,
            current_event_id: p.current_event_id,
            current_seq: p.current_seq,
        }
    }
}

#[derive(Serialize)]
pub struct PlayerListResponse {
    #[serde(rename = "List")]
    pub list: Vec<PlayerRecord>,
}

/// Row-count message under the lowercase `result` key
#[derive(Serialize)]
pub struct RowCountResponse {
    pub result: String,
}

// ============================================================================
// Handlers
// ============================================================================

async fn insert_player(
    State(state): State<ApiState>,
    Json(req): Json<UserIdParams>,
) -> Result<Json<RowCountResponse>, (StatusCode, String)> {
    let user_id = req.user_id.unwrap_or_default();
    if user_id.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "UserId が設定されていません。".to_string(),
        ));
    }

    let inserted = state
        .store
        .create_player(&user_id)
        .await
        .map_err(|e| store_error(e, "PlayerData 登録エラーが発生しました。"))?;

    Ok(Json(RowCountResponse {
        result: format!("{}件のプレイヤーデータを登録しました。", inserted),
    }))
}

async fn select_player(
    State(state): State<ApiState>,
    Query(query): Query<UserIdParams>,
    body: Option<Json<UserIdParams>>,
) -> Result<Json<PlayerListResponse>, (StatusCode, String)> {
    let user_id = query
        .user_id
        .or(body.and_then(|Json(b)| b.user_id))
        .unwrap_or_default();
    if user_id.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "UserId パラメータが必要です。".to_string(),
        ));
    }

    let player = state
        .store
        .fetch_player(&user_id)
        .await
        .map_err(|e| store_error(e, "PlayerData 取得エラーが発生しました。"))?;

    // Unknown user is an empty list, not a 404
    Ok(Json(PlayerListResponse {
        list: player.into_iter().map(PlayerRecord::from).collect(),
    }))
}

async fn select_all_players(
    State(state): State<ApiState>,
) -> Result<Json<PlayerListResponse>, (StatusCode, String)> {
    let players = state
        .store
        .fetch_all_players()
        .await
        .map_err(|e| store_error(e, "PlayerData 取得エラーが発生しました。"))?;

    Ok(Json(PlayerListResponse {
        list: players.into_iter().map(PlayerRecord::from).collect(),
    }))
}

async fn update_player(
    State(state): State<ApiState>,
    Query(query): Query<UpdateParams>,
    body: Option<Json<UpdateParams>>,
) -> Result<Json<RowCountResponse>, (StatusCode, String)> {
    let params = merge_params(query, body.map(|Json(b)| b));

    let user_id = params.user_id.unwrap_or_default();
    if user_id.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "UserId が設定されていません。".to_string(),
        ));
    }

    if let Some(char_id) = params.char_id {
        if CharacterClass::from_code(char_id).is_none() {
            return Err((
                StatusCode::BAD_REQUEST,
                "CharId must be one of 0, 10, 20, 30, 40".to_string(),
            ));
        }
    }
    check_param_range(params.parameter1, "Parameter1")?;
    check_param_range(params.parameter2, "Parameter2")?;
    check_param_range(params.parameter3, "Parameter3")?;
    check_param_range(params.parameter4, "Parameter4")?;

    let update = PlayerUpdate {
        char_id: params.char_id,
        exp: params.exp,
        parameter1: params.parameter1,
        parameter2: params.parameter2,
        parameter3: params.parameter3,
        parameter4: params.parameter4,
        current_event_id: params.current_event_id,
        current_seq: params.current_seq,
    };

    let updated = state
        .store
        .update_player(&user_id, &update)
        .await
        .map_err(|e| store_error(e, "PlayerData 更新エラーが発生しました。"))?;

    Ok(Json(RowCountResponse {
        result: format!("{}件のプレイヤーデータを更新しました。", updated),
    }))
}

// ============================================================================
// Helpers
// ============================================================================

fn merge_params(query: UpdateParams, body: Option<UpdateParams>) -> UpdateParams {
    let body = body.unwrap_or_default();
    UpdateParams {
        user_id: query.user_id.or(body.user_id),
        char_id: query.char_id.or(body.char_id),
        exp: query.exp.or(body.exp),
        parameter1: query.parameter1.or(body.parameter1),
        parameter2: query.parameter2.or(body.parameter2),
        parameter3: query.parameter3.or(body.parameter3),
        parameter4: query.parameter4.or(body.parameter4),
        current_event_id: query.current_event_id.or(body.current_event_id),
        current_seq: query.current_seq.or(body.current_seq),
    }
}

fn check_param_range(value: Option<i64>, name: &str) -> Result<(), (StatusCode, String)> {
    if let Some(v) = value {
        if !(PARAM_MIN..=PARAM_MAX).contains(&v) {
            return Err((
                StatusCode::BAD_REQUEST,
                format!("{} must be between {} and {}", name, PARAM_MIN, PARAM_MAX),
            ));
        }
    }
    Ok(())
}
