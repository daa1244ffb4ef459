//! Account endpoints - registration and login
//!
//! Endpoints:
//! - POST /INSERTUSER
//! - POST /LOGIN

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{store_error, ApiState};
use crate::auth;

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/INSERTUSER", post(insert_user))
        .route("/LOGIN", post(login))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct InsertUserRequest {
    #[serde(rename = "ID", default)]
    pub id: Option<String>,
    #[serde(rename = "Password", default)]
    pub password: Option<String>,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
}

#[derive(Serialize)]
pub struct InsertUserResponse {
    #[serde(rename = "Result")]
    pub result: &'static str,
    #[serde(rename = "Message")]
    pub message: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(rename = "ID", default)]
    pub id: Option<String>,
    #[serde(rename = "Password", default)]
    pub password: Option<String>,
}

/// Login response. Player fields are omitted when the account exists but
/// has no player row yet; the failure shape carries only Result/Message.
#[derive(Serialize)]
pub struct LoginResponse {
    #[serde(rename = "Result")]
    pub result: &'static str,
    #[serde(rename = "Message")]
    pub message: &'static str,
    #[serde(rename = "UserId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(rename = "UserName", skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(rename = "CharId", skip_serializing_if = "Option::is_none")]
    pub char_id: Option<i64>,
    #[serde(rename = "Exp", skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(rename = "Parameter1", skip_serializing_if = "Option::is_none")]
    pub parameter1: Option<i64>,
    #[serde(rename = "Parameter2", skip_serializing_if = "Option::is_none")]
    pub parameter2: Option<i64>,
    #[serde(rename = "Parameter3", skip_serializing_if = "Option::is_none")]
    pub parameter3: Option<i64>,
    #[serde(rename = "Parameter4", skip_serializing_if = "Option::is_none")]
    pub parameter4: Option<i64>,
    #[serde(rename = "CurrentEventId", skip_serializing_if = "Option::is_none")]
    pub current_event_id: Option<i64>,
    #[serde(rename = "CurrentSeq", skip_serializing_if = "Option::is_none")]
    pub current_seq: Option<i64>,
}

// ============================================================================
// Handlers
// ============================================================================

const MIN_PASSWORD_CHARS: usize = 8;

async fn insert_user(
    State(state): State<ApiState>,
    Json(req): Json<InsertUserRequest>,
) -> Result<Json<InsertUserResponse>, (StatusCode, String)> {
    let id = req.id.unwrap_or_default();
    let password = req.password.unwrap_or_default();
    let name = req.name.unwrap_or_default();

    if id.trim().is_empty() || password.trim().is_empty() || name.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "ID、パスワード、または表示名が設定されていません。".to_string(),
        ));
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err((
            StatusCode::BAD_REQUEST,
            "Password は8文字以上である必要があります。".to_string(),
        ));
    }

    let blob = auth::hash_password(&password);
    let inserted = state
        .store
        .create_account(&id, &name, &blob)
        .await
        .map_err(|e| store_error(e, "ユーザー登録エラーが発生しました。"))?;

    Ok(Json(InsertUserResponse {
        result: "Succeeded",
        message: format!("登録結果:{}件のユーザー情報を登録しました。", inserted),
    }))
}

async fn login(
    State(state): State<ApiState>,
    Json(req): Json<LoginRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), (StatusCode, String)> {
    let id = req.id.unwrap_or_default();
    let password = req.password.unwrap_or_default();

    if id.trim().is_empty() || password.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "IDまたはパスワードが未入力です。".to_string(),
        ));
    }

    let account = state
        .store
        .fetch_credential(&id)
        .await
        .map_err(|e| store_error(e, "LOGIN内部エラーが発生しました。"))?;

    // Unknown user and wrong password share one response shape
    let Some(account) = account else {
        info!("Login rejected (unknown user): {}", id);
        return Ok(auth_failed());
    };

    let verified = match auth::verify_password(&password, &account.password_hash) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!("Stored credential for {} is unreadable: {}", id, e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "LOGIN内部エラーが発生しました。".to_string(),
            ));
        }
    };
    if !verified {
        info!("Login rejected (bad password): {}", id);
        return Ok(auth_failed());
    }

    let player = state
        .store
        .fetch_player(&id)
        .await
        .map_err(|e| store_error(e, "LOGIN内部エラーが発生しました。"))?;

    info!("Login succeeded: {}", id);
    match player {
        Some(p) => Ok((
            StatusCode::OK,
            Json(LoginResponse {
                result: "Succeeded",
                message: "認証に成功しました",
                user_id: Some(p.user_id),
                user_name: Some(account.user_name),
                char_id: Some(p.class.code()),
                exp: Some(p.exp),
                parameter1: Some(p.parameter1),
                parameter2: Some(p.parameter2),
                parameter3: Some(p.parameter3),
                parameter4: Some(p.parameter4),
                current_event_id: Some(p.current_event_id),
                current_seq: Some(p.current_seq),
            }),
        )),
        None => Ok((
            StatusCode::OK,
            Json(LoginResponse {
                result: "Succeeded",
                message: "認証に成功しました（プレイヤーデータ未登録）",
                user_id: Some(id),
                user_name: Some(account.user_name),
                char_id: None,
                exp: None,
                parameter1: None,
                parameter2: None,
                parameter3: None,
                parameter4: None,
                current_event_id: None,
                current_seq: None,
            }),
        )),
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn auth_failed() -> (StatusCode, Json<LoginResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(LoginResponse {
            result: "Failed",
            message: "認証失敗（IDまたはパスワードが一致しません）",
            user_id: None,
            user_name: None,
            char_id: None,
            exp: None,
            parameter1: None,
            parameter2: None,
            parameter3: None,
            parameter4: None,
            current_event_id: None,
            current_seq: None,
        }),
    )
}
