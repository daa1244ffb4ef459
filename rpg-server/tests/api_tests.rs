//! API Integration Tests
//!
//! Drives the full router against an in-memory SQLite store seeded with
//! the starter dialogue scripts. Requests go through `tower::oneshot`,
//! so every status code, message and JSON shape here is exactly what a
//! game client would see.

use axum::body::Body;
use http::Request;
use serde_json::Value;
use tower::ServiceExt;

use rpg_backend_server::api;
use rpg_backend_server::storage::seed_data;
use rpg_backend_server::SqliteStore;

/// Helper: in-memory store + seeded scripts + full router.
/// One pool connection so the in-memory database stays alive.
async fn create_test_router() -> axum::Router {
    let store = SqliteStore::new("sqlite::memory:", 1)
        .await
        .expect("Failed to init in-memory SQLite");
    seed_data::seed_all(&store)
        .await
        .expect("Failed to seed dialogue scripts");

    let state = api::ApiState {
        store,
        http: reqwest::Client::new(),
    };
    api::build_router(state)
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn read_json(resp: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn read_text(resp: axum::response::Response) -> String {
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

/// Helper: register the account and player row most tests need
async fn register_player(router: &axum::Router, user_id: &str) {
    let body = format!(
        r#"{{"ID": "{}", "Password": "password123", "Name": "テスト勇者"}}"#,
        user_id
    );
    let resp = router
        .clone()
        .oneshot(post_json("/INSERTUSER", &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body = format!(r#"{{"UserId": "{}"}}"#, user_id);
    let resp = router
        .clone()
        .oneshot(post_json("/INSERTPLAYER", &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

// ============================================================================
// Health Endpoint
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let router = create_test_router().await;

    let resp = router.oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), 200);

    let json = read_json(resp).await;
    assert_eq!(json["status"], "ok");
    assert!(!json["version"].as_str().unwrap().is_empty());
}

// ============================================================================
// Registration + Login
// ============================================================================

#[tokio::test]
async fn test_insert_user_then_login_without_player() {
    let router = create_test_router().await;

    let resp = router
        .clone()
        .oneshot(post_json(
            "/INSERTUSER",
            r#"{"ID": "P1", "Password": "password123", "Name": "テスト勇者"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json = read_json(resp).await;
    assert_eq!(json["Result"], "Succeeded");
    assert_eq!(json["Message"], "登録結果:1件のユーザー情報を登録しました。");

    // No player row yet: login succeeds without progression fields
    let resp = router
        .oneshot(post_json(
            "/LOGIN",
            r#"{"ID": "P1", "Password": "password123"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json = read_json(resp).await;
    assert_eq!(json["Result"], "Succeeded");
    assert_eq!(json["Message"], "認証に成功しました（プレイヤーデータ未登録）");
    assert_eq!(json["UserId"], "P1");
    assert_eq!(json["UserName"], "テスト勇者");
    assert!(json["CharId"].is_null());
    assert!(json["Exp"].is_null());
}

#[tokio::test]
async fn test_login_returns_player_record() {
    let router = create_test_router().await;
    register_player(&router, "P1").await;

    let resp = router
        .oneshot(post_json(
            "/LOGIN",
            r#"{"ID": "P1", "Password": "password123"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json = read_json(resp).await;
    assert_eq!(json["Result"], "Succeeded");
    assert_eq!(json["Message"], "認証に成功しました");
    assert_eq!(json["UserName"], "テスト勇者");

    // Fresh player shape
    assert_eq!(json["CharId"], 0);
    assert_eq!(json["Exp"], 0);
    assert_eq!(json["Parameter1"], 0);
    assert_eq!(json["Parameter4"], 0);
    assert_eq!(json["CurrentEventId"], 1);
    assert_eq!(json["CurrentSeq"], 0);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let router = create_test_router().await;
    register_player(&router, "P1").await;

    // Wrong password and unknown user share the same response shape
    let resp = router
        .clone()
        .oneshot(post_json("/LOGIN", r#"{"ID": "P1", "Password": "wrongwrong"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let json = read_json(resp).await;
    assert_eq!(json["Result"], "Failed");
    assert_eq!(json["Message"], "認証失敗（IDまたはパスワードが一致しません）");
    assert!(json["UserName"].is_null());

    let resp = router
        .oneshot(post_json(
            "/LOGIN",
            r#"{"ID": "nobody", "Password": "password123"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let json = read_json(resp).await;
    assert_eq!(json["Result"], "Failed");
    assert_eq!(json["Message"], "認証失敗（IDまたはパスワードが一致しません）");
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let router = create_test_router().await;

    let resp = router
        .clone()
        .oneshot(post_json("/LOGIN", r#"{"ID": "P1"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(read_text(resp).await, "IDまたはパスワードが未入力です。");

    let resp = router
        .oneshot(post_json("/LOGIN", r#"{"ID": "", "Password": "secret"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_insert_user_validation() {
    let router = create_test_router().await;

    let resp = router
        .clone()
        .oneshot(post_json(
            "/INSERTUSER",
            r#"{"ID": "P1", "Password": "password123"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(
        read_text(resp).await,
        "ID、パスワード、または表示名が設定されていません。"
    );

    let resp = router
        .oneshot(post_json(
            "/INSERTUSER",
            r#"{"ID": "P1", "Password": "short", "Name": "テスト勇者"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(read_text(resp).await, "Password は8文字以上である必要があります。");
}

#[tokio::test]
async fn test_insert_user_duplicate_is_conflict() {
    let router = create_test_router().await;

    let body = r#"{"ID": "P1", "Password": "password123", "Name": "テスト勇者"}"#;
    let resp = router.clone().oneshot(post_json("/INSERTUSER", body)).await.unwrap();
    assert_eq!(resp.status(), 200);

    let resp = router.oneshot(post_json("/INSERTUSER", body)).await.unwrap();
    assert_eq!(resp.status(), 409);
    assert_eq!(read_text(resp).await, "このUserIdは既に登録されています。");
}

// ============================================================================
// Player Data
// ============================================================================

#[tokio::test]
async fn test_insert_player_and_select() {
    let router = create_test_router().await;
    register_player(&router, "P1").await;

    // Query-string lookup
    let resp = router
        .clone()
        .oneshot(get("/SELECTPLAYER?UserId=P1"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json = read_json(resp).await;
    let list = json["List"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["UserId"], "P1");
    assert_eq!(list[0]["CharId"], 0);
    assert_eq!(list[0]["Exp"], 0);
    assert_eq!(list[0]["CurrentEventId"], 1);
    assert_eq!(list[0]["CurrentSeq"], 0);

    // Body lookup returns the same row
    let resp = router
        .clone()
        .oneshot(post_json("/SELECTPLAYER", r#"{"UserId": "P1"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json = read_json(resp).await;
    assert_eq!(json["List"].as_array().unwrap().len(), 1);

    // Unknown user is an empty list, not an error
    let resp = router
        .oneshot(get("/SELECTPLAYER?UserId=nobody"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json = read_json(resp).await;
    assert_eq!(json["List"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_insert_player_validation() {
    let router = create_test_router().await;

    let resp = router
        .clone()
        .oneshot(post_json("/INSERTPLAYER", r#"{}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(read_text(resp).await, "UserId が設定されていません。");

    let resp = router
        .oneshot(post_json("/SELECTPLAYER", r#"{}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(read_text(resp).await, "UserId パラメータが必要です。");
}

#[tokio::test]
async fn test_insert_player_duplicate_is_conflict() {
    let router = create_test_router().await;
    register_player(&router, "P1").await;

    let resp = router
        .oneshot(post_json("/INSERTPLAYER", r#"{"UserId": "P1"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    assert_eq!(read_text(resp).await, "このUserIdは既に登録されています。");
}

#[tokio::test]
async fn test_select_all_players_ordered() {
    let router = create_test_router().await;
    register_player(&router, "zeta").await;
    register_player(&router, "alpha").await;

    let resp = router.oneshot(get("/SELECTALLPLAYER")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let json = read_json(resp).await;
    let list = json["List"].as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["UserId"], "alpha");
    assert_eq!(list[1]["UserId"], "zeta");
}

// ============================================================================
// Partial Update
// ============================================================================

#[tokio::test]
async fn test_update_player_partial_fields() {
    let router = create_test_router().await;
    register_player(&router, "P1").await;

    let resp = router
        .clone()
        .oneshot(post_json(
            "/UPDATE",
            r#"{"UserId": "P1", "Exp": 1600, "CharId": 10, "Parameter1": 100, "CurrentEventId": 999, "CurrentSeq": 3}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json = read_json(resp).await;
    assert_eq!(json["result"], "1件のプレイヤーデータを更新しました。");

    // Untouched columns keep their values
    let resp = router
        .clone()
        .oneshot(get("/SELECTPLAYER?UserId=P1"))
        .await
        .unwrap();
    let json = read_json(resp).await;
    let row = &json["List"][0];
    assert_eq!(row["Exp"], 1600);
    assert_eq!(row["CharId"], 10);
    assert_eq!(row["Parameter1"], 100);
    assert_eq!(row["Parameter2"], 0);
    assert_eq!(row["CurrentEventId"], 999);
    assert_eq!(row["CurrentSeq"], 3);

    // Saved state survives a fresh login
    let resp = router
        .oneshot(post_json(
            "/LOGIN",
            r#"{"ID": "P1", "Password": "password123"}"#,
        ))
        .await
        .unwrap();
    let json = read_json(resp).await;
    assert_eq!(json["CharId"], 10);
    assert_eq!(json["Exp"], 1600);
}

#[tokio::test]
async fn test_update_player_via_query_string() {
    let router = create_test_router().await;
    register_player(&router, "P1").await;

    let resp = router
        .clone()
        .oneshot(get("/UPDATE?UserId=P1&Exp=500&Parameter2=40"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = router
        .oneshot(get("/SELECTPLAYER?UserId=P1"))
        .await
        .unwrap();
    let json = read_json(resp).await;
    assert_eq!(json["List"][0]["Exp"], 500);
    assert_eq!(json["List"][0]["Parameter2"], 40);
}

#[tokio::test]
async fn test_update_player_validation() {
    let router = create_test_router().await;
    register_player(&router, "P1").await;

    let resp = router
        .clone()
        .oneshot(post_json("/UPDATE", r#"{"Exp": 100}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(read_text(resp).await, "UserId が設定されていません。");

    let resp = router
        .clone()
        .oneshot(post_json("/UPDATE", r#"{"UserId": "P1", "Parameter1": 101}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(read_text(resp).await, "Parameter1 must be between 0 and 100");

    let resp = router
        .clone()
        .oneshot(post_json("/UPDATE", r#"{"UserId": "P1", "Parameter3": -1}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(read_text(resp).await, "Parameter3 must be between 0 and 100");

    let resp = router
        .oneshot(post_json("/UPDATE", r#"{"UserId": "P1", "CharId": 15}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(read_text(resp).await, "CharId must be one of 0, 10, 20, 30, 40");
}

#[tokio::test]
async fn test_update_unknown_player_is_not_found() {
    let router = create_test_router().await;

    let resp = router
        .oneshot(post_json("/UPDATE", r#"{"UserId": "nobody", "Exp": 10}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    assert_eq!(read_text(resp).await, "PlayerData が見つかりません。");
}

// ============================================================================
// Dialogue Scripts
// ============================================================================

#[tokio::test]
async fn test_select_events_returns_seeded_script() {
    let router = create_test_router().await;

    let resp = router
        .clone()
        .oneshot(get("/SELECTEVENTS?eventId=1"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json = read_json(resp).await;
    let lines = json["EventLines"].as_array().unwrap();
    assert!(!lines.is_empty());
    assert_eq!(lines[0]["EventId"], 1);
    assert_eq!(lines[0]["Seq"], 1);
    assert!(lines[0]["Speaker"].is_string());
    assert!(lines[0]["Text"].is_string());

    // Ordered by Seq ascending
    let seqs: Vec<i64> = lines.iter().map(|l| l["Seq"].as_i64().unwrap()).collect();
    let mut sorted = seqs.clone();
    sorted.sort();
    assert_eq!(seqs, sorted);

    // The evolution epilogue script is seeded too
    let resp = router
        .oneshot(get("/SELECTEVENTS?eventId=999"))
        .await
        .unwrap();
    let json = read_json(resp).await;
    assert!(!json["EventLines"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_select_events_unknown_event_is_empty() {
    let router = create_test_router().await;

    let resp = router
        .oneshot(get("/SELECTEVENTS?eventId=42"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json = read_json(resp).await;
    assert_eq!(json["EventLines"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_select_events_requires_numeric_event_id() {
    let router = create_test_router().await;

    let resp = router.clone().oneshot(get("/SELECTEVENTS")).await.unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(read_text(resp).await, "eventId パラメータが必要です。");

    let resp = router
        .oneshot(get("/SELECTEVENTS?eventId=abc"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(read_text(resp).await, "eventId パラメータが必要です。");
}

// ============================================================================
// Chat Classifier Proxy
// ============================================================================

#[tokio::test]
async fn test_openai_requires_config_then_message() {
    let router = create_test_router().await;

    // Without deployment configuration the endpoint hint comes first
    let resp = router
        .clone()
        .oneshot(post_json("/OpenAI", r#"{"message": "こんにちは"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(
        read_text(resp).await,
        "Please set the AZURE_OPENAI_ENDPOINT environment variable."
    );

    // With configuration present, a missing message is reported before
    // any upstream call happens
    std::env::set_var("AZURE_OPENAI_ENDPOINT", "http://127.0.0.1:1");
    std::env::set_var("AZURE_OPENAI_KEY", "test-key");

    let resp = router.oneshot(get("/OpenAI")).await.unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(read_text(resp).await, "Please provide a 'message' parameter.");

    std::env::remove_var("AZURE_OPENAI_ENDPOINT");
    std::env::remove_var("AZURE_OPENAI_KEY");
}
