//! Integration tests for refresh-token rotation.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

use helpers::{TestApp, field};

#[tokio::test]
async fn test_refresh_rotates_both_tokens() {
    let app = TestApp::new().await;
    let original = app.signup("rotate@example.com").await;

    let response = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(json!({ "refreshToken": field(&original, "refreshToken") })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let rotated = &response.body["data"];
    assert_ne!(field(rotated, "refreshToken"), field(&original, "refreshToken"));
    assert_ne!(field(rotated, "accessToken"), field(&original, "accessToken"));

    let superseded = app
        .request(
            "GET",
            "/api/auth/sessions",
            None,
            Some(field(&original, "accessToken")),
        )
        .await;
    assert_eq!(superseded.status, StatusCode::UNAUTHORIZED);

    let current = app
        .request("GET", "/api/auth/sessions", None, Some(field(rotated, "accessToken")))
        .await;
    assert_eq!(current.status, StatusCode::OK);
    assert_eq!(current.body["data"]["count"], 1);
}

#[tokio::test]
async fn test_replayed_refresh_token_ends_all_sessions() {
    let app = TestApp::new().await;
    let original = app.signup("replay@example.com").await;
    let stolen = field(&original, "refreshToken").to_string();

    let first = app
        .request("POST", "/api/auth/refresh", Some(json!({ "refreshToken": stolen })), None)
        .await;
    assert_eq!(first.status, StatusCode::OK);
    let rotated = first.body["data"].clone();

    let replay = app
        .request("POST", "/api/auth/refresh", Some(json!({ "refreshToken": stolen })), None)
        .await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);
    assert_eq!(replay.code(), Some("TOKEN_REUSED"));

    let access = app
        .request("GET", "/api/auth/sessions", None, Some(field(&rotated, "accessToken")))
        .await;
    assert_eq!(access.status, StatusCode::UNAUTHORIZED);

    let refresh = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(json!({ "refreshToken": field(&rotated, "refreshToken") })),
            None,
        )
        .await;
    assert_eq!(refresh.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_access_token_is_not_a_refresh_token() {
    let app = TestApp::new().await;
    let data = app.signup("mixup@example.com").await;

    let response = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(json!({ "refreshToken": field(&data, "accessToken") })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.code(), Some("TOKEN_INVALID"));
}
