//! Integration tests for the password reset flow.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

use helpers::{PASSWORD, TestApp, field};

const NEW_PASSWORD: &str = "R3set!Parking";

#[tokio::test]
async fn test_request_reply_does_not_reveal_accounts() {
    let app = TestApp::new().await;
    app.signup("exists@example.com").await;

    let known = app
        .request(
            "POST",
            "/api/auth/password-reset/request",
            Some(json!({ "email": "exists@example.com" })),
            None,
        )
        .await;
    let unknown = app
        .request(
            "POST",
            "/api/auth/password-reset/request",
            Some(json!({ "email": "ghost@example.com" })),
            None,
        )
        .await;

    assert_eq!(known.status, StatusCode::OK);
    assert_eq!(known.body, unknown.body);
    app.notifier.wait_for_token("exists@example.com").await;
    assert_eq!(app.notifier.sent(), 1);
}

#[tokio::test]
async fn test_confirm_sets_password_and_ends_sessions() {
    let app = TestApp::new().await;
    let session = app.signup("forgetful@example.com").await;

    app.request(
        "POST",
        "/api/auth/password-reset/request",
        Some(json!({ "email": "forgetful@example.com" })),
        None,
    )
    .await;
    let token = app.notifier.wait_for_token("forgetful@example.com").await;

    let response = app
        .request(
            "POST",
            "/api/auth/password-reset/confirm",
            Some(json!({ "resetToken": token, "newPassword": NEW_PASSWORD })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let stale = app
        .request(
            "GET",
            "/api/auth/sessions",
            None,
            Some(field(&session, "accessToken")),
        )
        .await;
    assert_eq!(stale.status, StatusCode::UNAUTHORIZED);

    let old = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "email": "forgetful@example.com", "password": PASSWORD })),
            None,
        )
        .await;
    assert_eq!(old.status, StatusCode::UNAUTHORIZED);
    app.login("forgetful@example.com", NEW_PASSWORD).await;

    let again = app
        .request(
            "POST",
            "/api/auth/password-reset/confirm",
            Some(json!({ "resetToken": token, "newPassword": "An0ther!Pass" })),
            None,
        )
        .await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);
    assert_eq!(again.code(), Some("RESET_TOKEN_CONSUMED"));
}

#[tokio::test]
async fn test_unknown_reset_token_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/auth/password-reset/confirm",
            Some(json!({ "resetToken": "bm90LWEtcmVhbC10b2tlbg", "newPassword": NEW_PASSWORD })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.code(), Some("RESET_TOKEN_INVALID"));
}
