//! Integration tests for signup, login and logout.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

use helpers::{PASSWORD, TestApp, TestResponse, field};

#[tokio::test]
async fn test_signup_returns_tokens_and_user() {
    let app = TestApp::new().await;
    let data = app.signup("Driver@Example.com").await;

    assert_eq!(data["user"]["email"], "driver@example.com");
    assert_eq!(data["tokenType"], "Bearer");
    assert!(!field(&data, "accessToken").is_empty());
    assert!(!field(&data, "refreshToken").is_empty());
    assert!(data["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_signup_duplicate_email_ignores_case() {
    let app = TestApp::new().await;
    app.signup("dup@example.com").await;

    let response = app
        .request(
            "POST",
            "/api/auth/signup",
            Some(json!({ "email": "DUP@example.com", "password": PASSWORD })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.code(), Some("DUPLICATE_EMAIL"));
}

#[tokio::test]
async fn test_signup_weak_password_lists_every_violation() {
    let app = TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/auth/signup",
            Some(json!({ "email": "weak@example.com", "password": "short" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.code(), Some("PASSWORD_POLICY_VIOLATION"));
    let errors = response.body["errors"].as_array().expect("errors array");
    assert!(errors.len() > 1, "expected several violations: {errors:?}");
}

#[tokio::test]
async fn test_signup_rejects_malformed_email() {
    let app = TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/auth/signup",
            Some(json!({ "email": "not-an-email", "password": PASSWORD })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.code(), Some("VALIDATION_ERROR"));
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = TestApp::new().await;
    app.signup("known@example.com").await;

    let wrong_password = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "email": "known@example.com", "password": "Wrong!pass1" })),
            None,
        )
        .await;
    let unknown_email = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "email": "nobody@example.com", "password": PASSWORD })),
            None,
        )
        .await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_email.body);
}

#[tokio::test]
async fn test_repeated_failures_lock_the_account() {
    let app = TestApp::new().await;
    app.signup("locked@example.com").await;

    for _ in 0..app.config.auth.max_failed_attempts {
        let response = app
            .request(
                "POST",
                "/api/auth/login",
                Some(json!({ "email": "locked@example.com", "password": "Wrong!pass1" })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "email": "locked@example.com", "password": PASSWORD })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::LOCKED);
    assert_eq!(response.code(), Some("ACCOUNT_LOCKED"));
}

#[tokio::test]
async fn test_locked_account_answers_wrong_password_like_unknown_email() {
    let app = TestApp::new().await;
    app.signup("hidden@example.com").await;

    for _ in 0..app.config.auth.max_failed_attempts {
        wrong_password(&app, "hidden@example.com").await;
    }

    let locked = wrong_password(&app, "hidden@example.com").await;
    let unknown = wrong_password(&app, "nobody@example.com").await;

    assert_eq!(locked.status, StatusCode::UNAUTHORIZED);
    assert_eq!(locked.status, unknown.status);
    assert_eq!(locked.body, unknown.body);
}

#[tokio::test]
async fn test_logout_without_token_is_bad_request() {
    let app = TestApp::new().await;

    let response = app.request("POST", "/api/auth/logout", None, None).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "No token provided");
}

#[tokio::test]
async fn test_logged_out_token_is_blacklisted() {
    let app = TestApp::new().await;
    let data = app.signup("leaver@example.com").await;
    let token = field(&data, "accessToken");

    let response = app
        .request("POST", "/api/auth/logout", None, Some(token))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request("GET", "/api/auth/sessions", None, Some(token))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.code(), Some("TOKEN_BLACKLISTED"));
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = TestApp::new().await;

    let missing = app.request("GET", "/api/auth/sessions", None, None).await;
    let garbage = app
        .request("GET", "/api/auth/sessions", None, Some("not.a.jwt"))
        .await;

    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
    assert_eq!(garbage.code(), Some("TOKEN_INVALID"));
}

#[tokio::test]
async fn test_change_password_signs_out_other_sessions() {
    let app = TestApp::new().await;
    let first = app.signup("mover@example.com").await;
    let second = app.login("mover@example.com", PASSWORD).await;

    let response = app
        .request(
            "POST",
            "/api/auth/change-password",
            Some(json!({ "currentPassword": PASSWORD, "newPassword": "N3w!Parking" })),
            Some(field(&second, "accessToken")),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["count"], 1);

    let stale = app
        .request("GET", "/api/auth/sessions", None, Some(field(&first, "accessToken")))
        .await;
    assert_eq!(stale.status, StatusCode::UNAUTHORIZED);

    let current = app
        .request("GET", "/api/auth/sessions", None, Some(field(&second, "accessToken")))
        .await;
    assert_eq!(current.status, StatusCode::OK);

    app.login("mover@example.com", "N3w!Parking").await;
}

#[tokio::test]
async fn test_health_reports_in_memory_backend() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["database"], "in-memory");
    assert_eq!(response.body["data"]["cache"], "ok");
}

async fn wrong_password(app: &TestApp, email: &str) -> TestResponse {
    app.request(
        "POST",
        "/api/auth/login",
        Some(json!({ "email": email, "password": "Wrong!pass1" })),
        None,
    )
    .await
}
