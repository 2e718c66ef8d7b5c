//! Integration tests for the concurrent-session limit.

mod helpers;

use std::sync::Arc;

use axum::http::StatusCode;

use helpers::{PASSWORD, TestApp, field};

#[tokio::test]
async fn test_login_beyond_limit_evicts_oldest_session() {
    let app = TestApp::new().await;
    let limit = app.config.session.max_concurrent_sessions as usize;

    let first = app.signup("commuter@example.com").await;
    let mut latest = first.clone();
    for _ in 0..limit {
        latest = app.login("commuter@example.com", PASSWORD).await;
    }

    let evicted = app
        .request("GET", "/api/auth/sessions", None, Some(field(&first, "accessToken")))
        .await;
    assert_eq!(evicted.status, StatusCode::UNAUTHORIZED);
    assert_eq!(evicted.code(), Some("TOKEN_BLACKLISTED"));

    let listed = app
        .request("GET", "/api/auth/sessions", None, Some(field(&latest, "accessToken")))
        .await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body["data"]["count"], limit);
}

#[tokio::test]
async fn test_evicted_session_cannot_refresh() {
    let app = TestApp::new().await;
    let limit = app.config.session.max_concurrent_sessions as usize;

    let first = app.signup("rotator@example.com").await;
    for _ in 0..limit {
        app.login("rotator@example.com", PASSWORD).await;
    }

    let response = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(serde_json::json!({ "refreshToken": field(&first, "refreshToken") })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.code(), Some("TOKEN_INVALID"));
}

#[tokio::test]
async fn test_logout_all_ends_every_session() {
    let app = TestApp::new().await;
    let first = app.signup("everywhere@example.com").await;
    let second = app.login("everywhere@example.com", PASSWORD).await;

    let response = app
        .request(
            "POST",
            "/api/auth/logout-all",
            None,
            Some(field(&second, "accessToken")),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["count"], 2);

    for data in [&first, &second] {
        let response = app
            .request("GET", "/api/auth/sessions", None, Some(field(data, "accessToken")))
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_logins_keep_the_limit() {
    let app = Arc::new(TestApp::new().await);
    let limit = app.config.session.max_concurrent_sessions as usize;

    let signup = app.signup("rush@example.com").await;
    let response = app
        .request(
            "POST",
            "/api/auth/logout",
            None,
            Some(field(&signup, "accessToken")),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let handles: Vec<_> = (0..=limit)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move { app.login("rush@example.com", PASSWORD).await })
        })
        .collect();
    let mut logins = Vec::new();
    for handle in handles {
        logins.push(handle.await.expect("login task panicked"));
    }

    let mut rejected = 0;
    let mut survivor = None;
    for data in &logins {
        let response = app
            .request("GET", "/api/auth/sessions", None, Some(field(data, "accessToken")))
            .await;
        if response.status == StatusCode::OK {
            survivor = Some(response);
        } else {
            assert_eq!(response.code(), Some("TOKEN_BLACKLISTED"));
            rejected += 1;
        }
    }

    assert_eq!(rejected, 1);
    let listed = survivor.expect("at least one session survives");
    assert_eq!(listed.body["data"]["count"], limit);
}
