//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use tower::ServiceExt;

use parkhub_api::{AppState, build_app};
use parkhub_auth::{AuthManager, ResetNotifier};
use parkhub_cache::CacheManager;
use parkhub_cache::memory::MemoryCacheProvider;
use parkhub_core::config::{AppConfig, StorageBackend};
use parkhub_core::result::AppResult;
use parkhub_database::Repositories;
use parkhub_entity::user::User;

/// Satisfies every strength rule.
pub const PASSWORD: &str = "Park!ng2024";

/// Keeps issued reset tokens so tests can play the account owner.
#[derive(Debug, Default)]
pub struct CapturingNotifier {
    tokens: Mutex<Vec<(String, String)>>,
}

impl CapturingNotifier {
    /// Most recent token sent to `email`.
    pub fn last_token_for(&self, email: &str) -> Option<String> {
        let tokens = self.tokens.lock().expect("notifier lock poisoned");
        tokens
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, token)| token.clone())
    }

    pub fn sent(&self) -> usize {
        self.tokens.lock().expect("notifier lock poisoned").len()
    }

    /// Delivery runs on a background task; wait for it.
    pub async fn wait_for_token(&self, email: &str) -> String {
        for _ in 0..200 {
            if let Some(token) = self.last_token_for(email) {
                return token;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("no reset token delivered to {email}");
    }
}

#[async_trait]
impl ResetNotifier for CapturingNotifier {
    async fn send_reset_token(
        &self,
        user: &User,
        raw_token: &str,
        _expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        self.tokens
            .lock()
            .expect("notifier lock poisoned")
            .push((user.email.clone(), raw_token.to_string()));
        Ok(())
    }
}

/// Test application context
pub struct TestApp {
    /// The full application, middleware included
    pub router: Router,
    /// Reset tokens delivered so far
    pub notifier: Arc<CapturingNotifier>,
    /// Application config
    pub config: AppConfig,
}

impl TestApp {
    /// Create a new test application on the in-memory backend.
    pub async fn new() -> Self {
        let mut config = AppConfig::default();
        config.storage.backend = StorageBackend::Memory;
        config.auth.jwt_secret = "integration-test-secret-0123456789".to_string();
        config.auth.argon2_memory_kib = 1024;
        config.auth.argon2_iterations = 1;
        config.auth.max_failed_attempts = 3;

        let cache = CacheManager::from_provider(Arc::new(MemoryCacheProvider::new(
            &config.cache.memory,
        )));
        let notifier = Arc::new(CapturingNotifier::default());

        let auth = Arc::new(
            AuthManager::new(
                &config,
                Repositories::in_memory(),
                cache.clone(),
                notifier.clone(),
            )
            .expect("Failed to build auth manager"),
        );

        let state = AppState::new(Arc::new(config.clone()), auth, cache, None);

        Self {
            router: build_app(state),
            notifier,
            config,
        }
    }

    /// Sign up and return the `data` object of the response.
    pub async fn signup(&self, email: &str) -> Value {
        let response = self
            .request(
                "POST",
                "/api/auth/signup",
                Some(json!({ "email": email, "password": PASSWORD })),
                None,
            )
            .await;

        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "Signup failed: {:?}",
            response.body
        );
        response.body["data"].clone()
    }

    /// Log in and return the `data` object of the response.
    pub async fn login(&self, email: &str, password: &str) -> Value {
        let response = self
            .request(
                "POST",
                "/api/auth/login",
                Some(json!({ "email": email, "password": password })),
                None,
            )
            .await;

        assert_eq!(
            response.status,
            StatusCode::OK,
            "Login failed: {:?}",
            response.body
        );
        response.body["data"].clone()
    }

    /// Make an HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Pull a string field out of an auth payload.
pub fn field<'a>(data: &'a Value, key: &str) -> &'a str {
    data[key]
        .as_str()
        .unwrap_or_else(|| panic!("missing {key} in {data}"))
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    pub fn code(&self) -> Option<&str> {
        self.body["code"].as_str()
    }
}
