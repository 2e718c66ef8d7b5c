//! Response DTOs.

use serde::Serialize;

use parkhub_entity::session::{SessionSummary, TokenPair};
use parkhub_entity::user::PublicUser;

/// Envelope wrapping every response body.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Machine-readable error code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            code: None,
            errors: None,
        }
    }

    pub fn error(
        code: &'static str,
        message: impl Into<String>,
        errors: Option<Vec<String>>,
    ) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            code: Some(code),
            errors,
        }
    }
}

impl ApiResponse<()> {
    /// Success with no payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            code: None,
            errors: None,
        }
    }
}

/// Signup, login and refresh payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub refresh_expires_in: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_warning: Option<String>,
}

impl AuthResponse {
    pub fn new(user: PublicUser, tokens: TokenPair, device_warning: Option<String>) -> Self {
        Self {
            user,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: tokens.token_type,
            expires_in: tokens.expires_in,
            refresh_expires_in: tokens.refresh_expires_in,
            device_warning,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSummary>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
    pub cache: &'static str,
}
