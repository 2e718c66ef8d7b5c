//! Request DTOs with validation.

use serde::Deserialize;
use validator::Validate;

/// POST /api/auth/signup
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    /// Strength rules are applied by the auth core, which reports every
    /// violation at once.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    #[validate(length(max = 100, message = "First name is too long"))]
    pub first_name: Option<String>,
    #[validate(length(max = 100, message = "Last name is too long"))]
    pub last_name: Option<String>,
}

/// POST /api/auth/login
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// POST /api/auth/refresh
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// POST /api/auth/change-password
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,
}

/// POST /api/auth/password-reset/request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PasswordResetRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
}

/// POST /api/auth/password-reset/confirm
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetConfirm {
    #[serde(alias = "token")]
    #[validate(length(min = 1, message = "Reset token is required"))]
    pub reset_token: String,
    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,
}
