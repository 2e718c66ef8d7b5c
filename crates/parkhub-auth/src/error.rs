//! Authentication error taxonomy.

use chrono::{DateTime, Utc};
use thiserror::Error;

use parkhub_core::AppError;

/// Outcome of a failed authentication-core operation.
///
/// Credential and token variants are safe to report to clients through
/// [`AuthError::client_message`]. [`AuthError::Internal`] wraps storage or
/// backend failures whose detail must stay in the logs.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password. The two cases are indistinguishable.
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("account is deactivated")]
    AccountDeactivated,

    #[error("account is locked until {until}")]
    AccountLocked { until: DateTime<Utc> },

    /// Bad signature, malformed token, or wrong token type.
    #[error("token is invalid")]
    TokenInvalid,

    #[error("token has expired")]
    TokenExpired,

    /// A refresh token was presented after it had already been rotated.
    #[error("refresh token reuse detected")]
    TokenReused,

    #[error("token has been revoked")]
    TokenBlacklisted,

    #[error("insufficient permissions")]
    InsufficientPermissions,

    /// No identity was presented at all.
    #[error("authentication required")]
    Unauthenticated,

    /// Informational; eviction normally handles an exceeded limit silently.
    #[error("concurrent session limit exceeded")]
    SessionLimitExceeded,

    #[error("password does not meet policy")]
    PasswordPolicyViolation(Vec<String>),

    #[error("email already registered")]
    DuplicateEmail,

    #[error("current password is incorrect")]
    WrongCurrentPassword,

    #[error("reset token is invalid")]
    ResetTokenInvalid,

    #[error("reset token has expired")]
    ResetTokenExpired,

    #[error("reset token has already been used")]
    ResetTokenConsumed,

    #[error("internal error: {0}")]
    Internal(#[from] AppError),
}

/// A specialized `Result` type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AccountDeactivated => "ACCOUNT_DEACTIVATED",
            Self::AccountLocked { .. } => "ACCOUNT_LOCKED",
            Self::TokenInvalid => "TOKEN_INVALID",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::TokenReused => "TOKEN_REUSED",
            Self::TokenBlacklisted => "TOKEN_BLACKLISTED",
            Self::InsufficientPermissions => "INSUFFICIENT_PERMISSIONS",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::SessionLimitExceeded => "SESSION_LIMIT_EXCEEDED",
            Self::PasswordPolicyViolation(_) => "PASSWORD_POLICY_VIOLATION",
            Self::DuplicateEmail => "DUPLICATE_EMAIL",
            Self::WrongCurrentPassword => "WRONG_CURRENT_PASSWORD",
            Self::ResetTokenInvalid => "RESET_TOKEN_INVALID",
            Self::ResetTokenExpired => "RESET_TOKEN_EXPIRED",
            Self::ResetTokenConsumed => "RESET_TOKEN_CONSUMED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to return to a client. Internal causes are replaced
    /// with a generic message.
    pub fn client_message(&self) -> String {
        match self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::AccountLocked { .. } => {
                "Account is temporarily locked due to repeated failed logins".to_string()
            }
            other => {
                let mut msg = other.to_string();
                if let Some(first) = msg.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                msg
            }
        }
    }

    /// Individual rule violations, for errors that carry them.
    pub fn details(&self) -> Vec<String> {
        match self {
            Self::PasswordPolicyViolation(errors) => errors.clone(),
            _ => Vec::new(),
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}
