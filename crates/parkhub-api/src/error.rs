//! Maps auth and request errors to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use parkhub_auth::AuthError;

use crate::dto::response::ApiResponse;

/// Error returned by handlers and extractors.
#[derive(Debug)]
pub enum ApiError {
    /// An authentication-core failure.
    Auth(AuthError),
    /// The request body failed shape or field validation.
    Validation(Vec<String>),
    /// The request is missing something the route needs.
    BadRequest(String),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::Auth(err)
    }
}

impl From<parkhub_core::AppError> for ApiError {
    fn from(err: parkhub_core::AppError) -> Self {
        Self::Auth(AuthError::Internal(err))
    }
}

/// HTTP status for an auth error.
pub fn status_for(err: &AuthError) -> StatusCode {
    match err {
        AuthError::InvalidCredentials
        | AuthError::TokenInvalid
        | AuthError::TokenExpired
        | AuthError::TokenReused
        | AuthError::TokenBlacklisted
        | AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
        AuthError::AccountDeactivated | AuthError::InsufficientPermissions => {
            StatusCode::FORBIDDEN
        }
        AuthError::AccountLocked { .. } => StatusCode::LOCKED,
        AuthError::SessionLimitExceeded => StatusCode::CONFLICT,
        AuthError::PasswordPolicyViolation(_)
        | AuthError::DuplicateEmail
        | AuthError::WrongCurrentPassword
        | AuthError::ResetTokenInvalid
        | AuthError::ResetTokenExpired
        | AuthError::ResetTokenConsumed => StatusCode::BAD_REQUEST,
        AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Auth(err) => {
                if let AuthError::Internal(inner) = &err {
                    tracing::error!(kind = %inner.kind, error = %inner, "Internal server error");
                }
                let details = err.details();
                (
                    status_for(&err),
                    ApiResponse::<()>::error(
                        err.code(),
                        err.client_message(),
                        (!details.is_empty()).then_some(details),
                    ),
                )
            }
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                ApiResponse::error("VALIDATION_ERROR", "Validation failed", Some(errors)),
            ),
            Self::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ApiResponse::error("BAD_REQUEST", message, None),
            ),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parkhub_core::AppError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&AuthError::InvalidCredentials),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(&AuthError::AccountDeactivated),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_for(&AuthError::AccountLocked {
                until: chrono::Utc::now()
            }),
            StatusCode::LOCKED
        );
        assert_eq!(
            status_for(&AuthError::InsufficientPermissions),
            StatusCode::FORBIDDEN
        );
        assert_eq!(status_for(&AuthError::TokenReused), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(&AuthError::DuplicateEmail), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_error_hides_cause() {
        let response =
            ApiError::from(AppError::database("password authentication failed")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
