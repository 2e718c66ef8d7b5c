//! Auth handlers under `/api/auth`.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};

use parkhub_auth::Signup;
use parkhub_auth::rbac::permissions;

use crate::dto::request::{
    ChangePasswordRequest, LoginRequest, PasswordResetConfirm, PasswordResetRequest,
    RefreshRequest, SignupRequest,
};
use crate::dto::response::{ApiResponse, AuthResponse, CountResponse, SessionListResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, ClientDevice, ValidatedJson, bearer_token};
use crate::state::AppState;

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Same reply whether or not the account exists.
const RESET_REQUESTED: &str = "If an account exists for that email, a reset link has been sent";

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    ClientDevice(device): ClientDevice,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ApiError> {
    let session = state
        .auth
        .signup(
            Signup {
                email: req.email,
                password: req.password,
                first_name: req.first_name,
                last_name: req.last_name,
            },
            &device,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            "Account created",
            AuthResponse::new(session.user, session.tokens, None),
        )),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ClientDevice(device): ClientDevice,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<AuthResponse> {
    let session = state.auth.login(&req.email, &req.password, &device).await?;

    Ok(Json(ApiResponse::ok(
        "Login successful",
        AuthResponse::new(session.user, session.tokens, session.device_warning),
    )))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> ApiResult<AuthResponse> {
    let session = state.auth.refresh(&req.refresh_token).await?;

    Ok(Json(ApiResponse::ok(
        "Token refreshed",
        AuthResponse::new(session.user, session.tokens, None),
    )))
}

/// POST /api/auth/logout
///
/// A request without any bearer token is a 400, not a 401.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| ApiError::BadRequest("No token provided".to_string()))?;
    let ctx = state.auth.authenticate(token).await?;
    state.auth.logout(&ctx).await?;

    Ok(Json(ApiResponse::message("Logged out successfully")))
}

/// POST /api/auth/logout-all
pub async fn logout_all(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<CountResponse> {
    let count = state.auth.logout_all(&auth).await?;

    Ok(Json(ApiResponse::ok(
        "Logged out from all devices",
        CountResponse { count },
    )))
}

/// POST /api/auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<CountResponse> {
    state
        .auth
        .rbac()
        .require_permission(Some(&auth.0), permissions::PROFILE_UPDATE)?;

    let count = state
        .auth
        .change_password(&auth, &req.current_password, &req.new_password)
        .await?;

    Ok(Json(ApiResponse::ok(
        "Password changed, other sessions have been signed out",
        CountResponse { count },
    )))
}

/// POST /api/auth/password-reset/request
pub async fn request_password_reset(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<PasswordResetRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.auth.request_password_reset(&req.email).await?;
    Ok(Json(ApiResponse::message(RESET_REQUESTED)))
}

/// POST /api/auth/password-reset/confirm
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<PasswordResetConfirm>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state
        .auth
        .confirm_password_reset(&req.reset_token, &req.new_password)
        .await?;
    Ok(Json(ApiResponse::message(
        "Password has been reset, please log in again",
    )))
}

/// GET /api/auth/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<SessionListResponse> {
    state
        .auth
        .rbac()
        .require_permission(Some(&auth.0), permissions::PROFILE_READ)?;

    let sessions = state.auth.list_sessions(&auth).await?;
    let count = sessions.len();

    Ok(Json(ApiResponse::ok(
        "Active sessions",
        SessionListResponse { sessions, count },
    )))
}
