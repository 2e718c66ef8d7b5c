//! JWT claim payloads for access and refresh tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use parkhub_entity::user::UserRole;

/// Distinguishes access tokens from refresh tokens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived bearer token for API requests.
    Access,
    /// Long-lived single-use token for obtaining a new pair.
    Refresh,
}

/// Claims carried by every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject, the user id.
    pub sub: Uuid,
    pub email: String,
    /// Role at the time of issuance.
    pub role: UserRole,
    /// Refresh family the token belongs to.
    pub fam: Uuid,
    /// Token id, also the session key.
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub token_type: TokenType,
}

/// Claims carried by every refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub fam: Uuid,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub token_type: TokenType,
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

impl AccessClaims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        timestamp(self.exp)
    }
}

impl RefreshClaims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        timestamp(self.exp)
    }
}
