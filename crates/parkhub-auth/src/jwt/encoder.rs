//! Signs access and refresh tokens.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use parkhub_core::config::AuthConfig;
use parkhub_core::error::AppError;
use parkhub_entity::session::TokenPair;
use parkhub_entity::user::User;

use super::claims::{AccessClaims, RefreshClaims, TokenType};

/// A freshly signed pair together with the claims that went into it.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub pair: TokenPair,
    pub access: AccessClaims,
    pub refresh: RefreshClaims,
}

impl IssuedTokens {
    pub fn access_expires_at(&self) -> DateTime<Utc> {
        self.access.expires_at()
    }

    pub fn refresh_expires_at(&self) -> DateTime<Utc> {
        self.refresh.expires_at()
    }
}

/// Creates HS256-signed token pairs.
#[derive(Clone)]
pub struct JwtEncoder {
    encoding_key: EncodingKey,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl JwtEncoder {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.jwt_issuer.clone(),
            access_ttl: Duration::minutes(config.jwt_access_ttl_minutes as i64),
            refresh_ttl: Duration::days(config.jwt_refresh_ttl_days as i64),
        }
    }

    /// Access token lifetime.
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Issue a new pair for `user` in refresh family `family_id`.
    pub fn issue(&self, user: &User, family_id: Uuid) -> Result<IssuedTokens, AppError> {
        self.issue_at(user, family_id, Utc::now())
    }

    pub(crate) fn issue_at(
        &self,
        user: &User,
        family_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<IssuedTokens, AppError> {
        let access_exp = now + self.access_ttl;
        let refresh_exp = now + self.refresh_ttl;

        let access = AccessClaims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            fam: family_id,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: access_exp.timestamp(),
            iss: self.issuer.clone(),
            token_type: TokenType::Access,
        };

        let refresh = RefreshClaims {
            sub: user.id,
            fam: family_id,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: refresh_exp.timestamp(),
            iss: self.issuer.clone(),
            token_type: TokenType::Refresh,
        };

        let access_token = encode(&Header::default(), &access, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode access token: {e}")))?;
        let refresh_token = encode(&Header::default(), &refresh, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode refresh token: {e}")))?;

        Ok(IssuedTokens {
            pair: TokenPair {
                access_token,
                refresh_token,
                token_type: "Bearer".to_string(),
                expires_in: self.access_ttl.num_seconds().max(0) as u64,
                refresh_expires_in: self.refresh_ttl.num_seconds().max(0) as u64,
            },
            access,
            refresh,
        })
    }
}
