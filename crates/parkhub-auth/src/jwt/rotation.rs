//! Single-use refresh tokens with reuse detection.
//!
//! Each refresh token is recorded when issued and consumed atomically when
//! presented. Presenting a consumed token means the token was copied: every
//! session and refresh family of the user is revoked.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use parkhub_database::deadline;
use parkhub_database::repositories::{RefreshConsume, RefreshTokenRepository, UserRepository};
use parkhub_entity::session::NewRefreshToken;
use parkhub_entity::user::User;

use super::decoder::JwtDecoder;
use super::encoder::{IssuedTokens, JwtEncoder};
use crate::error::{AuthError, AuthResult};
use crate::session::SessionStore;

/// Rotates refresh tokens.
#[derive(Clone)]
pub struct RefreshRotator {
    encoder: JwtEncoder,
    decoder: JwtDecoder,
    users: Arc<dyn UserRepository>,
    refresh_tokens: Arc<dyn RefreshTokenRepository>,
    sessions: SessionStore,
    io_timeout: Duration,
}

impl RefreshRotator {
    pub fn new(
        encoder: JwtEncoder,
        decoder: JwtDecoder,
        users: Arc<dyn UserRepository>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
        sessions: SessionStore,
        io_timeout: Duration,
    ) -> Self {
        Self {
            encoder,
            decoder,
            users,
            refresh_tokens,
            sessions,
            io_timeout,
        }
    }

    /// Record the refresh half of a newly issued pair.
    pub async fn register(&self, issued: &IssuedTokens) -> AuthResult<()> {
        let record = NewRefreshToken {
            jti: issued.refresh.jti,
            family_id: issued.refresh.fam,
            user_id: issued.refresh.sub,
            expires_at: issued.refresh_expires_at(),
        };
        deadline::within(
            self.io_timeout,
            "refresh insert",
            self.refresh_tokens.insert(&record),
        )
        .await?;
        Ok(())
    }

    /// Exchange `refresh_token` for a new pair in the same family.
    pub async fn rotate(&self, refresh_token: &str) -> AuthResult<(User, IssuedTokens)> {
        let claims = self.decoder.verify_refresh(refresh_token)?;

        let outcome = deadline::within(
            self.io_timeout,
            "refresh consume",
            self.refresh_tokens.consume(claims.jti, Utc::now()),
        )
        .await?;

        let record = match outcome {
            RefreshConsume::Consumed(record) => record,
            RefreshConsume::AlreadyConsumed(record) => {
                warn!(
                    user_id = %record.user_id,
                    family_id = %record.family_id,
                    "Refresh token reused, revoking every session of the user"
                );
                self.sessions
                    .revoke_all_for_user(record.user_id, None, "refresh_reuse")
                    .await?;
                return Err(AuthError::TokenReused);
            }
            RefreshConsume::Revoked(_) | RefreshConsume::NotFound => {
                return Err(AuthError::TokenInvalid);
            }
        };

        if record.user_id != claims.sub || record.family_id != claims.fam {
            return Err(AuthError::TokenInvalid);
        }

        let user = deadline::within(
            self.io_timeout,
            "user lookup",
            self.users.find_by_id(record.user_id),
        )
        .await?
        .ok_or(AuthError::TokenInvalid)?;

        if !user.is_active {
            self.sessions.revoke_family(record.family_id).await?;
            return Err(AuthError::AccountDeactivated);
        }

        let issued = self.encoder.issue(&user, record.family_id)?;
        self.register(&issued).await?;

        if !self
            .sessions
            .rekey(record.family_id, issued.access.jti)
            .await?
        {
            // Session was evicted or ended; the family must not outlive it.
            self.sessions.revoke_family(record.family_id).await?;
            return Err(AuthError::TokenInvalid);
        }

        info!(user_id = %user.id, family_id = %record.family_id, "Refresh token rotated");
        Ok((user, issued))
    }
}
