//! Authentication operations exposed to the HTTP layer.
//!
//! [`AuthManager`] wires the credential, token, revocation, session and
//! reset components over one set of repositories. Every request-path
//! operation returns [`AuthResult`]; storage failures arrive as
//! [`AuthError::Internal`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use parkhub_cache::CacheManager;
use parkhub_core::config::AppConfig;
use parkhub_core::result::AppResult;
use parkhub_database::Repositories;
use parkhub_database::deadline;
use parkhub_database::repositories::UserRepository;
use parkhub_entity::session::{NewSession, SessionSummary, TokenPair};
use parkhub_entity::user::{CreateUser, PublicUser, User, UserRole};

use crate::context::{AuthContext, DeviceInfo};
use crate::error::{AuthError, AuthResult};
use crate::jwt::{JwtDecoder, JwtEncoder, RefreshRotator};
use crate::password::{PasswordHasher, PasswordValidator};
use crate::rbac::RbacEnforcer;
use crate::reset::{PasswordResetFlow, ResetNotifier};
use crate::revocation::RevocationRegistry;
use crate::session::{SessionPolicy, SessionStore};

/// Signup input.
#[derive(Debug, Clone)]
pub struct Signup {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// A user together with a freshly issued token pair.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: PublicUser,
    pub tokens: TokenPair,
    /// Set when the login came from a device unlike the user's other sessions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_warning: Option<String>,
    /// Sessions ended to stay within the concurrent-session limit.
    pub evicted_sessions: usize,
}

/// Entry point for every authentication operation.
#[derive(Clone)]
pub struct AuthManager {
    users: Arc<dyn UserRepository>,
    encoder: JwtEncoder,
    decoder: JwtDecoder,
    hasher: PasswordHasher,
    validator: PasswordValidator,
    rotator: RefreshRotator,
    sessions: SessionStore,
    revocations: RevocationRegistry,
    reset: PasswordResetFlow,
    rbac: RbacEnforcer,
    policy: SessionPolicy,
    max_failed_attempts: i32,
    lockout: chrono::Duration,
    session_retention: chrono::Duration,
    io_timeout: Duration,
    /// Verified against when the email is unknown, so both paths cost one
    /// Argon2 verification.
    dummy_hash: String,
}

impl std::fmt::Debug for AuthManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthManager")
            .field("policy", &self.policy)
            .field("io_timeout", &self.io_timeout)
            .finish()
    }
}

impl AuthManager {
    pub fn new(
        config: &AppConfig,
        repos: Repositories,
        cache: CacheManager,
        notifier: Arc<dyn ResetNotifier>,
    ) -> AppResult<Self> {
        let auth = &config.auth;
        let io_timeout = Duration::from_millis(config.storage.io_timeout_ms);

        let encoder = JwtEncoder::new(auth);
        let decoder = JwtDecoder::new(auth);
        let hasher = PasswordHasher::new(auth)?;
        let validator = PasswordValidator::new(auth);

        let revocations = RevocationRegistry::new(repos.revocations.clone(), cache, io_timeout);
        let sessions = SessionStore::new(
            repos.sessions.clone(),
            repos.refresh_tokens.clone(),
            revocations.clone(),
            encoder.access_ttl(),
            io_timeout,
        );
        let rotator = RefreshRotator::new(
            encoder.clone(),
            decoder.clone(),
            repos.users.clone(),
            repos.refresh_tokens.clone(),
            sessions.clone(),
            io_timeout,
        );
        let reset = PasswordResetFlow::new(
            repos.users.clone(),
            repos.reset_tokens.clone(),
            sessions.clone(),
            hasher.clone(),
            validator.clone(),
            notifier,
            chrono::Duration::minutes(auth.reset_token_ttl_minutes as i64),
            io_timeout,
        );

        let dummy_hash = hasher.hash_password(&Uuid::new_v4().to_string())?;

        Ok(Self {
            users: repos.users,
            encoder,
            decoder,
            hasher,
            validator,
            rotator,
            sessions,
            revocations,
            reset,
            rbac: RbacEnforcer::new(),
            policy: SessionPolicy::from(&config.session),
            max_failed_attempts: auth.max_failed_attempts,
            lockout: chrono::Duration::minutes(auth.lockout_duration_minutes as i64),
            session_retention: chrono::Duration::hours(config.session.retention_hours as i64),
            io_timeout,
            dummy_hash,
        })
    }

    /// Register a new account and open its first session.
    pub async fn signup(&self, input: Signup, device: &DeviceInfo) -> AuthResult<AuthSession> {
        let email = normalize_email(&input.email);
        self.validator
            .validate_strength(&input.password)
            .into_result()?;
        let password_hash = self.hasher.hash_password(&input.password)?;

        let created = deadline::within(
            self.io_timeout,
            "user create",
            self.users.create(&CreateUser {
                email,
                password_hash,
                first_name: input.first_name,
                last_name: input.last_name,
                role: UserRole::User,
            }),
        )
        .await;

        let user = match created {
            Ok(user) => user,
            Err(e) if e.is_conflict() => return Err(AuthError::DuplicateEmail),
            Err(e) => return Err(e.into()),
        };

        info!(user_id = %user.id, "User signed up");
        self.start_session(&user, device).await
    }

    /// Verify credentials and open a session.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        device: &DeviceInfo,
    ) -> AuthResult<AuthSession> {
        let email = normalize_email(email);
        let found = deadline::within(
            self.io_timeout,
            "user lookup",
            self.users.find_by_email(&email),
        )
        .await?;

        let Some(user) = found else {
            self.hasher.verify_password(password, &self.dummy_hash)?;
            return Err(AuthError::InvalidCredentials);
        };

        // The hash is checked before the lock so a locked account answers a
        // wrong password exactly like an unknown email.
        let now = Utc::now();
        let verified = self.hasher.verify_password(password, &user.password_hash)?;
        let locked = user.is_locked_at(now);

        if !verified {
            if locked {
                return Err(AuthError::InvalidCredentials);
            }
            let attempts = deadline::within(
                self.io_timeout,
                "failed login record",
                self.users.record_failed_login(
                    user.id,
                    self.max_failed_attempts,
                    now + self.lockout,
                    now,
                ),
            )
            .await?;
            if attempts >= self.max_failed_attempts {
                warn!(user_id = %user.id, attempts, "Account locked after failed logins");
            }
            return Err(AuthError::InvalidCredentials);
        }

        if let Some(until) = user.locked_until.filter(|_| locked) {
            return Err(AuthError::AccountLocked { until });
        }

        if !user.is_active {
            return Err(AuthError::AccountDeactivated);
        }

        deadline::within(
            self.io_timeout,
            "login record",
            self.users.record_successful_login(user.id, now),
        )
        .await?;

        let mut user = user;
        user.last_login_at = Some(now);
        user.failed_login_attempts = 0;
        user.locked_until = None;

        info!(user_id = %user.id, ip = device.ip_address.as_deref().unwrap_or("unknown"), "User logged in");
        self.start_session(&user, device).await
    }

    /// Rotate a refresh token into a new pair.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<AuthSession> {
        let (user, issued) = self.rotator.rotate(refresh_token).await?;
        Ok(AuthSession {
            user: user.to_public(),
            tokens: issued.pair,
            device_warning: None,
            evicted_sessions: 0,
        })
    }

    /// End the caller's session and revoke its token.
    pub async fn logout(&self, ctx: &AuthContext) -> AuthResult<()> {
        // A concurrent refresh may have moved the session onto a new access
        // token, so fall back to the family.
        let ended = self.sessions.delete_session(ctx.token_id, "logout").await?
            || self.sessions.end_family(ctx.family_id, "logout").await?;
        self.revocations.revoke(ctx.token_id, ctx.expires_at).await?;
        if !ended {
            self.sessions.revoke_family(ctx.family_id).await?;
        }
        info!(user_id = %ctx.user_id, "User logged out");
        Ok(())
    }

    /// End every session of the caller, including the current one.
    pub async fn logout_all(&self, ctx: &AuthContext) -> AuthResult<u64> {
        let count = self
            .sessions
            .revoke_all_for_user(ctx.user_id, None, "logout_all")
            .await?;
        // The current token may belong to an already-ended session.
        self.revocations.revoke(ctx.token_id, ctx.expires_at).await?;
        Ok(count)
    }

    /// Change the caller's password and end their other sessions.
    ///
    /// Returns the number of sessions ended.
    pub async fn change_password(
        &self,
        ctx: &AuthContext,
        current_password: &str,
        new_password: &str,
    ) -> AuthResult<u64> {
        let user = self.load_user(ctx.user_id).await?;

        if !self
            .hasher
            .verify_password(current_password, &user.password_hash)?
        {
            return Err(AuthError::WrongCurrentPassword);
        }
        self.validator.validate_strength(new_password).into_result()?;

        let password_hash = self.hasher.hash_password(new_password)?;
        deadline::within(
            self.io_timeout,
            "password update",
            self.users.update_password(user.id, &password_hash),
        )
        .await?;

        let revoked = self
            .sessions
            .revoke_all_for_user(user.id, Some(ctx.family_id), "password_change")
            .await?;
        info!(user_id = %user.id, revoked, "Password changed");
        Ok(revoked)
    }

    pub async fn request_password_reset(&self, email: &str) -> AuthResult<()> {
        self.reset.request_reset(email).await
    }

    pub async fn confirm_password_reset(&self, token: &str, new_password: &str) -> AuthResult<()> {
        self.reset.confirm_reset(token, new_password).await?;
        Ok(())
    }

    /// Active sessions of the caller, oldest first.
    pub async fn list_sessions(&self, ctx: &AuthContext) -> AuthResult<Vec<SessionSummary>> {
        let mut sessions = self.sessions.list_active(ctx.user_id).await?;
        sessions.sort_by_key(|s| (s.created_at, s.seq));
        Ok(sessions.iter().map(|s| s.summary()).collect())
    }

    /// Resolve a bearer token into the caller's identity.
    ///
    /// Order: signature and expiry, revocation, then the user's active flag.
    pub async fn authenticate(&self, token: &str) -> AuthResult<AuthContext> {
        let claims = self.decoder.verify_access(token)?;

        if self.revocations.is_revoked(claims.jti).await? {
            return Err(AuthError::TokenBlacklisted);
        }

        let user = deadline::within(
            self.io_timeout,
            "user lookup",
            self.users.find_by_id(claims.sub),
        )
        .await?
        .ok_or(AuthError::TokenInvalid)?;

        if !user.is_active {
            return Err(AuthError::AccountDeactivated);
        }

        self.sessions.touch(claims.jti).await;

        Ok(AuthContext {
            user_id: user.id,
            email: user.email,
            role: user.role,
            token_id: claims.jti,
            family_id: claims.fam,
            expires_at: claims.expires_at(),
        })
    }

    /// Remove blacklist entries whose tokens have expired.
    pub async fn prune_revocations(&self) -> AppResult<u64> {
        self.revocations.prune().await
    }

    /// Delete ended sessions past retention and expired refresh/reset records.
    pub async fn sweep_expired(&self) -> AuthResult<(u64, u64, u64)> {
        let (sessions, refresh) = self.sessions.sweep(self.session_retention).await?;
        let resets = self.reset.prune_expired().await?;
        Ok((sessions, refresh, resets))
    }

    pub fn rbac(&self) -> &RbacEnforcer {
        &self.rbac
    }

    async fn load_user(&self, id: Uuid) -> AuthResult<User> {
        deadline::within(self.io_timeout, "user lookup", self.users.find_by_id(id))
            .await?
            .ok_or(AuthError::Unauthenticated)
    }

    async fn start_session(&self, user: &User, device: &DeviceInfo) -> AuthResult<AuthSession> {
        let issued = self.encoder.issue(user, Uuid::new_v4())?;
        self.rotator.register(&issued).await?;

        let created = self
            .sessions
            .create_session(
                NewSession {
                    token_id: issued.access.jti,
                    family_id: issued.refresh.fam,
                    user_id: user.id,
                    role: user.role,
                    email: user.email.clone(),
                    device_fingerprint: device.fingerprint(),
                    user_agent: device.user_agent.clone(),
                    ip_address: device.ip_address.clone(),
                    expires_at: issued.refresh_expires_at(),
                },
                self.policy,
            )
            .await?;

        Ok(AuthSession {
            user: user.to_public(),
            tokens: issued.pair,
            device_warning: created
                .device_mismatch
                .then(|| "Login from a new device".to_string()),
            evicted_sessions: created.evicted.len(),
        })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
