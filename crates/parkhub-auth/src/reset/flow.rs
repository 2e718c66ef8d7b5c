//! Request and confirm password resets.
//!
//! Raw tokens are 32 random bytes, URL-safe base64 encoded, handed to the
//! notifier and never stored. The store keeps their SHA-256 digest.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use parkhub_database::deadline;
use parkhub_database::repositories::{ResetConsume, ResetTokenRepository, UserRepository};
use parkhub_entity::reset::NewResetToken;
use parkhub_entity::user::User;

use crate::digest::sha256_hex;
use crate::error::{AuthError, AuthResult};
use crate::password::{PasswordHasher, PasswordValidator};
use crate::session::SessionStore;

use super::notifier::ResetNotifier;

/// Password-reset operations.
#[derive(Clone)]
pub struct PasswordResetFlow {
    users: Arc<dyn UserRepository>,
    reset_tokens: Arc<dyn ResetTokenRepository>,
    sessions: SessionStore,
    hasher: PasswordHasher,
    validator: PasswordValidator,
    notifier: Arc<dyn ResetNotifier>,
    token_ttl: chrono::Duration,
    io_timeout: Duration,
}

impl PasswordResetFlow {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: Arc<dyn UserRepository>,
        reset_tokens: Arc<dyn ResetTokenRepository>,
        sessions: SessionStore,
        hasher: PasswordHasher,
        validator: PasswordValidator,
        notifier: Arc<dyn ResetNotifier>,
        token_ttl: chrono::Duration,
        io_timeout: Duration,
    ) -> Self {
        Self {
            users,
            reset_tokens,
            sessions,
            hasher,
            validator,
            notifier,
            token_ttl,
            io_timeout,
        }
    }

    /// Start a reset for `email`.
    ///
    /// Completes the same way whether or not the account exists: issuing and
    /// delivering the token runs on a detached task, so the reply never
    /// waits on the token store or the notifier.
    pub async fn request_reset(&self, email: &str) -> AuthResult<()> {
        let email = email.trim().to_lowercase();
        let user = deadline::within(
            self.io_timeout,
            "user lookup",
            self.users.find_by_email(&email),
        )
        .await?;

        if let Some(user) = user.filter(|u| u.is_active) {
            let flow = self.clone();
            tokio::spawn(async move { flow.issue_token(user).await });
        }
        Ok(())
    }

    /// Store a fresh token for `user` and hand it to the notifier. Failures
    /// are logged only.
    async fn issue_token(&self, user: User) {
        let raw_token = generate_token();
        let record = NewResetToken {
            user_id: user.id,
            token_hash: sha256_hex(raw_token.as_bytes()),
            expires_at: Utc::now() + self.token_ttl,
        };

        let stored = match deadline::within(
            self.io_timeout,
            "reset token insert",
            self.reset_tokens.replace_for_user(&record),
        )
        .await
        {
            Ok(stored) => stored,
            Err(e) => {
                error!(user_id = %user.id, error = %e, "Failed to store reset token");
                return;
            }
        };

        if let Err(e) = self
            .notifier
            .send_reset_token(&user, &raw_token, stored.expires_at)
            .await
        {
            error!(user_id = %user.id, error = %e, "Failed to deliver reset token");
        }
    }

    /// Redeem `token` and set `new_password`. Ends every session of the user.
    pub async fn confirm_reset(&self, token: &str, new_password: &str) -> AuthResult<Uuid> {
        // Check strength first so a rejected password leaves the token usable.
        self.validator.validate_strength(new_password).into_result()?;
        let password_hash = self.hasher.hash_password(new_password)?;

        let outcome = deadline::within(
            self.io_timeout,
            "reset token redeem",
            self.reset_tokens.redeem(
                &sha256_hex(token.trim().as_bytes()),
                &password_hash,
                Utc::now(),
            ),
        )
        .await?;

        let redeemed = match outcome {
            ResetConsume::Consumed(redeemed) => redeemed,
            ResetConsume::AlreadyConsumed => return Err(AuthError::ResetTokenConsumed),
            ResetConsume::Expired => return Err(AuthError::ResetTokenExpired),
            ResetConsume::NotFound => return Err(AuthError::ResetTokenInvalid),
        };

        self.sessions
            .revoke_all_for_user(redeemed.user_id, None, "password_reset")
            .await?;

        info!(user_id = %redeemed.user_id, "Password reset completed");
        Ok(redeemed.user_id)
    }

    /// Delete tokens past their expiry.
    pub async fn prune_expired(&self) -> AuthResult<u64> {
        let removed = deadline::within(
            self.io_timeout,
            "reset token prune",
            self.reset_tokens.delete_expired(Utc::now()),
        )
        .await?;
        Ok(removed)
    }
}

fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revocation::RevocationRegistry;
    use crate::testing;
    use async_trait::async_trait;
    use chrono::DateTime;
    use parkhub_core::result::AppResult;
    use parkhub_database::Repositories;
    use parkhub_entity::user::{CreateUser, UserRole};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Captures raw tokens instead of delivering them.
    #[derive(Debug, Default)]
    struct CapturingNotifier {
        tokens: Mutex<Vec<String>>,
    }

    impl CapturingNotifier {
        fn count(&self) -> usize {
            self.tokens.lock().unwrap().len()
        }
    }

    /// Waits for the notifier task to deliver the `n`th token.
    async fn nth_token(notifier: &CapturingNotifier, n: usize) -> String {
        for _ in 0..200 {
            if notifier.count() >= n {
                return notifier.tokens.lock().unwrap()[n - 1].clone();
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("reset token {n} was never delivered");
    }

    /// Holds every delivery until released.
    #[derive(Debug, Default)]
    struct GatedNotifier {
        release: Notify,
        delivered: AtomicUsize,
    }

    #[async_trait]
    impl ResetNotifier for GatedNotifier {
        async fn send_reset_token(
            &self,
            _user: &User,
            _raw_token: &str,
            _expires_at: DateTime<Utc>,
        ) -> AppResult<()> {
            self.release.notified().await;
            self.delivered.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[async_trait]
    impl ResetNotifier for CapturingNotifier {
        async fn send_reset_token(
            &self,
            _user: &User,
            raw_token: &str,
            _expires_at: DateTime<Utc>,
        ) -> AppResult<()> {
            self.tokens.lock().unwrap().push(raw_token.to_string());
            Ok(())
        }
    }

    struct Fixture {
        repos: Repositories,
        flow: PasswordResetFlow,
        notifier: Arc<CapturingNotifier>,
        hasher: PasswordHasher,
    }

    fn fixture() -> Fixture {
        let notifier = Arc::new(CapturingNotifier::default());
        build(notifier.clone(), notifier)
    }

    /// `notifier` is what the fixture exposes; `delivery` is what the flow calls.
    fn build(notifier: Arc<CapturingNotifier>, delivery: Arc<dyn ResetNotifier>) -> Fixture {
        let config = testing::auth_config();
        let repos = testing::repositories();
        let revocations = RevocationRegistry::new(
            repos.revocations.clone(),
            testing::cache(),
            testing::io_timeout(),
        );
        let sessions = SessionStore::new(
            repos.sessions.clone(),
            repos.refresh_tokens.clone(),
            revocations,
            chrono::Duration::minutes(15),
            testing::io_timeout(),
        );
        let hasher = PasswordHasher::new(&config).unwrap();
        let flow = PasswordResetFlow::new(
            repos.users.clone(),
            repos.reset_tokens.clone(),
            sessions,
            hasher.clone(),
            PasswordValidator::new(&config),
            delivery,
            chrono::Duration::minutes(60),
            testing::io_timeout(),
        );
        Fixture {
            repos,
            flow,
            notifier,
            hasher,
        }
    }

    async fn register(f: &Fixture, email: &str) -> User {
        f.repos
            .users
            .create(&CreateUser {
                email: email.into(),
                password_hash: f.hasher.hash_password("Original#Pass1").unwrap(),
                first_name: None,
                last_name: None,
                role: UserRole::User,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_unknown_email_completes_silently() {
        let f = fixture();
        f.flow.request_reset("nobody@parkhub.test").await.unwrap();
        assert_eq!(f.notifier.count(), 0);
    }

    #[tokio::test]
    async fn test_request_does_not_wait_for_delivery() {
        let gate = Arc::new(GatedNotifier::default());
        let f = build(Arc::new(CapturingNotifier::default()), gate.clone());
        register(&f, "driver@parkhub.test").await;

        tokio::time::timeout(
            std::time::Duration::from_secs(1),
            f.flow.request_reset("driver@parkhub.test"),
        )
        .await
        .expect("request waited on the notifier")
        .unwrap();
        assert_eq!(gate.delivered.load(Ordering::SeqCst), 0);

        gate.release.notify_one();
        for _ in 0..200 {
            if gate.delivered.load(Ordering::SeqCst) == 1 {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("token was never delivered");
    }

    #[tokio::test]
    async fn test_token_is_single_use() {
        let f = fixture();
        let user = register(&f, "driver@parkhub.test").await;
        f.flow.request_reset("Driver@ParkHub.test").await.unwrap();
        let token = nth_token(&f.notifier, 1).await;

        let reset_for = f.flow.confirm_reset(&token, "Brand#New2pass").await.unwrap();
        assert_eq!(reset_for, user.id);

        let stored = f.repos.users.find_by_id(user.id).await.unwrap().unwrap();
        assert!(
            f.hasher
                .verify_password("Brand#New2pass", &stored.password_hash)
                .unwrap()
        );

        assert!(matches!(
            f.flow.confirm_reset(&token, "Another#New3pass").await,
            Err(AuthError::ResetTokenConsumed)
        ));
    }

    #[tokio::test]
    async fn test_weak_password_keeps_token_usable() {
        let f = fixture();
        register(&f, "driver@parkhub.test").await;
        f.flow.request_reset("driver@parkhub.test").await.unwrap();
        let token = nth_token(&f.notifier, 1).await;

        match f.flow.confirm_reset(&token, "weak").await {
            Err(AuthError::PasswordPolicyViolation(errors)) => assert_eq!(errors.len(), 4),
            other => panic!("expected policy violation, got {other:?}"),
        }
        assert!(f.flow.confirm_reset(&token, "Strong#Pass9").await.is_ok());
    }

    #[tokio::test]
    async fn test_new_request_supersedes_old_token() {
        let f = fixture();
        register(&f, "driver@parkhub.test").await;
        f.flow.request_reset("driver@parkhub.test").await.unwrap();
        let first = nth_token(&f.notifier, 1).await;
        f.flow.request_reset("driver@parkhub.test").await.unwrap();
        let second = nth_token(&f.notifier, 2).await;

        assert!(matches!(
            f.flow.confirm_reset(&first, "Strong#Pass9").await,
            Err(AuthError::ResetTokenInvalid)
        ));
        assert!(f.flow.confirm_reset(&second, "Strong#Pass9").await.is_ok());
    }

    #[tokio::test]
    async fn test_garbage_token_is_invalid() {
        let f = fixture();
        assert!(matches!(
            f.flow.confirm_reset("not-a-token", "Strong#Pass9").await,
            Err(AuthError::ResetTokenInvalid)
        ));
    }

    #[test]
    fn test_generated_tokens_are_url_safe() {
        let token = generate_token();
        assert_eq!(token.len(), 43);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }
}
