//! In-memory user store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use parkhub_core::error::AppError;
use parkhub_core::result::AppResult;
use parkhub_entity::user::{CreateUser, User};

use crate::repositories::UserRepository;

#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    users: DashMap<Uuid, User>,
    /// Lowercased email to user id.
    emails: DashMap<String, Uuid>,
}

impl MemoryUserRepository {
    fn update<F>(&self, id: Uuid, apply: F) -> AppResult<User>
    where
        F: FnOnce(&mut User),
    {
        let mut user = self
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;
        apply(&mut user);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let id = match self.emails.get(&email.to_lowercase()) {
            Some(id) => *id,
            None => return Ok(None),
        };
        self.find_by_id(id).await
    }

    async fn create(&self, data: &CreateUser) -> AppResult<User> {
        let email = data.email.to_lowercase();
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.clone(),
            password_hash: data.password_hash.clone(),
            first_name: data.first_name.clone(),
            last_name: data.last_name.clone(),
            role: data.role,
            is_active: true,
            failed_login_attempts: 0,
            locked_until: None,
            two_factor_secret: None,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };

        match self.emails.entry(email) {
            Entry::Occupied(_) => Err(AppError::conflict("Email already registered")),
            Entry::Vacant(slot) => {
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(user)
            }
        }
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        self.update(id, |u| {
            u.password_hash = password_hash.to_string();
            u.failed_login_attempts = 0;
            u.locked_until = None;
        })?;
        Ok(())
    }

    async fn record_failed_login(
        &self,
        id: Uuid,
        max_attempts: i32,
        lock_until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<i32> {
        let user = self.update(id, |u| {
            if u.locked_until.is_some_and(|until| until <= now) {
                u.failed_login_attempts = 0;
                u.locked_until = None;
            }
            u.failed_login_attempts += 1;
            if u.failed_login_attempts >= max_attempts {
                u.locked_until = Some(lock_until);
            }
        })?;
        Ok(user.failed_login_attempts)
    }

    async fn record_successful_login(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        self.update(id, |u| {
            u.failed_login_attempts = 0;
            u.locked_until = None;
            u.last_login_at = Some(at);
        })?;
        Ok(())
    }

    async fn set_active(&self, id: Uuid, active: bool) -> AppResult<()> {
        self.update(id, |u| u.is_active = active)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parkhub_entity::user::UserRole;

    fn new_user(email: &str) -> CreateUser {
        CreateUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            first_name: None,
            last_name: None,
            role: UserRole::User,
        }
    }

    #[tokio::test]
    async fn test_email_is_case_insensitive_and_unique() {
        let repo = MemoryUserRepository::default();
        let created = repo.create(&new_user("Driver@Example.com")).await.unwrap();
        assert_eq!(created.email, "driver@example.com");

        let found = repo.find_by_email("DRIVER@example.COM").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(created.id));

        let dup = repo.create(&new_user("driver@EXAMPLE.com")).await.unwrap_err();
        assert!(dup.is_conflict());
    }

    #[tokio::test]
    async fn test_failed_logins_lock_at_threshold() {
        let repo = MemoryUserRepository::default();
        let user = repo.create(&new_user("a@b.co")).await.unwrap();
        let now = Utc::now();
        let until = now + chrono::Duration::minutes(30);

        assert_eq!(repo.record_failed_login(user.id, 2, until, now).await.unwrap(), 1);
        let mid = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert!(mid.locked_until.is_none());

        assert_eq!(repo.record_failed_login(user.id, 2, until, now).await.unwrap(), 2);
        let locked = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(locked.locked_until, Some(until));

        repo.update_password(user.id, "new").await.unwrap();
        let cleared = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(cleared.failed_login_attempts, 0);
        assert!(cleared.locked_until.is_none());
    }

    #[tokio::test]
    async fn test_expired_lock_restarts_the_count() {
        let repo = MemoryUserRepository::default();
        let user = repo.create(&new_user("late@b.co")).await.unwrap();
        let start = Utc::now();
        let until = start + chrono::Duration::minutes(30);

        repo.record_failed_login(user.id, 2, until, start).await.unwrap();
        repo.record_failed_login(user.id, 2, until, start).await.unwrap();

        let after = until + chrono::Duration::seconds(1);
        let next_until = after + chrono::Duration::minutes(30);
        let attempts = repo
            .record_failed_login(user.id, 2, next_until, after)
            .await
            .unwrap();
        assert_eq!(attempts, 1);

        let stored = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert!(stored.locked_until.is_none());
        assert!(!stored.is_locked_at(after));
    }
}
