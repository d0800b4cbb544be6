//! Session storage operations wrapping the database repository.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use uuid::Uuid;

use qaboard_core::config::SessionConfig;
use qaboard_core::error::AppError;
use qaboard_database::repositories::session::SessionRepository;
use qaboard_entity::session::Session;

/// Abstracts session persistence operations.
#[derive(Debug, Clone)]
pub struct SessionStore {
    /// Session database repository.
    repo: Arc<SessionRepository>,
    /// Session configuration.
    config: SessionConfig,
}

impl SessionStore {
    /// Creates a new session store.
    pub fn new(repo: Arc<SessionRepository>, config: SessionConfig) -> Self {
        Self { repo, config }
    }

    /// Generates a fresh opaque session token (32 random bytes, hex-encoded).
    pub fn generate_token() -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Creates a new active session record.
    pub async fn create_session(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, AppError> {
        let now = Utc::now();

        let session = Session {
            session_id: Uuid::new_v4(),
            user_id,
            token: token.to_string(),
            created_at: now,
            last_activity: now,
            expires_at,
            is_active: true,
        };

        self.repo.create(&session).await
    }

    /// Finds the active session for a user/token pair.
    pub async fn find_active(
        &self,
        user_id: Uuid,
        token: &str,
    ) -> Result<Option<Session>, AppError> {
        self.repo.find_active_by_user_and_token(user_id, token).await
    }

    /// Updates a session's last activity timestamp, if it is still active.
    ///
    /// Returns the number of rows touched; zero means the row was
    /// deactivated since it was read.
    pub async fn touch_activity(&self, session_id: Uuid, now: DateTime<Utc>) -> Result<u64, AppError> {
        self.repo.touch_activity(session_id, now).await
    }

    /// Deactivates every active session a user holds, returning the count.
    pub async fn deactivate_all_for_user(&self, user_id: Uuid) -> Result<u64, AppError> {
        self.repo.deactivate_all_for_user(user_id).await
    }

    /// Deactivates the active session matching a user/token pair.
    ///
    /// Zero rows touched means the session was already gone; callers treat
    /// that as success so logout stays idempotent.
    pub async fn deactivate(&self, user_id: Uuid, token: &str) -> Result<u64, AppError> {
        self.repo.deactivate(user_id, token).await
    }

    /// Deactivates a single session by ID.
    pub async fn deactivate_by_id(&self, session_id: Uuid) -> Result<u64, AppError> {
        self.repo.deactivate_by_id(session_id).await
    }

    /// Deactivates active sessions idle past the inactivity timeout.
    pub async fn sweep_inactive(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let cutoff = now - Duration::minutes(self.config.inactivity_timeout_minutes as i64);
        self.repo.sweep_inactive(cutoff).await
    }

    /// Deactivates active sessions whose tokens have expired.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        self.repo.sweep_expired(now).await
    }

    /// Deletes session rows older than the retention window.
    pub async fn purge_old(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let cutoff = now - Duration::days(self.config.retention_days as i64);
        self.repo.purge_older_than(cutoff).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_are_unique_hex() {
        let a = SessionStore::generate_token();
        let b = SessionStore::generate_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
