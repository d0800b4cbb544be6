//! User repository implementation.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use qaboard_core::error::{AppError, ErrorKind};
use qaboard_core::result::AppResult;
use qaboard_entity::user::User;

/// Repository for user lookups and presence state.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by primary key.
    pub async fn find_by_id(&self, user_id: Uuid) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by id", e))
    }

    /// Find a user by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find user by email", e)
            })
    }

    /// Mark a user online and stamp the login time.
    ///
    /// The `is_online` write fires the user status trigger, so connected
    /// dashboards see the presence change without polling.
    pub async fn mark_online(&self, user_id: Uuid, login_at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            "UPDATE users SET is_online = TRUE, last_login_at = $2, updated_at = NOW() \
             WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(login_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark user online", e))?;
        Ok(())
    }

    /// Mark a user offline.
    pub async fn mark_offline(&self, user_id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE users SET is_online = FALSE, updated_at = NOW() WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to mark user offline", e)
            })?;
        Ok(())
    }

    /// Mark offline every user whose sessions were all deactivated.
    ///
    /// Used by the cleanup job after a sweep so presence converges even when
    /// the owning browser never sent a logout.
    pub async fn mark_offline_without_active_sessions(&self) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE users SET is_online = FALSE, updated_at = NOW() \
             WHERE is_online = TRUE AND NOT EXISTS \
             (SELECT 1 FROM sessions WHERE sessions.user_id = users.user_id AND sessions.is_active = TRUE)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to reconcile user presence", e)
        })?;
        Ok(result.rows_affected())
    }
}
