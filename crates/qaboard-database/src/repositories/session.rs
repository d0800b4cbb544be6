//! Session repository implementation.
//!
//! All state transitions are expressed as single conditional statements so
//! that concurrent callers race safely: whichever statement matches first
//! wins, and the loser's `rows_affected` comes back as zero.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use qaboard_core::error::{AppError, ErrorKind};
use qaboard_core::result::AppResult;
use qaboard_entity::session::Session;

/// Repository for session persistence and lifecycle queries.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new session row.
    pub async fn create(&self, session: &Session) -> AppResult<Session> {
        sqlx::query_as::<_, Session>(
            "INSERT INTO sessions (session_id, user_id, token, created_at, last_activity, expires_at, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(session.session_id)
        .bind(session.user_id)
        .bind(&session.token)
        .bind(session.created_at)
        .bind(session.last_activity)
        .bind(session.expires_at)
        .bind(session.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create session", e))
    }

    /// Find the active session matching a user and token pair.
    pub async fn find_active_by_user_and_token(
        &self,
        user_id: Uuid,
        token: &str,
    ) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE user_id = $1 AND token = $2 AND is_active = TRUE",
        )
        .bind(user_id)
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find session by token", e)
        })
    }

    /// Advance `last_activity` on a session that is still active.
    ///
    /// Guarded on `is_active` so a row deactivated between the caller's
    /// read and this write stays untouched; zero rows back means the
    /// session died in the meantime.
    pub async fn touch_activity(&self, session_id: Uuid, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE sessions SET last_activity = $2 WHERE session_id = $1 AND is_active = TRUE",
        )
        .bind(session_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update last activity", e)
        })?;
        Ok(result.rows_affected())
    }

    /// Deactivate every active session a user holds.
    ///
    /// Run before inserting a fresh session at login so a user never holds
    /// more than one active row.
    pub async fn deactivate_all_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        let result =
            sqlx::query("UPDATE sessions SET is_active = FALSE WHERE user_id = $1 AND is_active = TRUE")
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(
                        ErrorKind::Database,
                        "Failed to deactivate user sessions",
                        e,
                    )
                })?;
        Ok(result.rows_affected())
    }

    /// Deactivate the active session matching a user and token pair.
    ///
    /// Returns the number of rows touched; zero means the session was
    /// already inactive or never existed, which callers treat as success.
    pub async fn deactivate(&self, user_id: Uuid, token: &str) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE sessions SET is_active = FALSE \
             WHERE user_id = $1 AND token = $2 AND is_active = TRUE",
        )
        .bind(user_id)
        .bind(token)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to deactivate session", e)
        })?;
        Ok(result.rows_affected())
    }

    /// Deactivate a session by ID if it is still active.
    pub async fn deactivate_by_id(&self, session_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE sessions SET is_active = FALSE WHERE session_id = $1 AND is_active = TRUE",
        )
        .bind(session_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to deactivate session", e)
        })?;
        Ok(result.rows_affected())
    }

    /// Deactivate active sessions whose last activity predates the cutoff.
    pub async fn sweep_inactive(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE sessions SET is_active = FALSE WHERE is_active = TRUE AND last_activity < $1",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to sweep inactive sessions", e)
        })?;
        Ok(result.rows_affected())
    }

    /// Deactivate active sessions whose token lifetime has elapsed.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE sessions SET is_active = FALSE WHERE is_active = TRUE AND expires_at <= $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to sweep expired sessions", e)
        })?;
        Ok(result.rows_affected())
    }

    /// Delete session rows created before the retention cutoff.
    pub async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to purge old sessions", e)
            })?;
        Ok(result.rows_affected())
    }
}
