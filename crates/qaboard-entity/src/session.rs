//! Session entity model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A server-persisted login session.
///
/// Sessions are the sole source of truth for bearer token validity: the
/// signed token embeds the session's `token` value, and both the signature
/// and the row must check out for a request to be authenticated. At most
/// one row per user has `is_active = TRUE` at any instant.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Unique session identifier, generated at creation.
    pub session_id: Uuid,
    /// The user this session belongs to.
    pub user_id: Uuid,
    /// High-entropy random value embedded in the bearer token's claims.
    pub token: String,
    /// When the session was created (login time). Drives the retention rule.
    pub created_at: DateTime<Utc>,
    /// Last observed activity, refreshed at most once per refresh interval.
    pub last_activity: DateTime<Utc>,
    /// Absolute expiry, independent of activity.
    pub expires_at: DateTime<Utc>,
    /// FALSE means the session is dead regardless of expiry or activity.
    pub is_active: bool,
}

impl Session {
    /// Check whether the absolute expiry has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// How long the session has been idle.
    pub fn idle_duration(&self, now: DateTime<Utc>) -> Duration {
        (now - self.last_activity).max(Duration::zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(now: DateTime<Utc>) -> Session {
        Session {
            session_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token: "ab".repeat(32),
            created_at: now,
            last_activity: now,
            expires_at: now + Duration::hours(24),
            is_active: true,
        }
    }

    #[test]
    fn expiry_is_inclusive_at_the_boundary() {
        let now = Utc::now();
        let mut session = sample(now);
        assert!(!session.is_expired(now));
        session.expires_at = now;
        assert!(session.is_expired(now));
    }

    #[test]
    fn idle_duration_never_goes_negative() {
        let now = Utc::now();
        let mut session = sample(now);
        session.last_activity = now + Duration::minutes(1);
        assert_eq!(session.idle_duration(now), Duration::zero());
    }
}
