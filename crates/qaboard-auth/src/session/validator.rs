//! Per-request session validation.
//!
//! Every authenticated request passes through here. The timing rules live
//! in a pure function over explicit timestamps so they can be tested
//! without a database or a clock.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use qaboard_core::config::SessionConfig;
use qaboard_core::error::AppError;
use qaboard_database::repositories::user::UserRepository;
use qaboard_entity::session::Session;

use crate::jwt::{Claims, JwtDecoder};

use super::store::SessionStore;

/// Outcome of the pure timing check for an active session row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCheck {
    /// Token lifetime elapsed; deactivate and reject.
    Expired,
    /// Idle past the inactivity timeout; deactivate and reject.
    Inactive,
    /// Valid, and idle long enough to warrant a `last_activity` refresh.
    ValidRefresh,
    /// Valid, refreshed recently; skip the write.
    ValidFresh,
}

/// Applies the timing rules to a session's timestamps.
///
/// The inactivity timeout (default 30 min) bounds how long an untouched
/// session stays valid. The refresh interval (default 5 min) throttles the
/// `last_activity` write: a busy client still only writes once per
/// interval, so the inactivity measurement has up to one interval of slack.
pub fn check_session_timing(
    last_activity: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    now: DateTime<Utc>,
    config: &SessionConfig,
) -> SessionCheck {
    if expires_at <= now {
        return SessionCheck::Expired;
    }

    let idle = now - last_activity;
    if idle >= Duration::minutes(config.inactivity_timeout_minutes as i64) {
        return SessionCheck::Inactive;
    }
    if idle >= Duration::minutes(config.activity_refresh_minutes as i64) {
        return SessionCheck::ValidRefresh;
    }
    SessionCheck::ValidFresh
}

/// Validates bearer tokens against both the JWT signature and the
/// database session row.
#[derive(Clone)]
pub struct SessionValidator {
    /// JWT decoder for signature and expiry checks.
    jwt_decoder: Arc<JwtDecoder>,
    /// Session persistence.
    session_store: Arc<SessionStore>,
    /// User repository, for presence writes on forced deactivation.
    user_repo: Arc<UserRepository>,
    /// Session timing configuration.
    config: SessionConfig,
}

impl std::fmt::Debug for SessionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionValidator")
            .field("config", &self.config)
            .finish()
    }
}

impl SessionValidator {
    /// Creates a new session validator.
    pub fn new(
        jwt_decoder: Arc<JwtDecoder>,
        session_store: Arc<SessionStore>,
        user_repo: Arc<UserRepository>,
        config: SessionConfig,
    ) -> Self {
        Self {
            jwt_decoder,
            session_store,
            user_repo,
            config,
        }
    }

    /// Validates a bearer token and returns its claims and session row.
    ///
    /// Order of checks:
    ///
    /// 1. JWT signature and expiry
    /// 2. Active session row exists for (user, session token)
    /// 3. Session not past its absolute expiry
    /// 4. Session not idle past the inactivity timeout
    ///
    /// Failing 3 or 4 deactivates the row before rejecting, so the failure
    /// is also visible to other connected dashboards via the NOTIFY
    /// trigger. A passing check refreshes `last_activity` at most once per
    /// refresh interval.
    pub async fn validate(&self, token: &str) -> Result<(Claims, Session), AppError> {
        let claims = self.jwt_decoder.decode_token(token)?;

        let session = self
            .session_store
            .find_active(claims.sub, &claims.session_token)
            .await?
            .ok_or_else(|| AppError::session_inactive("Session is no longer active"))?;

        let now = Utc::now();
        match check_session_timing(session.last_activity, session.expires_at, now, &self.config) {
            SessionCheck::Expired => {
                self.deactivate_and_mark_offline(&session).await?;
                info!(session_id = %session.session_id, "Rejected expired session");
                Err(AppError::session_expired("Session has expired"))
            }
            SessionCheck::Inactive => {
                self.deactivate_and_mark_offline(&session).await?;
                info!(session_id = %session.session_id, "Rejected inactive session");
                Err(AppError::session_inactive("Session timed out due to inactivity"))
            }
            SessionCheck::ValidRefresh => {
                self.session_store
                    .touch_activity(session.session_id, now)
                    .await?;
                Ok((claims, session))
            }
            SessionCheck::ValidFresh => Ok((claims, session)),
        }
    }

    async fn deactivate_and_mark_offline(&self, session: &Session) -> Result<(), AppError> {
        self.session_store
            .deactivate_by_id(session.session_id)
            .await?;
        self.user_repo.mark_offline(session.user_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SessionConfig {
        SessionConfig::default()
    }

    #[test]
    fn expired_wins_over_inactive() {
        let now = Utc::now();
        // Both expired and idle; absolute expiry takes precedence.
        let check = check_session_timing(
            now - Duration::hours(2),
            now - Duration::minutes(1),
            now,
            &config(),
        );
        assert_eq!(check, SessionCheck::Expired);
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let now = Utc::now();
        let check = check_session_timing(now, now, now, &config());
        assert_eq!(check, SessionCheck::Expired);
    }

    #[test]
    fn idle_past_thirty_minutes_is_inactive() {
        let now = Utc::now();
        let check = check_session_timing(
            now - Duration::minutes(31),
            now + Duration::hours(1),
            now,
            &config(),
        );
        assert_eq!(check, SessionCheck::Inactive);
    }

    #[test]
    fn idle_between_five_and_thirty_refreshes() {
        let now = Utc::now();
        let check = check_session_timing(
            now - Duration::minutes(10),
            now + Duration::hours(1),
            now,
            &config(),
        );
        assert_eq!(check, SessionCheck::ValidRefresh);
    }

    #[test]
    fn recent_activity_skips_the_write() {
        let now = Utc::now();
        let check = check_session_timing(
            now - Duration::minutes(2),
            now + Duration::hours(1),
            now,
            &config(),
        );
        assert_eq!(check, SessionCheck::ValidFresh);
    }

    #[test]
    fn refresh_boundary_is_inclusive() {
        let now = Utc::now();
        let check = check_session_timing(
            now - Duration::minutes(5),
            now + Duration::hours(1),
            now,
            &config(),
        );
        assert_eq!(check, SessionCheck::ValidRefresh);
    }
}
