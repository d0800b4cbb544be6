//! Periodic sweep deactivating stale sessions and purging old rows.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info};

use qaboard_core::error::AppError;
use qaboard_database::repositories::user::UserRepository;

use super::store::SessionStore;

/// Counts of rows touched by one cleanup cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CleanupReport {
    /// Active sessions deactivated for inactivity.
    pub inactive: u64,
    /// Active sessions deactivated for token expiry.
    pub expired: u64,
    /// Old session rows deleted past the retention window.
    pub deleted: u64,
}

impl CleanupReport {
    /// Total rows touched across all three steps.
    pub fn total(&self) -> u64 {
        self.inactive + self.expired + self.deleted
    }
}

/// Runs the three-step session sweep.
#[derive(Clone)]
pub struct SessionCleanup {
    /// Session store for the sweep statements.
    session_store: Arc<SessionStore>,
    /// User repository for presence reconciliation.
    user_repo: Arc<UserRepository>,
}

impl std::fmt::Debug for SessionCleanup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCleanup").finish()
    }
}

impl SessionCleanup {
    /// Creates a new cleanup job.
    pub fn new(session_store: Arc<SessionStore>, user_repo: Arc<UserRepository>) -> Self {
        Self {
            session_store,
            user_repo,
        }
    }

    /// Runs one cleanup cycle.
    ///
    /// Three bulk statements, each conditional on current row state, so
    /// overlapping runs are harmless: a row another run already handled
    /// simply stops matching.
    ///
    /// 1. Deactivate active sessions idle past the inactivity timeout
    /// 2. Deactivate active sessions past their absolute expiry
    /// 3. Delete rows older than the retention window
    ///
    /// After the sweep, any user left without an active session is marked
    /// offline so presence converges even for abandoned browsers.
    pub async fn run_cleanup(&self) -> Result<CleanupReport, AppError> {
        let now = Utc::now();

        let inactive = self.session_store.sweep_inactive(now).await?;
        let expired = self.session_store.sweep_expired(now).await?;
        let deleted = self.session_store.purge_old(now).await?;

        let report = CleanupReport {
            inactive,
            expired,
            deleted,
        };

        if report.total() > 0 {
            let offline = self.user_repo.mark_offline_without_active_sessions().await?;
            info!(
                inactive = report.inactive,
                expired = report.expired,
                deleted = report.deleted,
                marked_offline = offline,
                "Session cleanup completed"
            );
        }

        Ok(report)
    }

    /// Runs cleanup on a fixed interval until the task is aborted.
    ///
    /// An immediate first run catches sessions abandoned across a restart.
    /// Failures are logged and the loop keeps going.
    pub async fn run_periodic(self: Arc<Self>, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if let Err(e) = self.run_cleanup().await {
                error!(error = %e, "Session cleanup cycle failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_totals_all_three_steps() {
        let report = CleanupReport {
            inactive: 2,
            expired: 3,
            deleted: 5,
        };
        assert_eq!(report.total(), 10);
        assert_eq!(CleanupReport::default().total(), 0);
    }
}
