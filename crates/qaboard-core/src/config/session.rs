//! Session lifecycle configuration.

use serde::{Deserialize, Serialize};

/// Session lifecycle and cleanup configuration.
///
/// The inactivity threshold is measured against `last_activity`, which is
/// itself only refreshed once per `activity_refresh_minutes`. The 5/30
/// split bounds write amplification to one activity write per session per
/// refresh interval while keeping the inactivity clock accurate to within
/// that granularity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Inactivity threshold in minutes before a session is deactivated.
    #[serde(default = "default_inactivity_timeout")]
    pub inactivity_timeout_minutes: u64,
    /// Minimum interval in minutes between `last_activity` refreshes.
    #[serde(default = "default_activity_refresh")]
    pub activity_refresh_minutes: u64,
    /// Retention window in days; older rows are permanently deleted.
    #[serde(default = "default_retention")]
    pub retention_days: u64,
    /// Interval in minutes between in-process cleanup sweeps.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_minutes: u64,
    /// Shared secret for the externally triggered cleanup endpoint.
    #[serde(default = "default_cleanup_secret")]
    pub cleanup_secret: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout_minutes: default_inactivity_timeout(),
            activity_refresh_minutes: default_activity_refresh(),
            retention_days: default_retention(),
            cleanup_interval_minutes: default_cleanup_interval(),
            cleanup_secret: default_cleanup_secret(),
        }
    }
}

fn default_inactivity_timeout() -> u64 {
    30
}

fn default_activity_refresh() -> u64 {
    5
}

fn default_retention() -> u64 {
    30
}

fn default_cleanup_interval() -> u64 {
    5
}

fn default_cleanup_secret() -> String {
    "default-cron-secret".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_preserve_the_five_thirty_split() {
        let config = SessionConfig::default();
        assert_eq!(config.inactivity_timeout_minutes, 30);
        assert_eq!(config.activity_refresh_minutes, 5);
        assert!(config.activity_refresh_minutes < config.inactivity_timeout_minutes);
    }
}
