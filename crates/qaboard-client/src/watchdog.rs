//! Idle warning and forced-logout timing.
//!
//! Pure over an injected clock: the caller records activity and polls,
//! and the watchdog only ever reports what the timestamps imply.

use chrono::{DateTime, Duration, Utc};

/// Idle time before the warning fires.
const WARN_AFTER_MINUTES: i64 = 25;

/// Idle time before forced logout.
const LOGOUT_AFTER_MINUTES: i64 = 30;

/// Minimum gap between activity resets.
const RESET_THROTTLE_SECONDS: i64 = 60;

/// What the caller should do right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleVerdict {
    /// Nothing to do.
    Active,
    /// Show the idle warning (fires once per idle stretch).
    Warn,
    /// Log the user out.
    ForceLogout,
}

/// Tracks user idle time against the warning and logout deadlines.
#[derive(Debug, Clone)]
pub struct IdleWatchdog {
    last_activity: DateTime<Utc>,
    warned: bool,
}

impl IdleWatchdog {
    /// Creates a watchdog with activity anchored at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            last_activity: now,
            warned: false,
        }
    }

    /// Records user activity.
    ///
    /// Throttled: resets within sixty seconds of the last accepted one
    /// are ignored, so a stream of input events costs one write per
    /// minute instead of one per keystroke. Returns whether the reset
    /// was accepted.
    pub fn record_activity(&mut self, now: DateTime<Utc>) -> bool {
        if now - self.last_activity < Duration::seconds(RESET_THROTTLE_SECONDS) {
            return false;
        }
        self.last_activity = now;
        self.warned = false;
        true
    }

    /// Checks the deadlines.
    ///
    /// `Warn` is reported once per idle stretch; repeated polls after the
    /// warning return `Active` until either activity resets the stretch
    /// or the logout deadline passes.
    pub fn poll(&mut self, now: DateTime<Utc>) -> IdleVerdict {
        let idle = now - self.last_activity;

        if idle >= Duration::minutes(LOGOUT_AFTER_MINUTES) {
            return IdleVerdict::ForceLogout;
        }
        if idle >= Duration::minutes(WARN_AFTER_MINUTES) && !self.warned {
            self.warned = true;
            return IdleVerdict::Warn;
        }
        IdleVerdict::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warns_once_then_forces_logout() {
        let start = Utc::now();
        let mut dog = IdleWatchdog::new(start);

        assert_eq!(dog.poll(start + Duration::minutes(24)), IdleVerdict::Active);
        assert_eq!(dog.poll(start + Duration::minutes(25)), IdleVerdict::Warn);
        // Warning does not repeat.
        assert_eq!(dog.poll(start + Duration::minutes(26)), IdleVerdict::Active);
        assert_eq!(
            dog.poll(start + Duration::minutes(30)),
            IdleVerdict::ForceLogout
        );
    }

    #[test]
    fn activity_resets_the_idle_stretch() {
        let start = Utc::now();
        let mut dog = IdleWatchdog::new(start);

        assert_eq!(dog.poll(start + Duration::minutes(25)), IdleVerdict::Warn);
        assert!(dog.record_activity(start + Duration::minutes(26)));

        // Fresh stretch: the warning can fire again.
        assert_eq!(
            dog.poll(start + Duration::minutes(26) + Duration::minutes(24)),
            IdleVerdict::Active
        );
        assert_eq!(
            dog.poll(start + Duration::minutes(26) + Duration::minutes(25)),
            IdleVerdict::Warn
        );
    }

    #[test]
    fn resets_are_throttled_to_one_per_minute() {
        let start = Utc::now();
        let mut dog = IdleWatchdog::new(start);

        assert!(!dog.record_activity(start + Duration::seconds(30)));
        assert!(!dog.record_activity(start + Duration::seconds(59)));
        assert!(dog.record_activity(start + Duration::seconds(60)));

        // The accepted reset moved the anchor.
        assert!(!dog.record_activity(start + Duration::seconds(90)));
        assert!(dog.record_activity(start + Duration::seconds(121)));
    }

    #[test]
    fn throttled_resets_do_not_postpone_logout() {
        let start = Utc::now();
        let mut dog = IdleWatchdog::new(start);

        // Last accepted activity is at +60s; everything after is dropped.
        assert!(dog.record_activity(start + Duration::seconds(60)));
        assert!(!dog.record_activity(start + Duration::seconds(90)));

        let logout_at = start + Duration::seconds(60) + Duration::minutes(30);
        assert_eq!(dog.poll(logout_at), IdleVerdict::ForceLogout);
    }
}
