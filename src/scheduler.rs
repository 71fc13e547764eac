//! Periodic refresh scheduling.
//!
//! Pure time arithmetic: the scheduler only answers "is a check due at this
//! instant", callers own the clock and the actual refresh work. This keeps
//! the 30-minute cadence testable without sleeping.

use chrono::{DateTime, Utc};

/// How often the background loop re-evaluates cache freshness.
pub const CHECK_INTERVAL_MS: i64 = 30 * 60 * 1000; // 30 minutes in ms

pub struct RefreshScheduler {
    interval_ms: i64,
    last_check: Option<DateTime<Utc>>,
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self::with_interval(CHECK_INTERVAL_MS)
    }

    pub fn with_interval(interval_ms: i64) -> Self {
        Self {
            interval_ms,
            last_check: None,
        }
    }

    /// True when a freshness check is due at `now`. The first call is always
    /// due; later calls are due once a full interval has elapsed since the
    /// last due check.
    pub fn due(&mut self, now: DateTime<Utc>) -> bool {
        let due = match self.last_check {
            None => true,
            Some(last) => now.timestamp_millis() - last.timestamp_millis() >= self.interval_ms,
        };
        if due {
            self.last_check = Some(now);
        }
        due
    }
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new()
    }
}
