//! Rolling-window alert rate limiter.
//!
//! An explicit value type: send timestamps and the hourly cap live in
//! the struct, and the clock is always passed in, so tests construct a
//! fresh limiter and drive it with a simulated clock. Durable state
//! comes from the alert history file; this type never touches disk.

use chrono::{DateTime, Duration, Utc};

/// Caps alert sends to `max_per_hour` within a rolling one-hour window.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    sends: Vec<DateTime<Utc>>,
    max_per_hour: usize,
}

impl RateLimiter {
    /// Creates an empty limiter with the given hourly cap.
    #[must_use]
    pub const fn new(max_per_hour: usize) -> Self {
        Self {
            sends: Vec::new(),
            max_per_hour,
        }
    }

    /// Reconstructs a limiter from persisted send timestamps.
    #[must_use]
    pub const fn from_history(sends: Vec<DateTime<Utc>>, max_per_hour: usize) -> Self {
        Self {
            sends,
            max_per_hour,
        }
    }

    /// Returns `true` when fewer than the cap have been sent in the
    /// hour ending at `now`.
    #[must_use]
    pub fn can_send(&self, now: DateTime<Utc>) -> bool {
        let floor = now - Duration::hours(1);
        let recent = self
            .sends
            .iter()
            .filter(|sent| **sent > floor && **sent <= now)
            .count();
        recent < self.max_per_hour
    }

    /// Records a send at `now` and prunes entries older than 24 hours.
    pub fn record(&mut self, now: DateTime<Utc>) {
        self.sends.push(now);
        let floor = now - Duration::hours(24);
        self.sends.retain(|sent| *sent >= floor);
    }

    /// Number of retained send timestamps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sends.len()
    }

    /// Returns `true` when no sends are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sends.is_empty()
    }
}
