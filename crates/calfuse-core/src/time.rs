//! Time windows for provider queries.
//!
//! Providers are always asked for the same horizon: from "now" up to
//! [`FETCH_HORIZON_DAYS`] days ahead. [`TimeWindow::upcoming`] builds that
//! window so every adapter requests exactly the same range.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Number of days ahead of "now" that providers are queried for.
pub const FETCH_HORIZON_DAYS: i64 = 30;

/// A time window for querying calendar events.
///
/// Represents a half-open interval `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        assert!(start <= end, "TimeWindow start must be <= end");
        Self { start, end }
    }

    /// Creates a time window from a start time and duration.
    pub fn from_duration(start: DateTime<Utc>, duration: Duration) -> Self {
        Self::new(start, start + duration)
    }

    /// The standard fetch window: `[now, now + 30 days)`.
    pub fn upcoming(now: DateTime<Utc>) -> Self {
        Self::from_duration(now, Duration::days(FETCH_HORIZON_DAYS))
    }

    /// Returns the duration of this time window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Checks if a datetime falls within this window.
    ///
    /// Uses half-open interval semantics: `[start, end)`.
    pub fn contains(&self, dt: DateTime<Utc>) -> bool {
        self.start <= dt && dt < self.end
    }
}
