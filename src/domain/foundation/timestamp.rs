//! Timestamp value object for immutable points in time.
//!
//! Timestamps are kept at microsecond precision so that a value written to
//! Postgres (`TIMESTAMPTZ`) reads back bit-for-bit equal. Subscription records
//! rely on that equality because `updated_at` doubles as the concurrency token.

use chrono::{DateTime, Duration, Months, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: i64 = 86_400;

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment, truncated to microseconds.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>, truncated to microseconds.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        let truncated = dt.nanosecond() / 1_000 * 1_000;
        Self(dt.with_nanosecond(truncated).unwrap_or(dt))
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Checks if this timestamp is after another.
    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }

    /// Returns the duration from another timestamp to this one.
    ///
    /// Returns negative duration if other is after self.
    pub fn duration_since(&self, other: &Timestamp) -> Duration {
        self.0.signed_duration_since(other.0)
    }

    /// Creates a new timestamp by adding the specified number of days.
    ///
    /// Negative values subtract days.
    pub fn add_days(&self, days: i64) -> Self {
        self.shifted(Duration::try_days(days), days >= 0)
    }

    /// Creates a new timestamp by adding calendar months.
    ///
    /// Clamps to the last day of the target month (Jan 31 + 1 month = Feb 28/29).
    pub fn add_months(&self, months: u32) -> Self {
        match self.0.checked_add_months(Months::new(months)) {
            Some(dt) => Self(dt),
            None => self.add_days(i64::from(months) * 30),
        }
    }

    /// Creates a new timestamp by adding the specified number of minutes.
    pub fn add_minutes(&self, minutes: i64) -> Self {
        self.shifted(Duration::try_minutes(minutes), minutes >= 0)
    }

    /// Adds `delta`, clamping to chrono's range instead of overflowing.
    fn shifted(&self, delta: Option<Duration>, forward: bool) -> Self {
        match delta.and_then(|d| self.0.checked_add_signed(d)) {
            Some(dt) => Self(dt),
            None if forward => Self::from_datetime(DateTime::<Utc>::MAX_UTC),
            None => Self::from_datetime(DateTime::<Utc>::MIN_UTC),
        }
    }

    /// Creates a timestamp from Unix seconds.
    ///
    /// Returns `None` for values outside chrono's representable range.
    pub fn from_unix_secs(secs: i64) -> Option<Self> {
        Utc.timestamp_opt(secs, 0).single().map(Self)
    }

    /// Returns the timestamp as Unix seconds.
    pub fn as_unix_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Returns the earliest timestamp strictly after `previous` that is not
    /// before `self`.
    ///
    /// Used when stamping a mutation so that the new token always differs from
    /// the one it replaces, even when the clock has not advanced.
    pub fn succeeding(&self, previous: &Timestamp) -> Self {
        let floor = Self(previous.0 + Duration::microseconds(1));
        if *self >= floor {
            *self
        } else {
            floor
        }
    }

    /// Whole days remaining until `end`, rounded up. Zero once `end` has passed.
    pub fn days_until(&self, end: &Timestamp) -> i64 {
        let secs = end.duration_since(self).num_seconds();
        if secs <= 0 {
            return 0;
        }
        (secs + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339_opts(chrono::SecondsFormat::Micros, true))
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}
