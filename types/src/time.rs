//! Timestamp type and clock abstraction.
//!
//! Timestamps are Unix epoch seconds (UTC). Calendar dates (dates of birth and
//! the "today" used for age computation) are `chrono::NaiveDate` values derived
//! from a timestamp in UTC.

use crate::TypeError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    /// Get the current system time as a `Timestamp`.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before Unix epoch")
            .as_secs();
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// This timestamp moved `secs` into the past, saturating at the epoch.
    pub fn saturating_sub_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_sub(secs))
    }

    /// The instant as a UTC date-time, or `None` if it is outside chrono's range.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.0)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// The UTC calendar date of this instant.
    ///
    /// Instants beyond chrono's representable range map to `NaiveDate::MAX`.
    pub fn date(&self) -> NaiveDate {
        self.to_utc()
            .map(|dt| dt.date_naive())
            .unwrap_or(NaiveDate::MAX)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_utc() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%SZ")),
            None => write!(f, "{}s", self.0),
        }
    }
}

/// Parse an ISO-8601 calendar date (`YYYY-MM-DD`).
pub fn parse_date(input: &str) -> Result<NaiveDate, TypeError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| TypeError::InvalidDate {
        input: input.to_string(),
    })
}

/// Source of "now" for anything that stamps or compares wall-clock time.
///
/// Production code uses [`SystemClock`]; tests substitute a controllable
/// clock so window boundaries can be hit exactly.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// The operating-system wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}
