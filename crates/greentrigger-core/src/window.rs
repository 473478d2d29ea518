//! Time-of-day eligibility windows.
//!
//! A window is a recurring daily interval given as two free-form
//! time-of-day strings. When `from > to` the window wraps past midnight.
//! Everything here is evaluated at minute granularity.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TriggerError};

/// Formats accepted for window boundaries, tried in order.
const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M%p"];

/// A parsed daily window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub from: NaiveTime,
    pub to: NaiveTime,
}

impl TimeWindow {
    /// Parse both boundaries.
    ///
    /// # Errors
    /// Returns [`TriggerError::MalformedWindow`] naming the first boundary
    /// that could not be parsed.
    pub fn parse(from: &str, to: &str) -> Result<Self> {
        Ok(Self {
            from: parse_time_of_day(from)?,
            to: parse_time_of_day(to)?,
        })
    }

    /// Whether the window spans midnight.
    pub fn wraps_midnight(&self) -> bool {
        self.from > self.to
    }

    /// Whether `now` falls inside the window. Both ends are inclusive.
    pub fn contains(&self, now: NaiveTime) -> bool {
        let now = truncate_to_minute(now);
        if self.wraps_midnight() {
            now >= self.from || now <= self.to
        } else {
            self.from <= now && now <= self.to
        }
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.from.format("%H:%M"), self.to.format("%H:%M"))
    }
}

/// Parse a time-of-day string such as `"09:00"`, `"9:00"` or `"9:00 PM"`.
///
/// Seconds, when present, are dropped.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime> {
    let trimmed = value.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(trimmed, fmt).ok())
        .map(truncate_to_minute)
        .ok_or_else(|| TriggerError::MalformedWindow {
            value: value.to_string(),
        })
}

/// Decide whether `now` lies in the window described by `from` and `to`.
///
/// # Errors
/// Only fails when a boundary cannot be parsed.
pub fn in_window(from: &str, to: &str, now: NaiveTime) -> Result<bool> {
    Ok(TimeWindow::parse(from, to)?.contains(now))
}

fn truncate_to_minute(t: NaiveTime) -> NaiveTime {
    t.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(t)
}
