//! Calendar-only date value type
//!
//! All actuals arithmetic happens at day granularity with no timezone. Dates
//! always render as `YYYY-MM-DD`.

use crate::error::ActualsError;
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// ISO-8601 day format used for every date string the crate emits
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    /// Build from year/month/day, `None` if the day does not exist
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Whether year/month/day names a real calendar day (e.g. no Feb 30)
    pub fn is_valid_day(year: i32, month: u32, day: u32) -> bool {
        NaiveDate::from_ymd_opt(year, month, day).is_some()
    }

    /// Parse a date as stored by the platform tables.
    ///
    /// Accepts plain `YYYY-MM-DD`, RFC 3339 timestamps and
    /// `YYYY-MM-DD HH:MM:SS`; time-of-day is dropped.
    pub fn parse(raw: &str) -> Result<Self, ActualsError> {
        let s = raw.trim();
        if let Ok(date) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
            return Ok(Self(date));
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self(ts.date_naive()));
        }
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return Ok(Self(ts.date()));
        }
        Err(ActualsError::InvalidDate(raw.to_string()))
    }

    /// Shift by a whole number of days (negative moves backwards).
    ///
    /// Saturates at the representable range instead of panicking.
    pub fn add_days(self, days: i64) -> Self {
        let shifted = if days >= 0 {
            self.0.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            self.0.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        match shifted {
            Some(date) => Self(date),
            None if days >= 0 => Self(NaiveDate::MAX),
            None => Self(NaiveDate::MIN),
        }
    }

    /// The following calendar day, `None` at the end of the representable range
    pub fn succ(self) -> Option<Self> {
        self.0.succ_opt().map(Self)
    }

    /// Signed number of days from `other` to `self`
    pub fn days_since(self, other: Self) -> i64 {
        (self.0 - other.0).num_days()
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl FromStr for CalendarDate {
    type Err = ActualsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CalendarDate {
    type Error = ActualsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CalendarDate> for String {
    fn from(date: CalendarDate) -> Self {
        date.to_string()
    }
}
