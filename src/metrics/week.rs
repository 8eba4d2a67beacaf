//! ISO week labels and boundaries.
//!
//! A week runs from Monday 00:00 UTC (inclusive) to the following Monday
//! 00:00 UTC (exclusive) and is labelled `YYYY-Www`.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;
use std::sync::OnceLock;

use super::errors::ValidationError;

/// Compiled `YYYY-Www` pattern, cached using OnceLock
static WEEK_LABEL: OnceLock<Option<Regex>> = OnceLock::new();

fn week_label_pattern() -> Option<&'static Regex> {
    WEEK_LABEL
        .get_or_init(|| Regex::new(r"^(\d{4})-W(\d{2})$").ok())
        .as_ref()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IsoWeek {
    year: i32,
    week: u32,
}

impl IsoWeek {
    pub fn new(year: i32, week: u32) -> Result<Self, ValidationError> {
        NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
            .map(|_| Self { year, week })
            .ok_or_else(|| ValidationError::InvalidWeekLabel {
                label: format!("{year:04}-W{week:02}"),
            })
    }

    /// The week containing `instant`.
    pub fn containing(instant: DateTime<Utc>) -> Self {
        let iso = instant.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn week(&self) -> u32 {
        self.week
    }

    pub fn label(&self) -> String {
        format!("{:04}-W{:02}", self.year, self.week)
    }

    fn monday(&self) -> NaiveDate {
        // Constructors validate the (year, week) pair
        NaiveDate::from_isoywd_opt(self.year, self.week, Weekday::Mon).unwrap_or_default()
    }

    /// Monday 00:00 UTC, inclusive.
    pub fn start(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.monday().and_time(chrono::NaiveTime::MIN))
    }

    /// Next Monday 00:00 UTC, exclusive.
    pub fn end(&self) -> DateTime<Utc> {
        self.start() + Duration::weeks(1)
    }

    /// Last instant still inside the week, used for point-in-time snapshots.
    pub fn last_instant(&self) -> DateTime<Utc> {
        self.end() - Duration::milliseconds(1)
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start() && instant < self.end()
    }

    pub fn previous(&self) -> Self {
        Self::containing(self.start() - Duration::days(1))
    }

    pub fn next(&self) -> Self {
        Self::containing(self.end())
    }

    /// The `count` weeks immediately before this one, oldest first.
    pub fn preceding(&self, count: u32) -> Vec<IsoWeek> {
        let mut weeks = Vec::with_capacity(count as usize);
        let mut cursor = *self;
        for _ in 0..count {
            cursor = cursor.previous();
            weeks.push(cursor);
        }
        weeks.reverse();
        weeks
    }
}

impl std::fmt::Display for IsoWeek {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-W{:02}", self.year, self.week)
    }
}

impl FromStr for IsoWeek {
    type Err = ValidationError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidWeekLabel {
            label: label.to_string(),
        };
        let captures = week_label_pattern()
            .and_then(|pattern| pattern.captures(label.trim()))
            .ok_or_else(invalid)?;
        let year: i32 = captures[1].parse().map_err(|_| invalid())?;
        let week: u32 = captures[2].parse().map_err(|_| invalid())?;
        IsoWeek::new(year, week).map_err(|_| invalid())
    }
}

impl Serialize for IsoWeek {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

impl<'de> Deserialize<'de> for IsoWeek {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}
