//! Calendar month arithmetic shared by every month-scoped query.
//!
//! All boundaries are UTC. A month runs from the first instant of day 1 to
//! the last millisecond of its final day, which is computed as "day 0 of the
//! following month".

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

/// An inclusive instant range: `start <= t <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// January 1st 00:00:00.000 through December 31st 23:59:59.999.
    pub fn year(year: i32) -> Option<Self> {
        let first = YearMonth::new(year, 1)?;
        let last = YearMonth::new(year, 12)?;
        Some(Self::new(first.start(), last.end()))
    }
}

impl From<YearMonth> for DateRange {
    fn from(month: YearMonth) -> Self {
        month.range()
    }
}

/// A calendar month within `MIN_YEAR..=MAX_YEAR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    first_day: NaiveDate,
    last_day: NaiveDate,
}

impl YearMonth {
    /// `month` is 1-based. Returns `None` outside the supported calendar.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) || !(1..=12).contains(&month) {
            return None;
        }
        let first_day = NaiveDate::from_ymd_opt(year, month, 1)?;
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        // Day 0 of the next month.
        let last_day = NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()?;
        Some(Self {
            first_day,
            last_day,
        })
    }

    /// Accepts any month number and rolls it into neighbouring years:
    /// month 13 of 2024 is January 2025, month 0 is December 2023.
    pub fn normalized(year: i32, month: i64) -> Option<Self> {
        let index = i64::from(year)
            .checked_mul(12)?
            .checked_add(month.checked_sub(1)?)?;
        let year = i32::try_from(index.div_euclid(12)).ok()?;
        let month = u32::try_from(index.rem_euclid(12)).ok()? + 1;
        Self::new(year, month)
    }

    /// The month containing `instant`, in UTC.
    pub fn containing(instant: DateTime<Utc>) -> Option<Self> {
        Self::new(instant.year(), instant.month())
    }

    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    pub fn month(&self) -> u32 {
        self.first_day.month()
    }

    /// Number of days in the month (28..=31).
    pub fn days(&self) -> u32 {
        self.last_day.day()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn last_day(&self) -> NaiveDate {
        self.last_day
    }

    /// First instant of day 1.
    pub fn start(&self) -> DateTime<Utc> {
        self.first_day.and_time(NaiveTime::MIN).and_utc()
    }

    /// Last millisecond of the last day.
    pub fn end(&self) -> DateTime<Utc> {
        let end_of_day =
            self.last_day.and_time(NaiveTime::MIN) + Duration::days(1) - Duration::milliseconds(1);
        end_of_day.and_utc()
    }

    pub fn range(&self) -> DateRange {
        DateRange::new(self.start(), self.end())
    }

    /// Moves by `delta` months in either direction, rolling over year
    /// boundaries. Returns `None` when leaving the supported calendar.
    pub fn shift(&self, delta: i32) -> Option<Self> {
        Self::normalized(self.year(), i64::from(self.month()) + i64::from(delta))
    }

    pub fn next(&self) -> Option<Self> {
        self.shift(1)
    }

    pub fn previous(&self) -> Option<Self> {
        self.shift(-1)
    }

    /// The twelve months of `year`, January first.
    pub fn months_of(year: i32) -> Option<Vec<Self>> {
        (1..=12).map(|month| Self::new(year, month)).collect()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for YearMonth {
    type Err = ParseYearMonthError;

    /// Parses `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseYearMonthError(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid month '{0}', expected YYYY-MM")]
pub struct ParseYearMonthError(pub String);
