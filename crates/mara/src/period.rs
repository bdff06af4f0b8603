//! Reporting periods and date windows.
//!
//! The provider encodes dates as fixed-width `YYYYMMDD` strings. The command
//! line uses `YYYY-MM-DD`.

use crate::error::{Error, Result};
use chrono::{Datelike, Local, NaiveDate};
use std::fmt;

const WIRE_FORMAT: &str = "%Y%m%d";
const CLI_FORMAT: &str = "%Y-%m-%d";

/// Start of the window when none is given on the command line.
pub fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default()
}

/// Parse a provider date. Exactly eight ASCII digits, valid calendar date.
pub fn parse_yyyymmdd(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(value, WIRE_FORMAT).ok()
}

/// Format a date the way the provider expects.
pub fn to_yyyymmdd(date: NaiveDate) -> String {
    date.format(WIRE_FORMAT).to_string()
}

/// Parse a command-line date.
pub fn parse_cli_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), CLI_FORMAT).map_err(|err| Error::InvalidDate {
        value: value.to_string(),
        reason: format!("expected YYYY-MM-DD ({})", err),
    })
}

/// Inclusive date window. `end >= start` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a window, rejecting `end < start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(Error::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Build a window from optional command-line dates.
    ///
    /// A missing start defaults to 2020-01-01, a missing end to today.
    pub fn from_cli(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        let start = start.map(parse_cli_date).transpose()?.unwrap_or_else(default_start);
        let end = end
            .map(parse_cli_date)
            .transpose()?
            .unwrap_or_else(|| Local::now().date_naive());
        Self::new(start, end)
    }

    /// First day of the window.
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the window.
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether `date` falls inside the window, bounds included.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// The window as provider `(start_date, end_date)` parameters.
    pub fn to_wire(&self) -> (String, String) {
        (to_yyyymmdd(self.start), to_yyyymmdd(self.end))
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Fiscal quarter selector. Quarter `0` means no filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Season(u8);

impl Season {
    /// Pass every period through.
    pub const ALL: Self = Self(0);
    /// Year-end periods only.
    pub const YEAR_END: Self = Self(4);

    /// Create a selector. Values above 4 are kept so validation can report them.
    pub const fn new(quarter: u8) -> Self {
        Self(quarter)
    }

    /// Raw quarter number.
    pub const fn quarter(self) -> u8 {
        self.0
    }

    /// Whether this selects one of the four quarters.
    pub const fn is_quarter(self) -> bool {
        matches!(self.0, 1..=4)
    }

    /// Whether `date` passes the filter.
    ///
    /// Anything other than 1 to 4 disables the filter.
    pub fn matches(self, date: NaiveDate) -> bool {
        !self.is_quarter() || is_quarter_end_of(date, self.0)
    }
}

/// Quarter (1 to 4) containing the month of `date`.
pub fn quarter_of(date: NaiveDate) -> u8 {
    // month0 is 0..=11
    (date.month0() / 3 + 1) as u8
}

/// Whether `date` is exactly Mar 31, Jun 30, Sep 30 or Dec 31.
pub fn is_quarter_end(date: NaiveDate) -> bool {
    matches!((date.month(), date.day()), (3, 31) | (6, 30) | (9, 30) | (12, 31))
}

fn is_quarter_end_of(date: NaiveDate, quarter: u8) -> bool {
    quarter_of(date) == quarter && is_quarter_end(date)
}
