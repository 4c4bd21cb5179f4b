//! Time types and day count conventions for financial calculations.
//!
//! This module provides:
//! - `Date`: Type-safe date wrapper around chrono::NaiveDate
//! - `DayCountConvention`: Industry-standard day count conventions
//! - `BusinessDayConvention`: Rolling rules for non-business days
//! - `Tenor`: Market tenors such as `3M` or `10Y`
//!
//! # Examples
//!
//! ```
//! use pricer_core::types::time::{Date, DayCountConvention, Tenor};
//!
//! let start = Date::from_ymd(2025, 1, 2).unwrap();
//! let end = start.add_tenor("1Y".parse::<Tenor>().unwrap()).unwrap();
//! let yf = DayCountConvention::Act365Fixed.year_fraction(start, end);
//! assert!((yf - 1.0).abs() < 1e-12);
//! ```

use chrono::{Datelike, Days, Months, NaiveDate};
use std::fmt;
use std::ops::Sub;
use std::str::FromStr;

use super::error::DateError;

/// Type-safe date wrapper around chrono::NaiveDate.
///
/// Serialises as an ISO 8601 string.
///
/// # Examples
///
/// ```
/// use pricer_core::types::time::Date;
///
/// let date = Date::from_ymd(2024, 6, 15).unwrap();
/// let parsed: Date = "2024-06-15".parse().unwrap();
/// assert_eq!(date, parsed);
///
/// let start = Date::from_ymd(2024, 1, 1).unwrap();
/// let end = Date::from_ymd(2024, 1, 11).unwrap();
/// assert_eq!(end - start, 10);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Date(NaiveDate);

impl Date {
    /// Creates a Date from year, month, and day components.
    ///
    /// # Errors
    /// Returns `DateError::InvalidDate` if the components do not form a
    /// calendar date.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, DateError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Date)
            .ok_or(DateError::InvalidDate { year, month, day })
    }

    /// Parses an ISO 8601 date (`YYYY-MM-DD`).
    pub fn parse(s: &str) -> Result<Self, DateError> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Date)
            .map_err(|e| DateError::ParseError {
                input: s.to_string(),
                reason: e.to_string(),
            })
    }

    /// Returns the inner chrono date.
    pub fn into_inner(self) -> NaiveDate {
        self.0
    }

    /// Year component.
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Month component (1-12).
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Day-of-month component (1-31).
    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Day of week.
    pub fn weekday(&self) -> chrono::Weekday {
        self.0.weekday()
    }

    /// Next calendar day.
    pub fn succ(&self) -> Option<Self> {
        self.0.succ_opt().map(Date)
    }

    /// Previous calendar day.
    pub fn pred(&self) -> Option<Self> {
        self.0.pred_opt().map(Date)
    }

    /// Adds calendar days.
    pub fn add_days(&self, days: u64) -> Option<Self> {
        self.0.checked_add_days(Days::new(days)).map(Date)
    }

    /// Adds a tenor without business-day adjustment.
    ///
    /// Month and year arithmetic clamps to the end of the target month,
    /// so `2024-01-31 + 1M = 2024-02-29`.
    pub fn add_tenor(&self, tenor: Tenor) -> Option<Self> {
        let n = tenor.count;
        match tenor.unit {
            TenorUnit::Days => self.0.checked_add_days(Days::new(u64::from(n))),
            TenorUnit::Weeks => self.0.checked_add_days(Days::new(7 * u64::from(n))),
            TenorUnit::Months => self.0.checked_add_months(Months::new(n)),
            TenorUnit::Years => self.0.checked_add_months(Months::new(12 * n)),
        }
        .map(Date)
    }

    /// Subtracts whole months, clamping to month end.
    pub fn sub_months(&self, months: u32) -> Option<Self> {
        self.0.checked_sub_months(Months::new(months)).map(Date)
    }
}

impl From<NaiveDate> for Date {
    fn from(d: NaiveDate) -> Self {
        Date(d)
    }
}

impl Sub for Date {
    type Output = i64;

    /// Number of calendar days from `rhs` to `self`.
    fn sub(self, rhs: Self) -> Self::Output {
        (self.0 - rhs.0).num_days()
    }
}

impl FromStr for Date {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Date::parse(s)
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Day count conventions for accrual fractions.
///
/// # Examples
///
/// ```
/// use pricer_core::types::time::{Date, DayCountConvention};
///
/// let start = Date::from_ymd(2024, 1, 1).unwrap();
/// let end = Date::from_ymd(2024, 7, 1).unwrap();
/// // 182 days
/// let yf = DayCountConvention::Act360.year_fraction(start, end);
/// assert!((yf - 182.0 / 360.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DayCountConvention {
    /// Actual/365 Fixed
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "ACT/365F", alias = "ACT/365"))]
    Act365Fixed,
    /// Actual/360
    #[cfg_attr(feature = "serde", serde(rename = "ACT/360"))]
    Act360,
    /// 30/360 US Bond Basis
    #[cfg_attr(feature = "serde", serde(rename = "30/360"))]
    Thirty360,
    /// Actual/Actual ISDA: days in each calendar year over that year's length
    #[cfg_attr(feature = "serde", serde(rename = "ACT/ACT"))]
    ActActIsda,
}

impl DayCountConvention {
    /// Returns the standard convention name.
    pub fn name(&self) -> &'static str {
        match self {
            DayCountConvention::Act365Fixed => "ACT/365F",
            DayCountConvention::Act360 => "ACT/360",
            DayCountConvention::Thirty360 => "30/360",
            DayCountConvention::ActActIsda => "ACT/ACT",
        }
    }

    /// Year fraction from `start` to `end`.
    ///
    /// Negative when `end < start`.
    pub fn year_fraction(&self, start: Date, end: Date) -> f64 {
        if end < start {
            return -self.year_fraction(end, start);
        }
        match self {
            DayCountConvention::Act365Fixed => (end - start) as f64 / 365.0,
            DayCountConvention::Act360 => (end - start) as f64 / 360.0,
            DayCountConvention::Thirty360 => {
                let d1 = i64::from(start.day().min(30));
                let d2 = if end.day() == 31 && d1 == 30 {
                    30
                } else {
                    i64::from(end.day())
                };
                let days = 360 * i64::from(end.year() - start.year())
                    + 30 * (i64::from(end.month()) - i64::from(start.month()))
                    + (d2 - d1);
                days as f64 / 360.0
            }
            DayCountConvention::ActActIsda => {
                let (y1, y2) = (start.year(), end.year());
                if y1 == y2 {
                    return (end - start) as f64 / days_in_year(y1);
                }
                let start_next = NaiveDate::from_ymd_opt(y1 + 1, 1, 1).map(Date);
                let end_first = NaiveDate::from_ymd_opt(y2, 1, 1).map(Date);
                match (start_next, end_first) {
                    (Some(sn), Some(ef)) => {
                        (sn - start) as f64 / days_in_year(y1)
                            + f64::from(y2 - y1 - 1)
                            + (end - ef) as f64 / days_in_year(y2)
                    }
                    _ => (end - start) as f64 / 365.25,
                }
            }
        }
    }
}

fn days_in_year(year: i32) -> f64 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366.0
    } else {
        365.0
    }
}

impl FromStr for DayCountConvention {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ACT/365" | "ACT/365F" | "ACT365" => Ok(DayCountConvention::Act365Fixed),
            "ACT/360" | "ACT360" => Ok(DayCountConvention::Act360),
            "30/360" | "30360" => Ok(DayCountConvention::Thirty360),
            "ACT/ACT" | "ACTACT" => Ok(DayCountConvention::ActActIsda),
            _ => Err(DateError::ParseError {
                input: s.to_string(),
                reason: "unknown day count convention".to_string(),
            }),
        }
    }
}

impl fmt::Display for DayCountConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Business day rolling convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BusinessDayConvention {
    /// Next business day
    Following,
    /// Next business day unless that crosses a month end, then previous
    #[default]
    ModifiedFollowing,
    /// Previous business day
    Preceding,
    /// No adjustment
    Unadjusted,
}

impl BusinessDayConvention {
    /// Returns the convention name.
    pub fn name(&self) -> &'static str {
        match self {
            BusinessDayConvention::Following => "Following",
            BusinessDayConvention::ModifiedFollowing => "Modified Following",
            BusinessDayConvention::Preceding => "Preceding",
            BusinessDayConvention::Unadjusted => "Unadjusted",
        }
    }
}

impl fmt::Display for BusinessDayConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Unit of a [`Tenor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TenorUnit {
    /// Calendar days
    Days,
    /// Weeks of seven days
    Weeks,
    /// Calendar months
    Months,
    /// Calendar years
    Years,
}

/// A market tenor such as `2D`, `1W`, `6M` or `10Y`.
///
/// # Examples
///
/// ```
/// use pricer_core::types::time::{Tenor, TenorUnit};
///
/// let t: Tenor = "18M".parse().unwrap();
/// assert_eq!(t, Tenor::new(18, TenorUnit::Months));
/// assert_eq!(t.to_string(), "18M");
/// assert!((t.approx_years() - 1.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct Tenor {
    /// Number of units
    pub count: u32,
    /// Unit
    pub unit: TenorUnit,
}

impl Tenor {
    /// Creates a tenor.
    pub const fn new(count: u32, unit: TenorUnit) -> Self {
        Self { count, unit }
    }

    /// Tenor of `n` months.
    pub const fn months(n: u32) -> Self {
        Self::new(n, TenorUnit::Months)
    }

    /// Tenor of `n` years.
    pub const fn years(n: u32) -> Self {
        Self::new(n, TenorUnit::Years)
    }

    /// Tenor of `n` calendar days.
    pub const fn days(n: u32) -> Self {
        Self::new(n, TenorUnit::Days)
    }

    /// Whether the tenor has zero length.
    pub fn is_zero(&self) -> bool {
        self.count == 0
    }

    /// Length in years on a 365-day / 12-month basis, for ordering and sanity checks.
    pub fn approx_years(&self) -> f64 {
        let n = f64::from(self.count);
        match self.unit {
            TenorUnit::Days => n / 365.0,
            TenorUnit::Weeks => 7.0 * n / 365.0,
            TenorUnit::Months => n / 12.0,
            TenorUnit::Years => n,
        }
    }
}

impl FromStr for Tenor {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let err = |reason: &str| DateError::ParseError {
            input: s.to_string(),
            reason: reason.to_string(),
        };
        let unit_char = trimmed.chars().last().ok_or_else(|| err("empty tenor"))?;
        let unit = match unit_char.to_ascii_uppercase() {
            'D' => TenorUnit::Days,
            'W' => TenorUnit::Weeks,
            'M' => TenorUnit::Months,
            'Y' => TenorUnit::Years,
            _ => return Err(err("unit must be one of D, W, M, Y")),
        };
        let count = trimmed[..trimmed.len() - unit_char.len_utf8()]
            .parse::<u32>()
            .map_err(|_| err("count must be a non-negative integer"))?;
        Ok(Tenor::new(count, unit))
    }
}

impl TryFrom<String> for Tenor {
    type Error = DateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Tenor> for String {
    fn from(t: Tenor) -> Self {
        t.to_string()
    }
}

impl fmt::Display for Tenor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let u = match self.unit {
            TenorUnit::Days => 'D',
            TenorUnit::Weeks => 'W',
            TenorUnit::Months => 'M',
            TenorUnit::Years => 'Y',
        };
        write!(f, "{}{}", self.count, u)
    }
}
