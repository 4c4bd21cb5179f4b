//! Convention layer consumed by curve construction.
//!
//! Calendars and day-count rules are injected as a [`ConventionLayer`]
//! implementation. Every method is a pure function of its arguments, so a
//! single instance can be shared across threads and builds.
//!
//! [`WeekendCalendar`] treats Saturdays, Sundays and an optional list of
//! caller-supplied holidays as non-business days. Richer calendars live
//! outside this crate and only need to implement the trait.
//!
//! # Example
//!
//! ```
//! use pricer_core::conventions::{ConventionLayer, WeekendCalendar};
//! use pricer_core::types::{BusinessDayConvention, Date, Tenor};
//!
//! let cal = WeekendCalendar::new();
//! let sat = Date::from_ymd(2025, 3, 1).unwrap();
//! assert!(!cal.is_business_day(sat));
//!
//! // 2025-03-31 + 1M lands on a Wednesday, no roll needed
//! let d = Date::from_ymd(2025, 3, 31).unwrap();
//! let rolled = cal.advance(d, Tenor::months(1), BusinessDayConvention::ModifiedFollowing);
//! assert_eq!(rolled, Date::from_ymd(2025, 4, 30).ok());
//! ```

use std::collections::BTreeSet;

use chrono::Weekday;

use crate::types::{BusinessDayConvention, Date, DayCountConvention, Tenor};

/// Day-count, calendar and rolling functions.
pub trait ConventionLayer: Send + Sync {
    /// Accrual fraction between two dates.
    fn day_count_fraction(&self, d1: Date, d2: Date, convention: DayCountConvention) -> f64 {
        convention.year_fraction(d1, d2)
    }

    /// Whether `date` is a good business day.
    fn is_business_day(&self, date: Date) -> bool;

    /// Roll `date` according to `convention`.
    fn adjust(&self, date: Date, convention: BusinessDayConvention) -> Date {
        match convention {
            BusinessDayConvention::Unadjusted => date,
            BusinessDayConvention::Following => self.following(date),
            BusinessDayConvention::Preceding => self.preceding(date),
            BusinessDayConvention::ModifiedFollowing => {
                let next = self.following(date);
                if next.month() != date.month() {
                    self.preceding(date)
                } else {
                    next
                }
            }
        }
    }

    /// First business day on or after `date`.
    fn following(&self, date: Date) -> Date {
        let mut d = date;
        while !self.is_business_day(d) {
            match d.succ() {
                Some(next) => d = next,
                None => break,
            }
        }
        d
    }

    /// Last business day on or before `date`.
    fn preceding(&self, date: Date) -> Date {
        let mut d = date;
        while !self.is_business_day(d) {
            match d.pred() {
                Some(prev) => d = prev,
                None => break,
            }
        }
        d
    }

    /// Add a tenor, then roll. `None` only on calendar overflow.
    fn advance(&self, date: Date, tenor: Tenor, convention: BusinessDayConvention) -> Option<Date> {
        date.add_tenor(tenor).map(|d| self.adjust(d, convention))
    }

    /// Move forward by `n` business days (`n == 0` rolls to the next business day).
    fn add_business_days(&self, date: Date, n: u32) -> Date {
        let mut d = self.following(date);
        let mut remaining = n;
        while remaining > 0 {
            match d.succ() {
                Some(next) => d = next,
                None => break,
            }
            if self.is_business_day(d) {
                remaining -= 1;
            }
        }
        d
    }
}

/// Weekends plus an explicit holiday set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeekendCalendar {
    holidays: BTreeSet<Date>,
}

impl WeekendCalendar {
    /// Calendar with weekends only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calendar with weekends and the given holidays.
    pub fn with_holidays<I: IntoIterator<Item = Date>>(holidays: I) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }

    /// Number of registered holidays.
    pub fn holiday_count(&self) -> usize {
        self.holidays.len()
    }
}

impl ConventionLayer for WeekendCalendar {
    fn is_business_day(&self, date: Date) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.holidays.contains(&date)
    }
}

/// Every calendar day is a business day. Useful for tests and for
/// instruments quoted on year-fraction schedules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullCalendar;

impl ConventionLayer for NullCalendar {
    fn is_business_day(&self, _date: Date) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    // ========================================
    // Rolling Tests
    // ========================================

    #[test]
    fn test_following_and_preceding() {
        let cal = WeekendCalendar::new();
        // 2025-03-01 is a Saturday
        assert_eq!(cal.following(d(2025, 3, 1)), d(2025, 3, 3));
        assert_eq!(cal.preceding(d(2025, 3, 1)), d(2025, 2, 28));
    }

    #[test]
    fn test_modified_following_month_end() {
        let cal = WeekendCalendar::new();
        // 2025-05-31 is a Saturday; following crosses into June
        assert_eq!(
            cal.adjust(d(2025, 5, 31), BusinessDayConvention::ModifiedFollowing),
            d(2025, 5, 30)
        );
        assert_eq!(
            cal.adjust(d(2025, 5, 31), BusinessDayConvention::Following),
            d(2025, 6, 2)
        );
        assert_eq!(
            cal.adjust(d(2025, 5, 31), BusinessDayConvention::Unadjusted),
            d(2025, 5, 31)
        );
    }

    #[test]
    fn test_holidays() {
        let cal = WeekendCalendar::with_holidays([d(2025, 12, 25), d(2025, 12, 26)]);
        assert_eq!(cal.holiday_count(), 2);
        assert!(!cal.is_business_day(d(2025, 12, 25)));
        assert_eq!(cal.following(d(2025, 12, 25)), d(2025, 12, 29));
    }

    #[test]
    fn test_add_business_days_skips_weekend() {
        let cal = WeekendCalendar::new();
        // Thursday + 2 business days = Monday
        assert_eq!(cal.add_business_days(d(2025, 3, 6), 2), d(2025, 3, 10));
        assert_eq!(cal.add_business_days(d(2025, 3, 8), 0), d(2025, 3, 10));
    }

    #[test]
    fn test_null_calendar() {
        let cal = NullCalendar;
        assert!(cal.is_business_day(d(2025, 3, 1)));
        assert_eq!(
            cal.advance(d(2025, 1, 1), Tenor::years(1), BusinessDayConvention::Following),
            Some(d(2026, 1, 1))
        );
    }

    #[test]
    fn test_day_count_fraction_delegates() {
        let cal = WeekendCalendar::new();
        let yf = cal.day_count_fraction(d(2025, 1, 1), d(2025, 7, 1), DayCountConvention::Act360);
        assert!((yf - 181.0 / 360.0).abs() < 1e-15);
    }
}
