//! Fixed-leg schedule generation.

use pricer_core::conventions::ConventionLayer;
use pricer_core::types::{BusinessDayConvention, Date};

use super::instrument::Frequency;

/// Front stubs shorter than this many days are merged into the next period.
const MIN_STUB_DAYS: i64 = 7;

/// Adjusted payment dates of a fixed leg from `start` to `unadjusted_end`.
///
/// Dates are generated backwards from the unadjusted end in whole periods,
/// so any stub falls at the front. Returns `None` on calendar overflow.
pub(crate) fn fixed_leg_dates(
    start: Date,
    unadjusted_end: Date,
    frequency: Frequency,
    conventions: &dyn ConventionLayer,
    bdc: BusinessDayConvention,
) -> Option<Vec<Date>> {
    let step = frequency.months();
    let mut unadjusted = vec![unadjusted_end];
    let mut k = 1;
    loop {
        let d = unadjusted_end.sub_months(step * k)?;
        if d <= start {
            break;
        }
        unadjusted.push(d);
        k += 1;
    }
    unadjusted.reverse();

    if unadjusted.len() > 1 && unadjusted[0] - start < MIN_STUB_DAYS {
        unadjusted.remove(0);
    }

    let mut dates: Vec<Date> = Vec::with_capacity(unadjusted.len());
    for d in unadjusted {
        let adj = conventions.adjust(d, bdc);
        if adj > start && dates.last().map_or(true, |&last| adj > last) {
            dates.push(adj);
        }
    }
    Some(dates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricer_core::conventions::{NullCalendar, WeekendCalendar};

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_quarterly_one_year() {
        let dates = fixed_leg_dates(
            d(2025, 1, 15),
            d(2026, 1, 15),
            Frequency::Quarterly,
            &NullCalendar,
            BusinessDayConvention::Unadjusted,
        )
        .unwrap();
        assert_eq!(
            dates,
            vec![d(2025, 4, 15), d(2025, 7, 15), d(2025, 10, 15), d(2026, 1, 15)]
        );
    }

    #[test]
    fn test_short_front_stub_is_merged() {
        // start three days before the first roll date
        let dates = fixed_leg_dates(
            d(2025, 1, 12),
            d(2026, 1, 15),
            Frequency::SemiAnnual,
            &NullCalendar,
            BusinessDayConvention::Unadjusted,
        )
        .unwrap();
        assert_eq!(dates, vec![d(2025, 7, 15), d(2026, 1, 15)]);
    }

    #[test]
    fn test_payment_dates_are_rolled() {
        // 2025-05-31 is a Saturday
        let dates = fixed_leg_dates(
            d(2024, 11, 30),
            d(2025, 5, 31),
            Frequency::Annual,
            &WeekendCalendar::new(),
            BusinessDayConvention::ModifiedFollowing,
        )
        .unwrap();
        assert_eq!(dates, vec![d(2025, 5, 30)]);
    }
}
