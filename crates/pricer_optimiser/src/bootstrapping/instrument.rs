//! Bootstrap instrument definitions.
//!
//! [`Instrument`] is the quoted market instrument as the caller supplies it,
//! with tenors rather than dates. [`Instrument::resolve`] turns it into a
//! [`ResolvedInstrument`] holding dates, year fractions and the accrual
//! schedule, which is what the curve builder prices.
//!
//! Every kind is priced with the same single-curve formula
//!
//! ```text
//! implied = (D(s) - D(e)) / Σ τ_i D(t_i)
//! ```
//!
//! which for a single-period instrument reduces to `(D(s)/D(e) - 1) / τ`.

use std::fmt;

use pricer_core::conventions::ConventionLayer;
use pricer_core::market_data::curves::YieldCurve;
use pricer_core::types::{
    BusinessDayConvention, CalibrationError, Date, DayCountConvention, ErrorLocation, Tenor,
};

use super::schedule::fixed_leg_dates;

/// Fixed-leg payment frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Frequency {
    /// Annual payments (1 per year)
    #[default]
    Annual,
    /// Semi-annual payments (2 per year)
    SemiAnnual,
    /// Quarterly payments (4 per year)
    Quarterly,
    /// Monthly payments (12 per year)
    Monthly,
}

impl Frequency {
    /// Get the number of payments per year.
    pub fn payments_per_year(&self) -> u32 {
        match self {
            Frequency::Annual => 1,
            Frequency::SemiAnnual => 2,
            Frequency::Quarterly => 4,
            Frequency::Monthly => 12,
        }
    }

    /// Length of one period in months.
    pub fn months(&self) -> u32 {
        12 / self.payments_per_year()
    }
}

/// Kind tag of an [`Instrument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum InstrumentKind {
    /// Cash deposit
    Deposit,
    /// Forward rate agreement
    Fra,
    /// Interest rate future
    Future,
    /// Fixed-for-floating par swap
    Swap,
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InstrumentKind::Deposit => "Deposit",
            InstrumentKind::Fra => "FRA",
            InstrumentKind::Future => "Future",
            InstrumentKind::Swap => "Swap",
        };
        f.write_str(name)
    }
}

fn default_day_count() -> DayCountConvention {
    DayCountConvention::Act365Fixed
}

/// Market instruments for discount curve bootstrapping.
///
/// Start dates are relative to the spot date (valuation date plus the spot
/// lag, adjusted). Deposits and swaps start at spot; FRAs and futures start
/// at `spot + start`.
///
/// # Examples
///
/// ```
/// use pricer_optimiser::bootstrapping::{Instrument, InstrumentKind};
/// use pricer_core::types::Tenor;
///
/// let dep = Instrument::deposit(Tenor::months(3), 0.031);
/// assert_eq!(dep.kind(), InstrumentKind::Deposit);
/// assert_eq!(dep.quoted_value(), 0.031);
///
/// // 97.25 quotes a 2.75% rate; 1bp convexity adjustment
/// let fut = Instrument::future(Tenor::months(3), Tenor::months(6), 97.25, 0.0001);
/// assert!((fut.quoted_value() - 0.0274).abs() < 1e-15);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum Instrument {
    /// Cash deposit from spot to `spot + tenor`.
    Deposit {
        /// Length of the deposit
        tenor: Tenor,
        /// Simple rate (decimal)
        rate: f64,
        /// Accrual convention
        #[cfg_attr(feature = "serde", serde(default = "default_day_count"))]
        day_count: DayCountConvention,
    },

    /// Forward rate agreement over `[spot + start, spot + end]`.
    Fra {
        /// Start offset from spot
        start: Tenor,
        /// End offset from spot
        end: Tenor,
        /// Simple forward rate (decimal)
        rate: f64,
        /// Accrual convention
        #[cfg_attr(feature = "serde", serde(default = "default_day_count"))]
        day_count: DayCountConvention,
    },

    /// Interest rate future over `[spot + start, spot + end]`, quoted as a price.
    Future {
        /// Start offset from spot
        start: Tenor,
        /// End offset from spot
        end: Tenor,
        /// Quoted price, `100 - rate in percent`
        price: f64,
        /// Subtracted from the futures rate (decimal)
        #[cfg_attr(feature = "serde", serde(default))]
        convexity_adjustment: f64,
        /// Accrual convention
        #[cfg_attr(feature = "serde", serde(default = "default_day_count"))]
        day_count: DayCountConvention,
    },

    /// Par swap from spot to `spot + tenor`, single curve.
    Swap {
        /// Swap length
        tenor: Tenor,
        /// Fixed par rate (decimal)
        rate: f64,
        /// Fixed-leg frequency
        #[cfg_attr(feature = "serde", serde(default))]
        fixed_frequency: Frequency,
        /// Fixed-leg accrual convention
        #[cfg_attr(feature = "serde", serde(default = "default_day_count"))]
        day_count: DayCountConvention,
    },
}

impl Instrument {
    // ========================================
    // Factory Methods
    // ========================================

    /// Deposit with ACT/365F accrual.
    pub fn deposit(tenor: Tenor, rate: f64) -> Self {
        Self::Deposit {
            tenor,
            rate,
            day_count: DayCountConvention::Act365Fixed,
        }
    }

    /// FRA with ACT/365F accrual.
    pub fn fra(start: Tenor, end: Tenor, rate: f64) -> Self {
        Self::Fra {
            start,
            end,
            rate,
            day_count: DayCountConvention::Act365Fixed,
        }
    }

    /// Future with ACT/365F accrual.
    pub fn future(start: Tenor, end: Tenor, price: f64, convexity_adjustment: f64) -> Self {
        Self::Future {
            start,
            end,
            price,
            convexity_adjustment,
            day_count: DayCountConvention::Act365Fixed,
        }
    }

    /// Annual fixed-leg swap with ACT/365F accrual.
    pub fn swap(tenor: Tenor, rate: f64) -> Self {
        Self::Swap {
            tenor,
            rate,
            fixed_frequency: Frequency::Annual,
            day_count: DayCountConvention::Act365Fixed,
        }
    }

    /// Replace the accrual convention.
    pub fn with_day_count(mut self, convention: DayCountConvention) -> Self {
        match &mut self {
            Self::Deposit { day_count, .. }
            | Self::Fra { day_count, .. }
            | Self::Future { day_count, .. }
            | Self::Swap { day_count, .. } => *day_count = convention,
        }
        self
    }

    // ========================================
    // Common Accessors
    // ========================================

    /// Kind tag.
    pub fn kind(&self) -> InstrumentKind {
        match self {
            Self::Deposit { .. } => InstrumentKind::Deposit,
            Self::Fra { .. } => InstrumentKind::Fra,
            Self::Future { .. } => InstrumentKind::Future,
            Self::Swap { .. } => InstrumentKind::Swap,
        }
    }

    /// The rate the curve must reproduce.
    ///
    /// For futures, `(100 - price) / 100 - convexity_adjustment`.
    pub fn quoted_value(&self) -> f64 {
        match self {
            Self::Deposit { rate, .. } | Self::Fra { rate, .. } | Self::Swap { rate, .. } => *rate,
            Self::Future {
                price,
                convexity_adjustment,
                ..
            } => (100.0 - price) / 100.0 - convexity_adjustment,
        }
    }

    /// Accrual convention.
    pub fn day_count(&self) -> DayCountConvention {
        match self {
            Self::Deposit { day_count, .. }
            | Self::Fra { day_count, .. }
            | Self::Future { day_count, .. }
            | Self::Swap { day_count, .. } => *day_count,
        }
    }

    // ========================================
    // Validation Methods
    // ========================================

    /// Check the instrument's own fields.
    ///
    /// `index` is the position in the caller's sequence and is reported in
    /// the error.
    pub fn validate(&self, index: usize) -> Result<(), CalibrationError> {
        let at = ErrorLocation::Instrument(index);
        let quote = self.quoted_value();
        if !quote.is_finite() {
            return Err(CalibrationError::invalid_input(at, "quote must be finite"));
        }
        match self {
            Self::Deposit { tenor, .. } | Self::Swap { tenor, .. } => {
                if tenor.is_zero() {
                    return Err(CalibrationError::invalid_input(at, "tenor must be positive"));
                }
            }
            Self::Fra { start, end, .. } | Self::Future { start, end, .. } => {
                if end.is_zero() || !(end.approx_years() > start.approx_years()) {
                    return Err(CalibrationError::invalid_input(
                        at,
                        format!("start {} must precede end {}", start, end),
                    ));
                }
            }
        }
        if let Self::Future {
            price,
            convexity_adjustment,
            ..
        } = self
        {
            if !(*price > 0.0 && *price < 200.0) {
                return Err(CalibrationError::invalid_input(
                    at,
                    format!("futures price {} outside (0, 200)", price),
                ));
            }
            if !convexity_adjustment.is_finite() {
                return Err(CalibrationError::invalid_input(
                    at,
                    "convexity adjustment must be finite",
                ));
            }
        }
        Ok(())
    }

    // ========================================
    // Resolution
    // ========================================

    /// Resolve dates, times and accrual periods.
    ///
    /// Times are ACT/365F year fractions from `valuation`, the time axis of
    /// every curve in the workspace.
    pub fn resolve(
        &self,
        index: usize,
        valuation: Date,
        conventions: &dyn ConventionLayer,
        bdc: BusinessDayConvention,
        spot_lag: u32,
    ) -> Result<ResolvedInstrument, CalibrationError> {
        let at = ErrorLocation::Instrument(index);
        let overflow = || CalibrationError::invalid_input(at, "date arithmetic overflow");
        let spot = conventions.add_business_days(valuation, spot_lag);
        let day_count = self.day_count();
        let time = |d: Date| DayCountConvention::Act365Fixed.year_fraction(valuation, d);

        let (start_date, end_date, payments) = match self {
            Self::Deposit { tenor, .. } => {
                let end = conventions.advance(spot, *tenor, bdc).ok_or_else(overflow)?;
                (spot, end, vec![end])
            }
            Self::Fra { start, end, .. } | Self::Future { start, end, .. } => {
                let s = conventions.advance(spot, *start, bdc).ok_or_else(overflow)?;
                let e = conventions.advance(spot, *end, bdc).ok_or_else(overflow)?;
                (s, e, vec![e])
            }
            Self::Swap {
                tenor,
                fixed_frequency,
                ..
            } => {
                let unadjusted_end = spot.add_tenor(*tenor).ok_or_else(overflow)?;
                let dates = fixed_leg_dates(spot, unadjusted_end, *fixed_frequency, conventions, bdc)
                    .ok_or_else(overflow)?;
                let end = dates.last().copied().ok_or_else(overflow)?;
                (spot, end, dates)
            }
        };

        if !(end_date > start_date) {
            return Err(CalibrationError::invalid_input(
                at,
                format!("resolved end {} does not follow start {}", end_date, start_date),
            ));
        }

        let mut periods = Vec::with_capacity(payments.len());
        let mut prev = start_date;
        for pay in payments {
            let accrual = conventions.day_count_fraction(prev, pay, day_count);
            if !(accrual > 0.0) {
                return Err(CalibrationError::invalid_input(
                    at,
                    format!("non-positive accrual between {} and {}", prev, pay),
                ));
            }
            periods.push(AccrualPeriod {
                payment_date: pay,
                payment_time: time(pay),
                accrual,
            });
            prev = pay;
        }

        Ok(ResolvedInstrument {
            index,
            kind: self.kind(),
            quote: self.quoted_value(),
            start_date,
            end_date,
            start: time(start_date),
            end: time(end_date),
            periods,
        })
    }
}

/// One fixed-leg accrual period.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AccrualPeriod {
    /// Payment date (end of accrual)
    pub payment_date: Date,
    /// Payment time in years from valuation
    pub payment_time: f64,
    /// Accrual fraction
    pub accrual: f64,
}

/// Instrument with resolved dates and accrual periods.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ResolvedInstrument {
    /// Position in the caller's instrument sequence
    pub index: usize,
    /// Kind tag
    pub kind: InstrumentKind,
    /// Quoted rate to reproduce
    pub quote: f64,
    /// Accrual start date
    pub start_date: Date,
    /// Final payment date
    pub end_date: Date,
    /// Start time in years
    pub start: f64,
    /// Maturity time in years; the pillar this instrument determines
    pub end: f64,
    /// Fixed-leg periods (one for deposits, FRAs and futures)
    pub periods: Vec<AccrualPeriod>,
}

impl ResolvedInstrument {
    /// Pillar time.
    pub fn maturity(&self) -> f64 {
        self.end
    }

    /// `Σ τ_i D(t_i)` over the fixed periods.
    pub fn annuity<C: YieldCurve + ?Sized>(&self, curve: &C) -> Result<f64, CalibrationError> {
        self.periods.iter().try_fold(0.0, |acc, p| {
            Ok(acc + p.accrual * curve.discount_factor(p.payment_time)?)
        })
    }

    /// Rate implied by `curve`.
    pub fn implied_quote<C: YieldCurve + ?Sized>(&self, curve: &C) -> Result<f64, CalibrationError> {
        let ds = curve.discount_factor(self.start)?;
        let de = curve.discount_factor(self.end)?;
        let annuity = self.annuity(curve)?;
        Ok((ds - de) / annuity)
    }

    /// Value for unit notional receiving the quoted fixed rate.
    ///
    /// `annuity * (quote - implied)`, zero when the curve reprices the quote.
    pub fn present_value<C: YieldCurve + ?Sized>(&self, curve: &C) -> Result<f64, CalibrationError> {
        let ds = curve.discount_factor(self.start)?;
        let de = curve.discount_factor(self.end)?;
        let annuity = self.annuity(curve)?;
        Ok(self.quote * annuity - (ds - de))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pricer_core::conventions::{NullCalendar, WeekendCalendar};
    use pricer_core::market_data::curves::FlatCurve;
    use pricer_core::types::ErrorKind;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    // ========================================
    // Quote Tests
    // ========================================

    #[test]
    fn test_future_quote_conversion() {
        let fut = Instrument::future(Tenor::months(3), Tenor::months(6), 96.0, 0.0);
        assert_relative_eq!(fut.quoted_value(), 0.04, epsilon = 1e-15);
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        let bad_fra = Instrument::fra(Tenor::months(6), Tenor::months(3), 0.03);
        assert_eq!(bad_fra.validate(4).unwrap_err().location(), Some(ErrorLocation::Instrument(4)));

        let bad_fut = Instrument::future(Tenor::months(3), Tenor::months(6), 250.0, 0.0);
        assert_eq!(bad_fut.validate(0).unwrap_err().kind(), ErrorKind::InvalidInput);

        let nan = Instrument::deposit(Tenor::months(3), f64::NAN);
        assert!(nan.validate(0).is_err());

        let zero = Instrument::swap(Tenor::years(0), 0.03);
        assert!(zero.validate(0).is_err());
    }

    // ========================================
    // Resolution Tests
    // ========================================

    #[test]
    fn test_deposit_resolution_without_lag() {
        let r = Instrument::deposit(Tenor::years(1), 0.05)
            .resolve(0, d(2025, 1, 1), &WeekendCalendar::new(), BusinessDayConvention::ModifiedFollowing, 0)
            .unwrap();
        assert_eq!(r.end_date, d(2026, 1, 1));
        assert_eq!(r.start, 0.0);
        assert_eq!(r.end, 1.0);
        assert_eq!(r.periods.len(), 1);
        assert_eq!(r.periods[0].accrual, 1.0);
    }

    #[test]
    fn test_spot_lag_skips_weekend() {
        // 2025-03-06 is a Thursday; T+2 is Monday 2025-03-10
        let r = Instrument::deposit(Tenor::months(1), 0.03)
            .resolve(0, d(2025, 3, 6), &WeekendCalendar::new(), BusinessDayConvention::Following, 2)
            .unwrap();
        assert_eq!(r.start_date, d(2025, 3, 10));
        assert_relative_eq!(r.start, 4.0 / 365.0, epsilon = 1e-15);
    }

    #[test]
    fn test_swap_schedule_semi_annual() {
        let swap = Instrument::Swap {
            tenor: Tenor::years(2),
            rate: 0.03,
            fixed_frequency: Frequency::SemiAnnual,
            day_count: DayCountConvention::Act365Fixed,
        };
        let r = swap
            .resolve(0, d(2025, 1, 1), &NullCalendar, BusinessDayConvention::Unadjusted, 0)
            .unwrap();
        let dates: Vec<Date> = r.periods.iter().map(|p| p.payment_date).collect();
        assert_eq!(dates, vec![d(2025, 7, 1), d(2026, 1, 1), d(2026, 7, 1), d(2027, 1, 1)]);
    }

    // ========================================
    // Pricing Tests
    // ========================================

    #[test]
    fn test_single_period_formula() {
        let r = Instrument::fra(Tenor::months(6), Tenor::years(1), 0.03)
            .resolve(0, d(2025, 1, 1), &NullCalendar, BusinessDayConvention::Unadjusted, 0)
            .unwrap();
        let curve = FlatCurve::new(0.04);
        let ds = curve.discount_factor(r.start).unwrap();
        let de = curve.discount_factor(r.end).unwrap();
        let tau = r.periods[0].accrual;
        assert_relative_eq!(r.implied_quote(&curve).unwrap(), (ds / de - 1.0) / tau, max_relative = 1e-14);
    }

    #[test]
    fn test_present_value_zero_at_par() {
        let r = Instrument::swap(Tenor::years(5), 0.0)
            .resolve(0, d(2025, 1, 1), &WeekendCalendar::new(), BusinessDayConvention::ModifiedFollowing, 2)
            .unwrap();
        let curve = FlatCurve::new(0.035);
        let par = r.implied_quote(&curve).unwrap();
        let at_par = ResolvedInstrument { quote: par, ..r.clone() };
        assert!(at_par.present_value(&curve).unwrap().abs() < 1e-15);
        let above = ResolvedInstrument { quote: par + 0.01, ..r };
        assert!(above.present_value(&curve).unwrap() > 0.0);
    }
}
