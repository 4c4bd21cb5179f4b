//! Integration tests for discount curve bootstrapping.
//!
//! These tests verify end-to-end behaviour of the bootstrapping module:
//! round-trip repricing, monotone discount factors, error reporting and
//! curve reuse through the cache.

use approx::assert_relative_eq;
use pricer_core::conventions::{NullCalendar, WeekendCalendar};
use pricer_core::market_data::curves::{Extrapolation, Interpolation, YieldCurve};
use pricer_core::types::{CalibrationError, Date, DayCountConvention, ErrorKind, Tenor};
use pricer_optimiser::bootstrapping::{
    BootstrapConfig, CurveBuilder, CurveCache, Fingerprint, Frequency, Instrument,
};
use proptest::prelude::*;

fn valuation() -> Date {
    Date::from_ymd(2025, 1, 1).unwrap()
}

fn usd_like() -> Vec<Instrument> {
    vec![
        Instrument::deposit(Tenor::days(7), 0.0430).with_day_count(DayCountConvention::Act360),
        Instrument::deposit(Tenor::months(1), 0.0432).with_day_count(DayCountConvention::Act360),
        Instrument::deposit(Tenor::months(3), 0.0435).with_day_count(DayCountConvention::Act360),
        Instrument::fra(Tenor::months(3), Tenor::months(6), 0.0420),
        Instrument::fra(Tenor::months(6), Tenor::months(9), 0.0405),
        Instrument::future(Tenor::months(9), Tenor::months(12), 96.10, 0.0002),
        Instrument::Swap {
            tenor: Tenor::years(2),
            rate: 0.0385,
            fixed_frequency: Frequency::SemiAnnual,
            day_count: DayCountConvention::Thirty360,
        },
        Instrument::swap(Tenor::years(3), 0.0378),
        Instrument::swap(Tenor::years(5), 0.0375),
        Instrument::swap(Tenor::years(10), 0.0390),
        Instrument::swap(Tenor::years(30), 0.0410),
    ]
}

// ============================================================================
// Round-Trip Tests
// ============================================================================

#[test]
fn test_round_trip_every_interpolation() {
    for rule in [
        Interpolation::LogLinear,
        Interpolation::LinearZero,
        Interpolation::CubicLogDiscount,
    ] {
        let config = BootstrapConfig::default()
            .with_interpolation(rule)
            .with_spot_lag(2);
        let result = CurveBuilder::new(config, valuation())
            .build(&usd_like(), &WeekendCalendar::new())
            .unwrap();

        for (inst, resolved) in usd_like().iter().zip(&result.instruments) {
            let implied = resolved.implied_quote(&result.curve).unwrap();
            assert_relative_eq!(implied, inst.quoted_value(), max_relative = 1e-8);
            assert!(resolved.present_value(&result.curve).unwrap().abs() < 1e-8);
        }
    }
}

#[test]
fn test_one_year_deposit_scenario() {
    let result = CurveBuilder::new(BootstrapConfig::default(), valuation())
        .build(&[Instrument::deposit(Tenor::years(1), 0.05)], &WeekendCalendar::new())
        .unwrap();
    let df = result.curve.discount_factor(1.0).unwrap();
    assert_relative_eq!(df, 1.0 / 1.05, max_relative = 1e-12);
    assert_relative_eq!(result.curve.zero_rate(1.0).unwrap(), 1.05f64.ln(), max_relative = 1e-12);
}

// ============================================================================
// Curve Domain Tests
// ============================================================================

#[test]
fn test_queries_beyond_last_pillar() {
    let quotes = [
        Instrument::deposit(Tenor::months(6), 0.03),
        Instrument::swap(Tenor::years(2), 0.031),
    ];
    let plain = CurveBuilder::new(BootstrapConfig::default(), valuation())
        .build(&quotes, &NullCalendar)
        .unwrap();
    let t_max = *plain.pillars.last().unwrap();
    match plain.curve.discount_factor(t_max + 0.5) {
        Err(CalibrationError::OutOfRange { max, .. }) => assert_eq!(max, t_max),
        other => panic!("expected OutOfRange, got {:?}", other),
    }

    let config = BootstrapConfig::default().with_extrapolation(Extrapolation::FlatForward);
    let extended = CurveBuilder::new(config, valuation())
        .build(&quotes, &NullCalendar)
        .unwrap();
    let df = extended.curve.discount_factor(t_max + 0.5).unwrap();
    assert!(df < extended.curve.discount_factor(t_max).unwrap());
}

#[test]
fn test_failure_context() {
    let quotes = [
        Instrument::deposit(Tenor::months(6), 0.03),
        Instrument::future(Tenor::months(3), Tenor::months(6), 0.0, 0.0),
    ];
    let err = CurveBuilder::new(BootstrapConfig::default(), valuation())
        .build(&quotes, &NullCalendar)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(err.to_string().contains("instrument #1"), "{err}");
}

// ============================================================================
// Cache Tests
// ============================================================================

#[test]
fn test_cache_reuses_identical_requests() {
    let builder = CurveBuilder::new(BootstrapConfig::default(), valuation());
    let mut cache = CurveCache::new();
    let cal = WeekendCalendar::new();

    let a = cache.get_or_bootstrap(&builder, &usd_like(), &cal).unwrap();
    let b = cache.get_or_bootstrap(&builder, &usd_like(), &cal).unwrap();
    assert!(std::sync::Arc::ptr_eq(&a, &b));

    let mut bumped = usd_like();
    bumped[8] = Instrument::swap(Tenor::years(5), 0.0376);
    let c = cache.get_or_bootstrap(&builder, &bumped, &cal).unwrap();
    assert_eq!(cache.len(), 2);
    assert!(c.discount_factor(5.0).unwrap() < a.discount_factor(5.0).unwrap());

    let fp = Fingerprint::of(&usd_like(), valuation(), builder.config());
    assert!(cache.invalidate(fp));
    assert_eq!(cache.len(), 1);
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_round_trip_and_monotone(
        base in 0.01f64..0.08,
        slope in -0.0002f64..0.004,
        cubic in any::<bool>(),
    ) {
        let tenors = [1u32, 2, 3, 5, 7, 10];
        let mut quotes = vec![Instrument::deposit(Tenor::months(6), base)];
        quotes.extend(tenors.iter().map(|&y| Instrument::swap(Tenor::years(y), base + slope * f64::from(y))));

        let rule = if cubic { Interpolation::CubicLogDiscount } else { Interpolation::LogLinear };
        let config = BootstrapConfig::default().with_interpolation(rule);
        let result = CurveBuilder::new(config, valuation()).build(&quotes, &WeekendCalendar::new()).unwrap();

        prop_assert!(result.max_relative_residual() < 1e-8);
        prop_assert!(result.discount_factors.windows(2).all(|w| w[1] < w[0]));

        let mut prev = 1.0;
        for i in 0..=400 {
            let t = 10.0 * f64::from(i) / 400.0;
            let df = result.curve.discount_factor(t).unwrap();
            prop_assert!(df <= prev + 1e-15, "{} rises at t = {}", rule, t);
            prev = df;
        }
    }
}
