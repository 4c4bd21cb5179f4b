//! End-to-end Heston calibration tests.
//!
//! Synthetic smiles are generated from known parameters with the same
//! semi-analytic pricer the calibrator uses, so a correct fit must recover
//! them.

use approx::{assert_abs_diff_eq, assert_relative_eq};
use pricer_core::market_data::{
    CurveOptions, DiscountCurve, FlatCurve, Interpolation, OptionType, SmileData, SmileQuote,
    YieldCurve,
};
use pricer_core::types::{ErrorKind, ErrorLocation};
use pricer_models::analytical::{implied_volatility, HestonPricer};
use pricer_models::calibration::{CalibratorConfig, HestonCalibrator};
use pricer_models::models::HestonParams;

const SPOT: f64 = 100.0;
const DIVIDEND: f64 = 0.01;

fn true_params() -> HestonParams {
    HestonParams::new(0.04, 1.5, 0.06, 0.5, -0.6).unwrap()
}

/// Implied-vol smile produced by `params` at `expiry`.
fn model_smile(params: &HestonParams, curve: &FlatCurve, expiry: f64, strikes: &[f64]) -> SmileData {
    let df = curve.discount_factor(expiry).unwrap();
    let forward = SPOT * (-DIVIDEND * expiry).exp() / df;
    let calls = HestonPricer::default().call_prices(params, forward, df, expiry, strikes);
    let quotes = strikes
        .iter()
        .zip(calls)
        .map(|(&k, c)| {
            let vol = implied_volatility(c, forward, k, expiry, df, OptionType::Call).unwrap();
            SmileQuote::new(k, expiry, vol)
        })
        .collect();
    SmileData::new(SPOT, expiry, DIVIDEND, quotes).unwrap()
}

fn quick_calibrator() -> HestonCalibrator {
    HestonCalibrator::new(CalibratorConfig::default().with_restarts(1))
}

// ============================================================================
// Self-consistency
// ============================================================================

#[test]
fn test_surface_fit_recovers_generating_parameters() {
    let curve = FlatCurve::new(0.03);
    let params = true_params();
    let strikes = [75.0, 85.0, 95.0, 100.0, 105.0, 115.0, 125.0];
    let smiles: Vec<SmileData> = [0.5, 1.0, 2.0]
        .iter()
        .map(|&t| model_smile(&params, &curve, t, &strikes))
        .collect();

    let fit = quick_calibrator().calibrate_surface(&smiles, &curve, None).unwrap();

    for (name, (got, want)) in HestonParams::NAMES
        .into_iter()
        .zip(fit.params.to_array().into_iter().zip(params.to_array()))
    {
        assert_relative_eq!(got, want, max_relative = 0.01);
        assert!(got.is_finite(), "{} not finite", name);
    }
    assert!(fit.diagnostics.converged);
    assert!(fit.diagnostics.rmse_vol < 1e-4);
    assert_eq!(fit.model_vols().len(), 3 * strikes.len());
}

#[test]
fn test_single_smile_fit_reproduces_vols() {
    let curve = FlatCurve::new(0.02);
    let smile = model_smile(&true_params(), &curve, 1.0, &[70.0, 80.0, 90.0, 100.0, 110.0, 120.0, 130.0]);

    let fit = quick_calibrator().calibrate(&smile, &curve, None).unwrap();

    for (model, market) in fit.model_vols().iter().zip(fit.market_vols()) {
        assert_relative_eq!(*model, *market, max_relative = 0.01);
    }
    assert!(fit.diagnostics.max_abs_vol_error <= 1e-3);
    assert!(fit.diagnostics.restarts_tried >= 1);
}

// ============================================================================
// Flat smile
// ============================================================================

#[test]
fn test_flat_smile_collapses_to_black() {
    let curve = FlatCurve::new(0.03);
    let quotes = [70.0, 80.0, 90.0, 100.0, 110.0, 120.0, 130.0]
        .iter()
        .map(|&k| SmileQuote::new(k, 1.0, 0.2))
        .collect();
    let smile = SmileData::new(SPOT, 1.0, DIVIDEND, quotes).unwrap();
    assert!(smile.is_flat());

    let fit = HestonCalibrator::new(CalibratorConfig::default())
        .calibrate(&smile, &curve, None)
        .unwrap();

    assert_abs_diff_eq!(fit.params.integrated_variance(1.0), 0.04, epsilon = 4e-4);
    assert!(fit.params.sigma < 0.05, "sigma = {}", fit.params.sigma);
    assert_abs_diff_eq!(fit.params.v0, 0.04, epsilon = 2e-3);
    assert_abs_diff_eq!(fit.params.theta, 0.04, epsilon = 2e-3);
    assert!(fit.diagnostics.rmse_vol <= 1e-3);
    assert_eq!(fit.diagnostics.restarts_tried, 5);
}

#[test]
fn test_flat_surface_collapses_to_black() {
    let curve = FlatCurve::new(0.01);
    let smiles: Vec<SmileData> = [0.5, 1.0, 2.0]
        .iter()
        .map(|&t| {
            let quotes = [80.0, 90.0, 100.0, 110.0, 120.0]
                .iter()
                .map(|&k| SmileQuote::new(k, t, 0.25))
                .collect();
            SmileData::new(SPOT, t, DIVIDEND, quotes).unwrap()
        })
        .collect();

    let fit = HestonCalibrator::new(CalibratorConfig::default())
        .calibrate_surface(&smiles, &curve, None)
        .unwrap();

    assert!(fit.params.sigma < 0.05, "sigma = {}", fit.params.sigma);
    assert_abs_diff_eq!(fit.params.v0, 0.0625, epsilon = 3e-3);
    assert_abs_diff_eq!(fit.params.theta, 0.0625, epsilon = 3e-3);
}

// ============================================================================
// Degenerate input
// ============================================================================

#[test]
fn test_four_quotes_are_invalid_input() {
    let quotes = [90.0, 95.0, 105.0, 110.0]
        .iter()
        .map(|&k| SmileQuote::new(k, 1.0, 0.2 + (k - 100.0).abs() * 1e-3))
        .collect();
    let smile = SmileData::new(SPOT, 1.0, 0.0, quotes).unwrap();
    let err = quick_calibrator()
        .calibrate(&smile, &FlatCurve::new(0.01), None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn test_identical_quotes_are_invalid_input() {
    let quotes = vec![SmileQuote::new(100.0, 1.0, 0.2); 8];
    let smile = SmileData::new(SPOT, 1.0, 0.0, quotes).unwrap();
    let err = quick_calibrator()
        .calibrate(&smile, &FlatCurve::new(0.01), None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn test_curve_shorter_than_expiry_is_out_of_range() {
    let curve = DiscountCurve::from_pillars(
        &[0.5, 1.0],
        &[0.99, 0.98],
        Interpolation::LogLinear,
        CurveOptions::default(),
    )
    .unwrap();
    let quotes = [80.0, 90.0, 100.0, 110.0, 120.0]
        .iter()
        .map(|&k| SmileQuote::new(k, 2.0, 0.2))
        .collect();
    let smile = SmileData::new(SPOT, 2.0, 0.0, quotes).unwrap();
    let err = quick_calibrator().calibrate(&smile, &curve, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutOfRange);
}

#[test]
fn test_unreachable_acceptance_is_non_convergent() {
    let curve = FlatCurve::new(0.0);
    // W-shaped smile no Heston parameter set can match
    let vols = [0.35, 0.2, 0.35, 0.2, 0.35];
    let quotes = [80.0, 90.0, 100.0, 110.0, 120.0]
        .iter()
        .zip(vols)
        .map(|(&k, v)| SmileQuote::new(k, 1.0, v))
        .collect();
    let smile = SmileData::new(SPOT, 1.0, 0.0, quotes).unwrap();
    let mut config = CalibratorConfig::default().with_restarts(0).with_acceptance_rmse(1e-6);
    config.lm.max_iterations = 30;

    let err = HestonCalibrator::new(config)
        .calibrate(&smile, &curve, None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NonConvergent);
    assert_eq!(err.location(), Some(ErrorLocation::Input));
}

// ============================================================================
// Batch
// ============================================================================

#[test]
fn test_batch_keeps_input_order() {
    let curve = FlatCurve::new(0.02);
    let good = model_smile(&true_params(), &curve, 1.0, &[80.0, 90.0, 100.0, 110.0, 120.0]);
    let bad = SmileData::new(SPOT, 1.0, 0.0, vec![SmileQuote::new(100.0, 1.0, 0.2)]).unwrap();

    let results = quick_calibrator().calibrate_batch(&[bad.clone(), good, bad], &curve);

    assert_eq!(results.len(), 3);
    assert!(results[0].is_err());
    assert!(results[1].is_ok());
    assert!(results[2].is_err());
}
