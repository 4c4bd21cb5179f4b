//! Black-76 pricing on the forward.
//!
//! Every other pricer in the workspace quotes through this module: market
//! vols become prices with [`black_price`], model prices become vols with
//! [`implied_volatility`].
//!
//! ```text
//! C = D (F N(d1) - K N(d2))
//! P = D (K N(-d2) - F N(-d1))
//! d1 = (ln(F/K) + σ²T/2) / (σ√T),  d2 = d1 - σ√T
//! ```
//!
//! # Example
//!
//! ```
//! use pricer_core::market_data::OptionType;
//! use pricer_models::analytical::black::{black_price, implied_volatility};
//!
//! let df = (-0.03_f64).exp();
//! let price = black_price(100.0, 105.0, 0.2, 1.0, df, OptionType::Call);
//! let vol = implied_volatility(price, 100.0, 105.0, 1.0, df, OptionType::Call).unwrap();
//! assert!((vol - 0.2).abs() < 1e-10);
//! ```

use pricer_core::market_data::OptionType;
use pricer_core::math::solvers::{BrentSolver, SolverConfig};
use pricer_core::types::{CalibrationError, ErrorLocation};

use super::distributions::{norm_cdf, norm_pdf};

/// Lower end of the implied-vol search interval.
pub const MIN_IMPLIED_VOL: f64 = 1e-6;
/// Upper end of the implied-vol search interval.
pub const MAX_IMPLIED_VOL: f64 = 5.0;

/// Black-76 price of a European option struck at `strike` on `forward`.
///
/// `forward`, `strike` and `discount` are expected positive. A zero total
/// vol (`σ√T <= 0`) returns the discounted intrinsic value.
pub fn black_price(
    forward: f64,
    strike: f64,
    vol: f64,
    expiry: f64,
    discount: f64,
    option_type: OptionType,
) -> f64 {
    let phi = option_type.sign();
    let total_vol = vol * expiry.max(0.0).sqrt();
    if !(total_vol > 0.0) {
        return discount * (phi * (forward - strike)).max(0.0);
    }
    let d1 = ((forward / strike).ln() + 0.5 * total_vol * total_vol) / total_vol;
    let d2 = d1 - total_vol;
    discount * phi * (forward * norm_cdf(phi * d1) - strike * norm_cdf(phi * d2))
}

/// Sensitivity of [`black_price`] to `vol` (same for calls and puts).
pub fn black_vega(forward: f64, strike: f64, vol: f64, expiry: f64, discount: f64) -> f64 {
    let sqrt_t = expiry.max(0.0).sqrt();
    let total_vol = vol * sqrt_t;
    if !(total_vol > 0.0) {
        return 0.0;
    }
    let d1 = ((forward / strike).ln() + 0.5 * total_vol * total_vol) / total_vol;
    discount * forward * norm_pdf(d1) * sqrt_t
}

/// No-arbitrage price bounds `(lower, upper)` for a European option.
pub fn price_bounds(
    forward: f64,
    strike: f64,
    discount: f64,
    option_type: OptionType,
) -> (f64, f64) {
    match option_type {
        OptionType::Call => (discount * (forward - strike).max(0.0), discount * forward),
        OptionType::Put => (discount * (strike - forward).max(0.0), discount * strike),
    }
}

/// Black implied volatility by Brent's method on
/// `[MIN_IMPLIED_VOL, MAX_IMPLIED_VOL]`.
///
/// # Errors
///
/// `InvalidInput` when the inputs are not positive and finite, when `price`
/// lies outside the no-arbitrage bounds, or when the implied vol falls
/// outside the search interval.
pub fn implied_volatility(
    price: f64,
    forward: f64,
    strike: f64,
    expiry: f64,
    discount: f64,
    option_type: OptionType,
) -> Result<f64, CalibrationError> {
    for (name, v) in [
        ("forward", forward),
        ("strike", strike),
        ("expiry", expiry),
        ("discount", discount),
    ] {
        if !(v > 0.0) || !v.is_finite() {
            return Err(CalibrationError::invalid_input(
                ErrorLocation::Parameter(name),
                format!("{} must be positive and finite, got {}", name, v),
            ));
        }
    }

    let (lower, upper) = price_bounds(forward, strike, discount, option_type);
    if !price.is_finite() || price <= lower || price >= upper {
        return Err(CalibrationError::invalid_input(
            ErrorLocation::Input,
            format!(
                "price {} outside no-arbitrage bounds ({}, {})",
                price, lower, upper
            ),
        ));
    }

    let objective = |vol: f64| black_price(forward, strike, vol, expiry, discount, option_type) - price;
    let f_lo = objective(MIN_IMPLIED_VOL);
    let f_hi = objective(MAX_IMPLIED_VOL);
    if f_lo > 0.0 || f_hi < 0.0 {
        return Err(CalibrationError::invalid_input(
            ErrorLocation::Input,
            format!(
                "implied vol for price {} outside [{}, {}]",
                price, MIN_IMPLIED_VOL, MAX_IMPLIED_VOL
            ),
        ));
    }
    if f_lo == 0.0 {
        return Ok(MIN_IMPLIED_VOL);
    }
    if f_hi == 0.0 {
        return Ok(MAX_IMPLIED_VOL);
    }

    let tolerance = (1e-14 * discount * forward.max(strike)).max(f64::MIN_POSITIVE);
    let solver = BrentSolver::new(SolverConfig::new(tolerance, 200));
    solver
        .find_root(objective, MIN_IMPLIED_VOL, MAX_IMPLIED_VOL)
        .map_err(|e| CalibrationError::from_solver(ErrorLocation::Input, e))
}
