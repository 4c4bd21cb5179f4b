//! Payoff estimators over a [`PathSet`].

use pricer_core::market_data::curves::YieldCurve;
use pricer_core::market_data::OptionType;
use pricer_core::types::{CalibrationError, ErrorLocation};

use super::paths::PathSet;

/// Monte Carlo estimate with its standard error.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct McEstimate {
    /// Discounted sample mean.
    pub price: f64,
    /// Standard error of `price`; NaN with fewer than two samples.
    pub std_error: f64,
    /// Independent samples behind the estimate (pairs count once when
    /// antithetic).
    pub n_samples: usize,
}

impl McEstimate {
    /// Whether `reference` lies within `k` standard errors of the estimate.
    pub fn is_within(&self, reference: f64, k: f64) -> bool {
        (self.price - reference).abs() <= k * self.std_error
    }
}

/// European option value from the terminal spots of `paths`.
///
/// Discounts with `curve` at the path horizon. Antithetic twins are
/// averaged before the standard error is taken.
///
/// # Errors
///
/// `InvalidInput` for a non-positive strike; the curve's error at the
/// horizon.
pub fn european_price<C: YieldCurve + ?Sized>(
    paths: &PathSet,
    strike: f64,
    option_type: OptionType,
    curve: &C,
) -> Result<McEstimate, CalibrationError> {
    if !(strike > 0.0) || !strike.is_finite() {
        return Err(CalibrationError::invalid_input(
            ErrorLocation::Parameter("strike"),
            format!("strike must be positive and finite, got {}", strike),
        ));
    }
    let discount = curve.discount_factor(paths.horizon())?;
    let phi = option_type.sign();
    let payoffs: Vec<f64> = paths
        .terminal_spots()
        .map(|s| (phi * (s - strike)).max(0.0))
        .collect();

    let samples: Vec<f64> = if paths.is_antithetic() {
        payoffs
            .chunks(2)
            .map(|pair| pair.iter().sum::<f64>() / pair.len() as f64)
            .collect()
    } else {
        payoffs
    };

    let n = samples.len();
    let mean = samples.iter().sum::<f64>() / n as f64;
    let std_error = if n < 2 {
        f64::NAN
    } else {
        let var = samples.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (n - 1) as f64;
        (var / n as f64).sqrt()
    };
    Ok(McEstimate {
        price: discount * mean,
        std_error: discount * std_error,
        n_samples: n,
    })
}
