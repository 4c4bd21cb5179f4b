//! Semi-analytic European prices under Heston.
//!
//! Prices come from Lewis' single-integral representation
//!
//! ```text
//! C = D [F - sqrt(F K) / π ∫_0^∞ Re(e^{iux} φ(u - i/2)) / (u² + 1/4) du],   x = ln(F/K)
//! ```
//!
//! where `φ` is the characteristic function of `ln(S_T / F)` in the
//! Albrecher ("little trap") form, which stays on the principal branch of
//! the complex logarithm for long expiries. The integral runs over a
//! composite Gauss-Legendre rule whose upper limit follows the decay of `φ`.
//!
//! `φ` does not depend on the strike, so pricing a whole smile evaluates it
//! once per node and reuses the values for every strike.
//!
//! # Example
//!
//! ```
//! use pricer_core::market_data::{FlatCurve, OptionType};
//! use pricer_models::analytical::heston::HestonPricer;
//! use pricer_models::models::HestonParams;
//!
//! let params = HestonParams::new(0.04, 4.0, 0.25, 1.0, -0.5).unwrap();
//! let curve = FlatCurve::new(0.01);
//! let pricer = HestonPricer::default();
//! let call = pricer
//!     .price(&params, 100.0, 0.02, &curve, 100.0, 1.0, OptionType::Call)
//!     .unwrap();
//! assert!((call - 16.070154917).abs() < 1e-6);
//! ```

use std::f64::consts::PI;

use num_complex::Complex64;
use pricer_core::market_data::curves::YieldCurve;
use pricer_core::market_data::{OptionType, SmileData};
use pricer_core::math::quadrature::GaussLegendre;
use pricer_core::types::{CalibrationError, ErrorLocation};

use super::black::price_bounds;
use crate::models::HestonParams;

/// Integrand magnitude at the truncation point is about `e^{-DECAY}`.
const DECAY: f64 = 36.0;
const MIN_UPPER: f64 = 40.0;
const MAX_UPPER: f64 = 2_000.0;

/// Characteristic function `E[exp(iz ln(S_T/F))]` for complex `z`.
///
/// Works with `(β - d)/σ² = -(z² + iz)/(β + d)` so that nothing is divided
/// by a vanishing `σ²`. The same expression tends smoothly to the
/// deterministic-variance limit `exp(-(z² + iz) W / 2)`, `W` the integrated
/// expected variance, as `σ -> 0`; the limit is evaluated directly only when
/// `β + d` vanishes.
pub fn log_forward_cf(params: &HestonParams, z: Complex64, expiry: f64) -> Complex64 {
    let i = Complex64::i();
    let one = Complex64::new(1.0, 0.0);
    let s = z * z + i * z;

    let HestonParams {
        v0,
        kappa,
        theta,
        sigma,
        rho,
    } = *params;
    let sigma2 = sigma * sigma;

    let beta = Complex64::new(kappa, 0.0) - i * z * (rho * sigma);
    let d = (beta * beta + s * sigma2).sqrt();
    let beta_plus_d = beta + d;
    if !(beta_plus_d.norm() > 0.0) {
        return (-0.5 * s * params.integrated_variance(expiry)).exp();
    }

    let b_minus_d = -s / beta_plus_d;
    let g = b_minus_d * sigma2 / beta_plus_d;
    let e = (-d * expiry).exp();

    // (1 - g e)/(1 - g) = 1 + w with w = g (1 - e)/(1 - g); w / σ² kept exact
    let w_scaled = b_minus_d / beta_plus_d * (one - e) / (one - g);
    let log_term = w_scaled * log1p_ratio(w_scaled * sigma2);

    let c = (b_minus_d * expiry - log_term * 2.0) * (kappa * theta);
    let big_d = b_minus_d * (one - e) / (one - g * e);
    (c + big_d * v0).exp()
}

/// `ln(1 + w) / w`, accurate as `w -> 0`.
fn log1p_ratio(w: Complex64) -> Complex64 {
    if w.norm() < 1e-4 {
        let one = Complex64::new(1.0, 0.0);
        one - w * (0.5 - w * (1.0 / 3.0 - w * 0.25))
    } else {
        (w + 1.0).ln() / w
    }
}

/// Heston European option pricer.
///
/// Holds only the quadrature rule, so a single instance can be shared by
/// every calibration and simulation check.
#[derive(Debug, Clone)]
pub struct HestonPricer {
    rule: GaussLegendre,
    panel_width: f64,
}

impl Default for HestonPricer {
    fn default() -> Self {
        Self::new(8, 2.0)
    }
}

impl HestonPricer {
    /// Pricer with an `order`-point Gauss-Legendre rule on panels of width
    /// `panel_width` in `u`.
    pub fn new(order: usize, panel_width: f64) -> Self {
        let panel_width = if panel_width > 0.0 && panel_width.is_finite() {
            panel_width
        } else {
            2.0
        };
        Self {
            rule: GaussLegendre::new(order),
            panel_width,
        }
    }

    /// Truncation point of the Lewis integral.
    ///
    /// Short expiries decay like `exp(-u² W / 2)`; large `u` decays like
    /// `exp(-u sqrt(1 - ρ²)(v0 + κθT)/σ)`. The slower of the two sets the
    /// limit.
    pub fn upper_limit(&self, params: &HestonParams, expiry: f64) -> f64 {
        let w = params.integrated_variance(expiry).max(f64::MIN_POSITIVE);
        let gaussian = (2.0 * DECAY / w).sqrt();
        let spread = (1.0 - params.rho * params.rho).max(0.0).sqrt()
            * (params.v0 + params.kappa * params.theta * expiry);
        let linear = if spread > 0.0 {
            DECAY * params.sigma / spread
        } else {
            MAX_UPPER
        };
        let upper = gaussian.max(linear);
        if upper.is_finite() {
            upper.clamp(MIN_UPPER, MAX_UPPER)
        } else {
            MAX_UPPER
        }
    }

    /// Quadrature nodes `u_j` paired with `w_j φ(u_j - i/2) / (u_j² + 1/4)`.
    fn integrand(&self, params: &HestonParams, expiry: f64) -> Vec<(f64, Complex64)> {
        let upper = self.upper_limit(params, expiry);
        let panels = (upper / self.panel_width).ceil().max(1.0) as usize;
        let half = 0.5 * self.panel_width;
        let shift = Complex64::new(0.0, -0.5);

        let mut out = Vec::with_capacity(panels * self.rule.order());
        for p in 0..panels {
            let mid = self.panel_width * p as f64 + half;
            for (x, w) in self.rule.nodes().iter().zip(self.rule.weights()) {
                let u = mid + half * x;
                let phi = log_forward_cf(params, shift + u, expiry);
                out.push((u, phi * (half * w / (u * u + 0.25))));
            }
        }
        out
    }

    /// Call prices on `forward` for each strike, discounted with `discount`.
    ///
    /// No input validation: the calibrator calls this with trial
    /// parameters. Non-finite parameters give non-finite prices.
    pub fn call_prices(
        &self,
        params: &HestonParams,
        forward: f64,
        discount: f64,
        expiry: f64,
        strikes: &[f64],
    ) -> Vec<f64> {
        let nodes = self.integrand(params, expiry);
        strikes
            .iter()
            .map(|&strike| {
                let x = (forward / strike).ln();
                let integral: f64 = nodes
                    .iter()
                    .map(|&(u, c)| {
                        let (sin, cos) = (u * x).sin_cos();
                        c.re * cos - c.im * sin
                    })
                    .sum();
                let call = discount * (forward - (forward * strike).sqrt() / PI * integral);
                let (lower, upper) = price_bounds(forward, strike, discount, OptionType::Call);
                if call.is_finite() {
                    call.clamp(lower, upper)
                } else {
                    call
                }
            })
            .collect()
    }

    /// Price of one option on `forward`.
    pub fn price_forward(
        &self,
        params: &HestonParams,
        forward: f64,
        discount: f64,
        strike: f64,
        expiry: f64,
        option_type: OptionType,
    ) -> f64 {
        let call = self.call_prices(params, forward, discount, expiry, &[strike])[0];
        match option_type {
            OptionType::Call => call,
            OptionType::Put => (call - discount * (forward - strike)).max(0.0),
        }
    }

    /// Price with the discount factor and the forward `S e^{-qT}/D(T)` read
    /// from `curve`.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a non-positive spot, strike or expiry; the
    /// curve's error (typically `OutOfRange`) at `expiry`.
    #[allow(clippy::too_many_arguments)]
    pub fn price<C: YieldCurve + ?Sized>(
        &self,
        params: &HestonParams,
        spot: f64,
        dividend_yield: f64,
        curve: &C,
        strike: f64,
        expiry: f64,
        option_type: OptionType,
    ) -> Result<f64, CalibrationError> {
        for (name, v) in [("spot", spot), ("strike", strike), ("expiry", expiry)] {
            if !(v > 0.0) || !v.is_finite() {
                return Err(CalibrationError::invalid_input(
                    ErrorLocation::Parameter(name),
                    format!("{} must be positive and finite, got {}", name, v),
                ));
            }
        }
        let discount = curve.discount_factor(expiry)?;
        let forward = spot * (-dividend_yield * expiry).exp() / discount;
        Ok(self.price_forward(params, forward, discount, strike, expiry, option_type))
    }

    /// Model prices for every quote of `smile`, each with its own option type.
    pub fn price_smile<C: YieldCurve + ?Sized>(
        &self,
        params: &HestonParams,
        smile: &SmileData,
        curve: &C,
    ) -> Result<Vec<f64>, CalibrationError> {
        let expiry = smile.expiry();
        let discount = curve.discount_factor(expiry)?;
        let forward = smile.forward(curve)?;
        let strikes: Vec<f64> = smile.quotes().iter().map(|q| q.strike).collect();
        let calls = self.call_prices(params, forward, discount, expiry, &strikes);
        Ok(smile
            .quotes()
            .iter()
            .zip(calls)
            .map(|(q, call)| match q.option_type {
                OptionType::Call => call,
                OptionType::Put => (call - discount * (forward - q.strike)).max(0.0),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytical::black::black_price;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use pricer_core::market_data::{FlatCurve, SmileQuote};

    fn lewis_params() -> HestonParams {
        HestonParams::new(0.04, 4.0, 0.25, 1.0, -0.5).unwrap()
    }

    // ========================================
    // Characteristic Function Tests
    // ========================================

    #[test]
    fn test_cf_normalisation_and_martingale() {
        let p = lewis_params();
        for t in [0.1, 1.0, 10.0] {
            let at_zero = log_forward_cf(&p, Complex64::new(0.0, 0.0), t);
            assert_abs_diff_eq!(at_zero.re, 1.0, epsilon = 1e-14);
            assert_abs_diff_eq!(at_zero.im, 0.0, epsilon = 1e-14);
            // E[S_T / F] = 1
            let mart = log_forward_cf(&p, Complex64::new(0.0, -1.0), t);
            assert_abs_diff_eq!(mart.re, 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(mart.im, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_cf_tends_smoothly_to_deterministic_limit() {
        let at = |sigma: f64| HestonParams::new(0.05, 2.0, 0.03, sigma, -0.4).unwrap();
        let (t, w) = (1.5, at(0.1).integrated_variance(1.5));
        for u in [0.3, 2.0, 15.0] {
            let z = Complex64::new(u, -0.5);
            let s = z * z + Complex64::i() * z;
            let limit = (-0.5 * s * w).exp();
            let gaps: Vec<f64> = [1e-2, 1e-3, 1e-4, 1e-5, 1e-6, 1e-8]
                .iter()
                .map(|&sigma| (log_forward_cf(&at(sigma), z, t) - limit).norm())
                .collect();
            // first order in sigma through the rho term, no plateau or jump
            for pair in gaps.windows(2) {
                assert!(pair[1] < pair[0] * 0.2 + 1e-14, "u = {}: {:?}", u, gaps);
            }
            assert!(gaps[5] < 1e-7, "u = {}: {:?}", u, gaps);
        }
    }

    #[test]
    fn test_price_is_smooth_in_small_vol_of_vol() {
        // equal steps in ln sigma give near-equal price steps near sigma = 0
        let pricer = HestonPricer::default();
        let price = |sigma: f64| {
            let p = HestonParams::new(0.04, 1.0, 0.04, sigma, -0.5).unwrap();
            pricer.price_forward(&p, 100.0, 1.0, 90.0, 1.0, OptionType::Call)
        };
        let sigmas = [0.8e-4, 0.9e-4, 1.0e-4, 1.1e-4, 1.2e-4];
        let prices: Vec<f64> = sigmas.iter().map(|&s| price(s)).collect();
        let steps: Vec<f64> = prices.windows(2).map(|p| p[1] - p[0]).collect();
        for pair in steps.windows(2) {
            assert_abs_diff_eq!(pair[0], pair[1], epsilon = 1e-7);
        }
    }

    // ========================================
    // Price Tests
    // ========================================

    #[test]
    fn test_lewis_reference_prices() {
        // S = 100, r = 1%, q = 2%, T = 1
        let pricer = HestonPricer::default();
        let curve = FlatCurve::new(0.01);
        let expected = [
            (80.0, 26.774_758_743_998_854),
            (90.0, 20.933_349_000_596_710),
            (100.0, 16.070_154_917_028_834),
            (110.0, 12.132_211_516_709_844),
            (120.0, 9.024_913_483_457_836),
        ];
        for (k, px) in expected {
            let v = pricer
                .price(&lewis_params(), 100.0, 0.02, &curve, k, 1.0, OptionType::Call)
                .unwrap();
            assert_abs_diff_eq!(v, px, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_small_vol_of_vol_collapses_to_black() {
        let pricer = HestonPricer::default();
        let p = HestonParams::new(0.04, 1.0, 0.04, 1e-6, -0.5).unwrap();
        let (f, df, t) = (100.0, 0.97, 0.75);
        for k in [70.0, 100.0, 130.0] {
            let heston = pricer.price_forward(&p, f, df, k, t, OptionType::Call);
            let black = black_price(f, k, 0.2, t, df, OptionType::Call);
            assert_abs_diff_eq!(heston, black, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_put_call_parity() {
        let pricer = HestonPricer::default();
        let p = HestonParams::new(0.05, 1.5, 0.06, 0.6, -0.6).unwrap();
        let (f, df, t, k) = (50.0, 0.9, 2.0, 45.0);
        let c = pricer.price_forward(&p, f, df, k, t, OptionType::Call);
        let put = pricer.price_forward(&p, f, df, k, t, OptionType::Put);
        assert_abs_diff_eq!(c - put, df * (f - k), epsilon = 1e-10);
    }

    #[test]
    fn test_call_prices_decrease_in_strike() {
        let pricer = HestonPricer::default();
        let p = HestonParams::new(0.02, 0.8, 0.05, 0.9, -0.8).unwrap();
        let strikes: Vec<f64> = (0..25).map(|i| 60.0 + 3.0 * i as f64).collect();
        let calls = pricer.call_prices(&p, 100.0, 1.0, 0.5, &strikes);
        assert!(calls.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn test_price_smile_matches_single_prices() {
        let pricer = HestonPricer::default();
        let curve = FlatCurve::new(0.03);
        let p = lewis_params();
        let quotes = vec![
            SmileQuote::new(90.0, 0.5, 0.3).with_option_type(OptionType::Put),
            SmileQuote::new(100.0, 0.5, 0.28),
            SmileQuote::new(110.0, 0.5, 0.27),
        ];
        let smile = SmileData::new(100.0, 0.5, 0.01, quotes).unwrap();
        let prices = pricer.price_smile(&p, &smile, &curve).unwrap();
        for (q, px) in smile.quotes().iter().zip(&prices) {
            let single = pricer
                .price(&p, 100.0, 0.01, &curve, q.strike, 0.5, q.option_type)
                .unwrap();
            assert_relative_eq!(*px, single, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_price_rejects_bad_strike() {
        let err = HestonPricer::default()
            .price(&lewis_params(), 100.0, 0.0, &FlatCurve::new(0.0), 0.0, 1.0, OptionType::Call)
            .unwrap_err();
        assert_eq!(err.location(), Some(ErrorLocation::Parameter("strike")));
    }
}
