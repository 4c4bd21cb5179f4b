//! Garman-Kohlhagen model for FX options.
//!
//! Black-Scholes with two continuously compounded rates:
//! - S: spot exchange rate (domestic per foreign)
//! - rd: domestic rate, rf: foreign rate
//!
//! ```text
//! C = S e^(-rf T) N(d1) - K e^(-rd T) N(d2)
//! P = K e^(-rd T) N(-d2) - S e^(-rf T) N(-d1)
//! d1 = [ln(S/K) + (rd - rf + σ²/2) T] / (σ √T),  d2 = d1 - σ √T
//! ```
//!
//! FX smiles are quoted in delta rather than strike.
//! [`strike_from_forward_delta`] inverts the forward delta `N(d1)` (calls)
//! or `-N(-d1)` (puts), and [`smile_from_forward_deltas`] turns a set of
//! `(delta, vol)` pillars into a strike-indexed [`SmileData`].
//!
//! # Examples
//!
//! ```
//! use pricer_core::market_data::OptionType;
//! use pricer_models::analytical::garman_kohlhagen::{GarmanKohlhagen, GarmanKohlhagenParams};
//!
//! let params = GarmanKohlhagenParams::new(1.10, 1.12, 0.03, 0.01, 0.15, 1.0).unwrap();
//! let model = GarmanKohlhagen::new(params);
//! let call = model.price(OptionType::Call);
//! let put = model.price(OptionType::Put);
//!
//! // Put-call parity
//! let parity = call - put - (1.10 * (-0.01_f64).exp() - 1.12 * (-0.03_f64).exp());
//! assert!(parity.abs() < 1e-10);
//! ```

use pricer_core::market_data::curves::YieldCurve;
use pricer_core::market_data::{OptionType, SmileData, SmileQuote};
use pricer_core::types::{CalibrationError, ErrorLocation};

use super::distributions::{inverse_norm_cdf, norm_cdf, norm_pdf};

/// Parameters for the Garman-Kohlhagen model.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GarmanKohlhagenParams {
    /// Spot exchange rate (domestic per foreign).
    pub spot: f64,
    /// Strike.
    pub strike: f64,
    /// Domestic rate (continuous compounding).
    pub rate_domestic: f64,
    /// Foreign rate (continuous compounding).
    pub rate_foreign: f64,
    /// Volatility of the exchange rate.
    pub volatility: f64,
    /// Time to expiry in years.
    pub expiry: f64,
}

impl GarmanKohlhagenParams {
    /// Creates validated parameters.
    ///
    /// # Errors
    ///
    /// `InvalidInput` naming the parameter when spot, strike, volatility or
    /// expiry is not positive and finite, or a rate is not finite.
    pub fn new(
        spot: f64,
        strike: f64,
        rate_domestic: f64,
        rate_foreign: f64,
        volatility: f64,
        expiry: f64,
    ) -> Result<Self, CalibrationError> {
        for (name, v) in [
            ("spot", spot),
            ("strike", strike),
            ("volatility", volatility),
            ("expiry", expiry),
        ] {
            require_positive(name, v)?;
        }
        for (name, v) in [("rate_domestic", rate_domestic), ("rate_foreign", rate_foreign)] {
            if !v.is_finite() {
                return Err(CalibrationError::invalid_input(
                    ErrorLocation::Parameter(name),
                    format!("{} must be finite", name),
                ));
            }
        }

        Ok(Self {
            spot,
            strike,
            rate_domestic,
            rate_foreign,
            volatility,
            expiry,
        })
    }

    /// Forward exchange rate `S exp((rd - rf) T)`.
    #[inline]
    pub fn forward(&self) -> f64 {
        self.spot * ((self.rate_domestic - self.rate_foreign) * self.expiry).exp()
    }
}

/// Garman-Kohlhagen pricer over a fixed parameter set.
#[derive(Debug, Clone, Copy)]
pub struct GarmanKohlhagen {
    params: GarmanKohlhagenParams,
    sqrt_t: f64,
    df_domestic: f64,
    df_foreign: f64,
}

impl GarmanKohlhagen {
    /// Creates a pricer, caching `√T` and both discount factors.
    pub fn new(params: GarmanKohlhagenParams) -> Self {
        Self {
            sqrt_t: params.expiry.sqrt(),
            df_domestic: (-params.rate_domestic * params.expiry).exp(),
            df_foreign: (-params.rate_foreign * params.expiry).exp(),
            params,
        }
    }

    /// The parameters.
    #[inline]
    pub fn params(&self) -> &GarmanKohlhagenParams {
        &self.params
    }

    /// `d1`.
    #[inline]
    pub fn d1(&self) -> f64 {
        let p = &self.params;
        let total_vol = p.volatility * self.sqrt_t;
        ((p.spot / p.strike).ln()
            + (p.rate_domestic - p.rate_foreign + 0.5 * p.volatility * p.volatility) * p.expiry)
            / total_vol
    }

    /// `d2 = d1 - σ√T`.
    #[inline]
    pub fn d2(&self) -> f64 {
        self.d1() - self.params.volatility * self.sqrt_t
    }

    /// Premium in domestic currency per unit of foreign notional.
    pub fn price(&self, option_type: OptionType) -> f64 {
        let p = &self.params;
        let phi = option_type.sign();
        phi * (p.spot * self.df_foreign * norm_cdf(phi * self.d1())
            - p.strike * self.df_domestic * norm_cdf(phi * self.d2()))
    }

    /// Spot delta, `φ e^(-rf T) N(φ d1)`.
    pub fn spot_delta(&self, option_type: OptionType) -> f64 {
        self.df_foreign * self.forward_delta(option_type)
    }

    /// Forward delta, `φ N(φ d1)`.
    pub fn forward_delta(&self, option_type: OptionType) -> f64 {
        let phi = option_type.sign();
        phi * norm_cdf(phi * self.d1())
    }

    /// Sensitivity to volatility, `S e^(-rf T) φ(d1) √T`.
    pub fn vega(&self) -> f64 {
        self.params.spot * self.df_foreign * norm_pdf(self.d1()) * self.sqrt_t
    }
}

/// Strike whose forward delta equals `delta`.
///
/// The sign of `delta` selects the option type: positive for a call,
/// negative for a put.
///
/// ```text
/// K = F exp(-φ N⁻¹(φ Δ) σ √T + σ² T / 2)
/// ```
///
/// # Errors
///
/// `InvalidInput` when `|delta|` is not strictly between 0 and 1 or when
/// forward, vol or expiry is not positive and finite.
///
/// # Example
///
/// ```
/// use pricer_models::analytical::garman_kohlhagen::strike_from_forward_delta;
///
/// // The 50-delta call sits at F exp(σ²T/2)
/// let k = strike_from_forward_delta(0.5, 1.25, 0.1, 1.0).unwrap();
/// assert!((k - 1.25 * (0.005_f64).exp()).abs() < 1e-9);
/// ```
pub fn strike_from_forward_delta(
    delta: f64,
    forward: f64,
    vol: f64,
    expiry: f64,
) -> Result<f64, CalibrationError> {
    require_positive("forward", forward)?;
    require_positive("volatility", vol)?;
    require_positive("expiry", expiry)?;
    if !(delta.abs() > 0.0 && delta.abs() < 1.0) {
        return Err(CalibrationError::invalid_input(
            ErrorLocation::Parameter("delta"),
            format!("forward delta must lie in (-1, 0) or (0, 1), got {}", delta),
        ));
    }

    let phi = if delta > 0.0 { 1.0 } else { -1.0 };
    let d1 = phi * inverse_norm_cdf(phi * delta);
    let total_vol = vol * expiry.sqrt();
    Ok(forward * (-d1 * total_vol + 0.5 * total_vol * total_vol).exp())
}

/// Build a strike-indexed smile from forward-delta pillars.
///
/// `pillars` holds `(signed forward delta, vol)` pairs; positive deltas
/// become call quotes and negative deltas put quotes. The forward is
/// `spot e^(-rf T) / D(T)` with `D` read from the domestic `curve`, and
/// `foreign_rate` is stored as the smile's dividend yield.
///
/// # Errors
///
/// `InvalidInput(Quote(i))` when pillar `i` cannot be converted, any error
/// from [`SmileData::new`], or the curve's error at `expiry`.
pub fn smile_from_forward_deltas<C: YieldCurve + ?Sized>(
    spot: f64,
    expiry: f64,
    foreign_rate: f64,
    curve: &C,
    pillars: &[(f64, f64)],
) -> Result<SmileData, CalibrationError> {
    require_positive("spot", spot)?;
    require_positive("expiry", expiry)?;
    let forward = spot * (-foreign_rate * expiry).exp() / curve.discount_factor(expiry)?;

    let mut quotes = Vec::with_capacity(pillars.len());
    for (i, &(delta, vol)) in pillars.iter().enumerate() {
        let strike = strike_from_forward_delta(delta, forward, vol, expiry).map_err(|e| {
            CalibrationError::invalid_input(ErrorLocation::Quote(i), e.to_string())
        })?;
        let option_type = if delta > 0.0 {
            OptionType::Call
        } else {
            OptionType::Put
        };
        quotes.push(SmileQuote::new(strike, expiry, vol).with_option_type(option_type));
    }
    quotes.sort_by(|a, b| a.strike.total_cmp(&b.strike));

    SmileData::new(spot, expiry, foreign_rate, quotes)
}

fn require_positive(name: &'static str, v: f64) -> Result<(), CalibrationError> {
    if v > 0.0 && v.is_finite() {
        Ok(())
    } else {
        Err(CalibrationError::invalid_input(
            ErrorLocation::Parameter(name),
            format!("{} must be positive and finite, got {}", name, v),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use pricer_core::market_data::FlatCurve;
    use pricer_core::types::ErrorKind;

    fn gk(spot: f64, strike: f64, rd: f64, rf: f64, vol: f64, t: f64) -> GarmanKohlhagen {
        GarmanKohlhagen::new(GarmanKohlhagenParams::new(spot, strike, rd, rf, vol, t).unwrap())
    }

    // ========================================
    // Parameter Tests
    // ========================================

    #[test]
    fn test_params_reject_non_positive() {
        let err = GarmanKohlhagenParams::new(0.0, 1.12, 0.03, 0.01, 0.15, 1.0).unwrap_err();
        assert_eq!(err.location(), Some(ErrorLocation::Parameter("spot")));
        let err = GarmanKohlhagenParams::new(1.1, 1.12, 0.03, 0.01, -0.15, 1.0).unwrap_err();
        assert_eq!(err.location(), Some(ErrorLocation::Parameter("volatility")));
        assert!(GarmanKohlhagenParams::new(1.1, 1.12, f64::NAN, 0.01, 0.15, 1.0).is_err());
    }

    #[test]
    fn test_forward() {
        let p = GarmanKohlhagenParams::new(1.10, 1.12, 0.03, 0.01, 0.15, 1.0).unwrap();
        assert_relative_eq!(p.forward(), 1.10 * 0.02_f64.exp(), epsilon = 1e-14);
    }

    // ========================================
    // Reference Prices (AUDUSD, 30 June 2023)
    // ========================================

    const REFERENCE_TOL: f64 = 6e-4;

    #[test]
    fn test_audusd_reference_prices() {
        let (rd, rf) = (0.05381, 0.0466);
        let cases = [
            (0.6629, 0.098408, 0.7882, OptionType::Call, 0.00133006),
            (0.662866, 0.0984338, 0.7882, OptionType::Put, 0.11533070),
            (0.662866, 0.1354523, 0.5405, OptionType::Call, 0.12284766),
            (0.662866, 0.1354523, 0.5405, OptionType::Put, 0.00200167),
        ];
        for (spot, vol, strike, ty, expected) in cases {
            let px = gk(spot, strike, rd, rf, vol, 1.0).price(ty);
            assert_abs_diff_eq!(px, expected, epsilon = REFERENCE_TOL);
        }
    }

    #[test]
    fn test_usdaud_inverted_reference_price() {
        // Quoted per unit of both notionals: px / S / K
        let spot = 1.0 / 0.662866;
        let strike = 1.0 / 0.7882;
        let px = gk(spot, strike, 0.0466, 0.05381, 0.0984338, 1.0).price(OptionType::Put);
        assert_abs_diff_eq!(px / spot / strike, 0.00133006, epsilon = REFERENCE_TOL);
    }

    #[test]
    fn test_put_call_parity() {
        let m = gk(1.10, 1.12, 0.03, 0.01, 0.15, 1.0);
        let lhs = m.price(OptionType::Call) - m.price(OptionType::Put);
        let rhs = 1.10 * (-0.01_f64).exp() - 1.12 * (-0.03_f64).exp();
        assert_abs_diff_eq!(lhs, rhs, epsilon = 1e-12);
    }

    #[test]
    fn test_deltas() {
        let m = gk(1.10, 1.12, 0.03, 0.01, 0.15, 1.0);
        let call = m.forward_delta(OptionType::Call);
        let put = m.forward_delta(OptionType::Put);
        assert_abs_diff_eq!(call - put, 1.0, epsilon = 1e-12);
        assert_relative_eq!(
            m.spot_delta(OptionType::Call),
            (-0.01_f64).exp() * call,
            epsilon = 1e-14
        );
    }

    #[test]
    fn test_vega_matches_finite_difference() {
        let h = 1e-6;
        let up = gk(1.10, 1.12, 0.03, 0.01, 0.15 + h, 1.0).price(OptionType::Call);
        let dn = gk(1.10, 1.12, 0.03, 0.01, 0.15 - h, 1.0).price(OptionType::Call);
        let vega = gk(1.10, 1.12, 0.03, 0.01, 0.15, 1.0).vega();
        assert_relative_eq!(vega, (up - dn) / (2.0 * h), max_relative = 1e-4);
    }

    // ========================================
    // Delta-Strike Tests
    // ========================================

    #[test]
    fn test_strike_reproduces_delta() {
        let (spot, rd, rf, vol, t): (f64, f64, f64, f64, f64) = (0.6662, 0.05376, 0.04655, 0.1064786, 1.0);
        let forward = spot * ((rd - rf) * t).exp();
        for delta in [0.1, 0.25, -0.25, -0.1] {
            let k = strike_from_forward_delta(delta, forward, vol, t).unwrap();
            let ty = if delta > 0.0 { OptionType::Call } else { OptionType::Put };
            let m = gk(spot, k, rd, rf, vol, t);
            assert_abs_diff_eq!(m.forward_delta(ty), delta, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_five_year_forward_delta_strikes() {
        // Broker strikes for AUDUSD 5Y 30-delta pillars
        let (spot, rd, rf, t): (f64, f64, f64, f64) = (0.6662, 0.03902, 0.04287, 5.0);
        let forward = spot * ((rd - rf) * t).exp();
        let put = strike_from_forward_delta(-0.3, forward, 0.1161961, t).unwrap();
        let call = strike_from_forward_delta(0.3, forward, 0.1016627, t).unwrap();
        assert_relative_eq!(put, 0.59180, max_relative = 4e-3);
        assert_relative_eq!(call, 0.75820, max_relative = 4e-3);
    }

    #[test]
    fn test_strike_from_delta_rejects_out_of_range() {
        for delta in [0.0, 1.0, -1.0, 1.5, f64::NAN] {
            let err = strike_from_forward_delta(delta, 1.0, 0.1, 1.0).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }

    #[test]
    fn test_smile_from_forward_deltas_sorts_by_strike() {
        let curve = FlatCurve::new(0.05);
        let pillars = [(0.25, 0.11), (-0.25, 0.125), (0.5, 0.10), (-0.1, 0.14), (0.1, 0.12)];
        let smile = smile_from_forward_deltas(0.66, 1.0, 0.045, &curve, &pillars).unwrap();

        assert_eq!(smile.len(), 5);
        assert_abs_diff_eq!(smile.dividend_yield(), 0.045);
        let strikes: Vec<f64> = smile.quotes().iter().map(|q| q.strike).collect();
        assert!(strikes.windows(2).all(|w| w[0] < w[1]));
        // Lowest strike is the 10-delta put
        assert_eq!(smile.quotes()[0].option_type, OptionType::Put);
        assert_abs_diff_eq!(smile.quotes()[0].implied_vol, 0.14);
        assert_eq!(smile.quotes()[4].option_type, OptionType::Call);
    }

    #[test]
    fn test_smile_from_forward_deltas_reports_pillar() {
        let curve = FlatCurve::new(0.05);
        let err =
            smile_from_forward_deltas(0.66, 1.0, 0.045, &curve, &[(0.25, 0.1), (1.2, 0.1)]).unwrap_err();
        assert_eq!(err.location(), Some(ErrorLocation::Quote(1)));
    }
}
