//! Implied-volatility smile data for a single expiry.
//!
//! A [`SmileData`] is validated on construction and immutable afterwards.
//! The calibrator reads it; nothing in the workspace mutates it.

pub mod term;

use std::fmt;

use super::curves::YieldCurve;
use crate::types::{CalibrationError, ErrorLocation};

pub use term::{forward_volatility, AtmTermStructure};

/// Option payoff direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OptionType {
    /// Right to buy.
    #[default]
    Call,
    /// Right to sell.
    Put,
}

impl OptionType {
    /// `+1` for calls, `-1` for puts.
    #[inline]
    pub fn sign(&self) -> f64 {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "call"),
            OptionType::Put => write!(f, "put"),
        }
    }
}

fn default_weight() -> f64 {
    1.0
}

/// One implied-volatility quote.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SmileQuote {
    /// Strike.
    pub strike: f64,
    /// Expiry in years.
    pub expiry: f64,
    /// Black implied volatility.
    pub implied_vol: f64,
    /// Quoted option type.
    #[cfg_attr(feature = "serde", serde(default))]
    pub option_type: OptionType,
    /// Relative weight in the calibration objective.
    #[cfg_attr(feature = "serde", serde(default = "default_weight"))]
    pub weight: f64,
}

impl SmileQuote {
    /// Call quote with unit weight.
    pub fn new(strike: f64, expiry: f64, implied_vol: f64) -> Self {
        Self {
            strike,
            expiry,
            implied_vol,
            option_type: OptionType::Call,
            weight: 1.0,
        }
    }

    /// Set the option type.
    pub fn with_option_type(mut self, option_type: OptionType) -> Self {
        self.option_type = option_type;
        self
    }

    /// Set the objective weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

/// Quotes for one expiry together with the spot and dividend yield needed to
/// form the forward.
///
/// # Example
///
/// ```
/// use pricer_core::market_data::smile::{SmileData, SmileQuote};
///
/// let quotes = [90.0, 100.0, 110.0]
///     .iter()
///     .zip([0.24, 0.20, 0.19])
///     .map(|(&k, v)| SmileQuote::new(k, 1.0, v))
///     .collect();
/// let smile = SmileData::new(100.0, 1.0, 0.0, quotes).unwrap();
/// assert_eq!(smile.len(), 3);
/// assert!((smile.atm_vol(105.0) - 0.195).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawSmile"))]
pub struct SmileData {
    spot: f64,
    expiry: f64,
    dividend_yield: f64,
    quotes: Vec<SmileQuote>,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawSmile {
    spot: f64,
    expiry: f64,
    #[serde(default)]
    dividend_yield: f64,
    quotes: Vec<SmileQuote>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawSmile> for SmileData {
    type Error = CalibrationError;

    fn try_from(raw: RawSmile) -> Result<Self, Self::Error> {
        SmileData::new(raw.spot, raw.expiry, raw.dividend_yield, raw.quotes)
    }
}

impl SmileData {
    /// Validate and wrap a set of quotes.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when spot, expiry or dividend yield are not usable, the
    /// quote set is empty, a quote's expiry differs from `expiry`, strikes
    /// decrease, a strike repeats with a different vol, or a vol or weight is
    /// not strictly positive and finite.
    pub fn new(
        spot: f64,
        expiry: f64,
        dividend_yield: f64,
        quotes: Vec<SmileQuote>,
    ) -> Result<Self, CalibrationError> {
        if !(spot > 0.0) || !spot.is_finite() {
            return Err(CalibrationError::invalid_input(
                ErrorLocation::Input,
                format!("spot must be positive and finite, got {}", spot),
            ));
        }
        if !(expiry > 0.0) || !expiry.is_finite() {
            return Err(CalibrationError::invalid_input(
                ErrorLocation::Input,
                format!("expiry must be positive and finite, got {}", expiry),
            ));
        }
        if !dividend_yield.is_finite() {
            return Err(CalibrationError::invalid_input(
                ErrorLocation::Input,
                "dividend yield must be finite",
            ));
        }
        if quotes.is_empty() {
            return Err(CalibrationError::invalid_input(
                ErrorLocation::Input,
                "smile has no quotes",
            ));
        }

        let tol = 1e-12 * expiry.max(1.0);
        for (i, q) in quotes.iter().enumerate() {
            let at = ErrorLocation::Quote(i);
            if (q.expiry - expiry).abs() > tol {
                return Err(CalibrationError::invalid_input(
                    at,
                    format!("expiry {} differs from smile expiry {}", q.expiry, expiry),
                ));
            }
            if !(q.strike > 0.0) || !q.strike.is_finite() {
                return Err(CalibrationError::invalid_input(
                    at,
                    format!("strike must be positive and finite, got {}", q.strike),
                ));
            }
            if !(q.implied_vol > 0.0) || !q.implied_vol.is_finite() {
                return Err(CalibrationError::invalid_input(
                    at,
                    format!("implied vol must be positive and finite, got {}", q.implied_vol),
                ));
            }
            if !(q.weight > 0.0) || !q.weight.is_finite() {
                return Err(CalibrationError::invalid_input(
                    at,
                    format!("weight must be positive and finite, got {}", q.weight),
                ));
            }
            if i > 0 {
                let prev = &quotes[i - 1];
                if q.strike < prev.strike {
                    return Err(CalibrationError::invalid_input(at, "strikes must be sorted"));
                }
                if q.strike == prev.strike && q.implied_vol != prev.implied_vol {
                    return Err(CalibrationError::invalid_input(
                        at,
                        format!("strike {} quoted with two different vols", q.strike),
                    ));
                }
            }
        }

        Ok(Self {
            spot,
            expiry,
            dividend_yield,
            quotes,
        })
    }

    /// Spot of the underlying.
    pub fn spot(&self) -> f64 {
        self.spot
    }

    /// Expiry in years.
    pub fn expiry(&self) -> f64 {
        self.expiry
    }

    /// Continuous dividend (or foreign) yield.
    pub fn dividend_yield(&self) -> f64 {
        self.dividend_yield
    }

    /// Quotes in strike order.
    pub fn quotes(&self) -> &[SmileQuote] {
        &self.quotes
    }

    /// Number of quotes, duplicates included.
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    /// Always `false`: construction rejects empty smiles.
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Forward `S e^{-qT} / D(T)` implied by `curve`.
    pub fn forward<C: YieldCurve + ?Sized>(&self, curve: &C) -> Result<f64, CalibrationError> {
        let df = curve.discount_factor(self.expiry)?;
        Ok(self.spot * (-self.dividend_yield * self.expiry).exp() / df)
    }

    /// Number of quotes once identical `(strike, vol)` pairs are merged.
    pub fn distinct_quote_count(&self) -> usize {
        self.distinct_points().len()
    }

    /// Whether every quote carries the same vol.
    pub fn is_flat(&self) -> bool {
        let first = self.quotes[0].implied_vol;
        self.quotes.iter().all(|q| (q.implied_vol - first).abs() <= 1e-12)
    }

    /// Vol interpolated linearly in strike at `forward`, flat beyond the
    /// outermost strikes.
    pub fn atm_vol(&self, forward: f64) -> f64 {
        let pts = self.distinct_points();
        let (k0, v0) = pts[0];
        let (kn, vn) = pts[pts.len() - 1];
        if forward <= k0 {
            return v0;
        }
        if forward >= kn {
            return vn;
        }
        let i = pts.partition_point(|&(k, _)| k <= forward) - 1;
        let (ka, va) = pts[i];
        let (kb, vb) = pts[i + 1];
        va + (vb - va) * (forward - ka) / (kb - ka)
    }

    fn distinct_points(&self) -> Vec<(f64, f64)> {
        let mut pts: Vec<(f64, f64)> = Vec::with_capacity(self.quotes.len());
        for q in &self.quotes {
            if pts.last().map_or(true, |&(k, _)| k != q.strike) {
                pts.push((q.strike, q.implied_vol));
            }
        }
        pts
    }
}
