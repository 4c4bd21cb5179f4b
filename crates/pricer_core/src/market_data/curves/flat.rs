//! Flat yield curve implementation.

use super::YieldCurve;
use crate::types::{CalibrationError, ErrorLocation};

/// Curve with one continuously compounded rate for every maturity.
///
/// Defined for all `t >= 0`. Useful for tests and for pricing against a
/// quoted flat rate.
///
/// # Example
///
/// ```
/// use pricer_core::market_data::curves::{FlatCurve, YieldCurve};
///
/// let curve = FlatCurve::new(0.03);
/// assert_eq!(curve.rate(), 0.03);
/// assert!((curve.discount_factor(2.0).unwrap() - (-0.06f64).exp()).abs() < 1e-15);
/// assert!(curve.discount_factor(-1.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlatCurve {
    rate: f64,
}

impl FlatCurve {
    /// Construct a flat curve with the given constant rate.
    #[inline]
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }

    /// The constant rate.
    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl YieldCurve for FlatCurve {
    fn discount_factor(&self, t: f64) -> Result<f64, CalibrationError> {
        if !(t >= 0.0) || !t.is_finite() {
            return Err(CalibrationError::out_of_range(t, 0.0, f64::INFINITY));
        }
        if !self.rate.is_finite() {
            return Err(CalibrationError::invalid_input(
                ErrorLocation::Input,
                "flat rate must be finite",
            ));
        }
        Ok((-self.rate * t).exp())
    }

    fn max_time(&self) -> f64 {
        f64::INFINITY
    }

    fn zero_rate(&self, _t: f64) -> Result<f64, CalibrationError> {
        Ok(self.rate)
    }
}
