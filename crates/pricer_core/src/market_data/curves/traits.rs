//! Yield curve trait definition.

use crate::types::{CalibrationError, ErrorLocation};

/// Discount-factor source queried by pricers, calibrators and simulators.
///
/// # Contract
///
/// - `discount_factor(t)` returns D(t) for `t` in the supported domain and
///   `CalibrationError::OutOfRange` elsewhere
/// - `zero_rate(t)` returns the continuously compounded zero rate
/// - `forward_rate(t1, t2)` returns the continuously compounded forward rate
///
/// # Invariants
///
/// - D(0) = 1
/// - D(t) > 0 on the domain
///
/// # Example
///
/// ```
/// use pricer_core::market_data::curves::{FlatCurve, YieldCurve};
///
/// let curve = FlatCurve::new(0.05);
/// let df = curve.discount_factor(1.0).unwrap();
/// assert!((df - 0.951229).abs() < 1e-5);
/// assert!((curve.zero_rate(1.0).unwrap() - 0.05).abs() < 1e-12);
/// assert!((curve.forward_rate(1.0, 2.0).unwrap() - 0.05).abs() < 1e-12);
/// ```
pub trait YieldCurve: Send + Sync {
    /// Discount factor for maturity `t` (years).
    fn discount_factor(&self, t: f64) -> Result<f64, CalibrationError>;

    /// Largest time for which `discount_factor` succeeds.
    fn max_time(&self) -> f64;

    /// Continuously compounded zero rate, `-ln D(t) / t`.
    ///
    /// At `t = 0` the limit is taken as the rate over the first day.
    fn zero_rate(&self, t: f64) -> Result<f64, CalibrationError> {
        if t <= 0.0 {
            let h = (1.0 / 365.0_f64).min(self.max_time());
            return self.forward_rate(0.0, h);
        }
        let df = self.discount_factor(t)?;
        Ok(-df.ln() / t)
    }

    /// Continuously compounded forward rate `-ln(D(t2)/D(t1)) / (t2 - t1)`.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `t2 <= t1`; `OutOfRange` from either DF lookup.
    fn forward_rate(&self, t1: f64, t2: f64) -> Result<f64, CalibrationError> {
        let dt = t2 - t1;
        if !(dt > 0.0) {
            return Err(CalibrationError::invalid_input(
                ErrorLocation::Input,
                format!("forward period [{}, {}] must have t2 > t1", t1, t2),
            ));
        }
        let df1 = self.discount_factor(t1)?;
        let df2 = self.discount_factor(t2)?;
        Ok(-(df2 / df1).ln() / dt)
    }

    /// Simply compounded forward rate over an accrual fraction `tau`.
    fn simple_forward_rate(&self, t1: f64, t2: f64, tau: f64) -> Result<f64, CalibrationError> {
        if !(tau > 0.0) {
            return Err(CalibrationError::invalid_input(
                ErrorLocation::Input,
                "accrual fraction must be positive",
            ));
        }
        let df1 = self.discount_factor(t1)?;
        let df2 = self.discount_factor(t2)?;
        Ok((df1 / df2 - 1.0) / tau)
    }
}

impl<C: YieldCurve + ?Sized> YieldCurve for &C {
    fn discount_factor(&self, t: f64) -> Result<f64, CalibrationError> {
        (**self).discount_factor(t)
    }

    fn max_time(&self) -> f64 {
        (**self).max_time()
    }
}

impl<C: YieldCurve + ?Sized> YieldCurve for std::sync::Arc<C> {
    fn discount_factor(&self, t: f64) -> Result<f64, CalibrationError> {
        (**self).discount_factor(t)
    }

    fn max_time(&self) -> f64 {
        (**self).max_time()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorKind;

    struct MockCurve {
        rate: f64,
    }

    impl YieldCurve for MockCurve {
        fn discount_factor(&self, t: f64) -> Result<f64, CalibrationError> {
            if !(0.0..=10.0).contains(&t) {
                return Err(CalibrationError::out_of_range(t, 0.0, 10.0));
            }
            Ok((-self.rate * t).exp())
        }

        fn max_time(&self) -> f64 {
            10.0
        }
    }

    #[test]
    fn test_default_zero_rate() {
        let curve = MockCurve { rate: 0.05 };
        assert!((curve.zero_rate(1.0).unwrap() - 0.05).abs() < 1e-12);
        assert!((curve.zero_rate(0.0).unwrap() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_default_forward_rate() {
        let curve = MockCurve { rate: 0.05 };
        assert!((curve.forward_rate(1.0, 2.0).unwrap() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_forward_rate_reversed_period() {
        let curve = MockCurve { rate: 0.05 };
        let err = curve.forward_rate(2.0, 1.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_forward_rate_propagates_out_of_range() {
        let curve = MockCurve { rate: 0.05 };
        let err = curve.forward_rate(1.0, 11.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
    }

    #[test]
    fn test_simple_forward_rate() {
        let curve = MockCurve { rate: 0.05 };
        let f = curve.simple_forward_rate(1.0, 1.5, 0.5).unwrap();
        assert!((f - ((0.025f64).exp() - 1.0) / 0.5).abs() < 1e-14);
    }

    #[test]
    fn test_blanket_impls() {
        let curve = MockCurve { rate: 0.02 };
        let by_ref: &dyn YieldCurve = &curve;
        assert_eq!(by_ref.max_time(), 10.0);
        let shared = std::sync::Arc::new(MockCurve { rate: 0.02 });
        assert!((shared.discount_factor(1.0).unwrap() - (-0.02f64).exp()).abs() < 1e-15);
    }
}
