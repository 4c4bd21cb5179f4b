//! At-the-money volatility term structure.

use crate::types::{CalibrationError, ErrorLocation};

/// Forward volatility between two expiries.
///
/// `sqrt((σ2² t2 − σ1² t1) / (t2 − t1))`.
///
/// # Errors
///
/// - `InvalidInput` if `t2 <= t1` or an input is negative or not finite
/// - `DomainViolation` if the forward variance is negative (calendar arbitrage)
///
/// # Example
///
/// ```
/// use pricer_core::market_data::smile::forward_volatility;
///
/// let fwd = forward_volatility(1.0, 0.20, 2.0, 0.20).unwrap();
/// assert!((fwd - 0.20).abs() < 1e-15);
/// assert!(forward_volatility(1.0, 0.30, 2.0, 0.10).is_err());
/// ```
pub fn forward_volatility(t1: f64, vol1: f64, t2: f64, vol2: f64) -> Result<f64, CalibrationError> {
    if !(t1 >= 0.0) || !(t2 > t1) || !t2.is_finite() {
        return Err(CalibrationError::invalid_input(
            ErrorLocation::Input,
            format!("forward period [{}, {}] must satisfy 0 <= t1 < t2", t1, t2),
        ));
    }
    if !(vol1 >= 0.0) || !(vol2 >= 0.0) || !vol1.is_finite() || !vol2.is_finite() {
        return Err(CalibrationError::invalid_input(
            ErrorLocation::Input,
            "volatilities must be non-negative and finite",
        ));
    }
    let fwd_var = (vol2 * vol2 * t2 - vol1 * vol1 * t1) / (t2 - t1);
    if fwd_var < 0.0 {
        return Err(CalibrationError::domain_violation(
            ErrorLocation::Pillar(t2),
            format!("negative forward variance {:.6e} between t={} and t={}", fwd_var, t1, t2),
        ));
    }
    Ok(fwd_var.sqrt())
}

/// ATM vol pillars with flat-forward variance between them.
///
/// Total variance `w(t) = σ(t)² t` is linear between pillars. Before the
/// first pillar the first vol is used, after the last the last vol.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AtmTermStructure {
    times: Vec<f64>,
    vols: Vec<f64>,
}

impl AtmTermStructure {
    /// Build from `(expiry, vol)` pillars in increasing expiry order.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for empty, unsorted or non-finite pillars;
    /// `DomainViolation` if total variance decreases between two pillars.
    pub fn new(times: &[f64], vols: &[f64]) -> Result<Self, CalibrationError> {
        if times.is_empty() || times.len() != vols.len() {
            return Err(CalibrationError::invalid_input(
                ErrorLocation::Input,
                format!("{} expiries but {} vols", times.len(), vols.len()),
            ));
        }
        if !(times[0] > 0.0) || !(vols[0] > 0.0) || !vols[0].is_finite() {
            return Err(CalibrationError::invalid_input(
                ErrorLocation::Pillar(times[0]),
                "first pillar must have positive expiry and vol",
            ));
        }
        for i in 1..times.len() {
            forward_volatility(times[i - 1], vols[i - 1], times[i], vols[i])?;
        }
        Ok(Self {
            times: times.to_vec(),
            vols: vols.to_vec(),
        })
    }

    /// Pillar expiries.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Pillar vols.
    pub fn vols(&self) -> &[f64] {
        &self.vols
    }

    /// Total implied variance `σ(t)² t`.
    pub fn total_variance(&self, t: f64) -> f64 {
        let n = self.times.len();
        if t <= self.times[0] {
            return self.vols[0] * self.vols[0] * t.max(0.0);
        }
        if t >= self.times[n - 1] {
            return self.vols[n - 1] * self.vols[n - 1] * t;
        }
        let i = self.times.partition_point(|&ti| ti <= t) - 1;
        let (ta, tb) = (self.times[i], self.times[i + 1]);
        let wa = self.vols[i] * self.vols[i] * ta;
        let wb = self.vols[i + 1] * self.vols[i + 1] * tb;
        wa + (wb - wa) * (t - ta) / (tb - ta)
    }

    /// Implied ATM vol at `t`.
    pub fn vol(&self, t: f64) -> f64 {
        if t <= self.times[0] {
            return self.vols[0];
        }
        (self.total_variance(t) / t).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorKind;
    use approx::assert_relative_eq;

    #[test]
    fn test_forward_vol_value() {
        let f = forward_volatility(0.5, 0.10, 1.0, 0.12).unwrap();
        assert_relative_eq!(f, ((0.0144 - 0.005) / 0.5f64).sqrt(), epsilon = 1e-15);
    }

    #[test]
    fn test_calendar_arbitrage_detected() {
        let err = forward_volatility(1.0, 0.30, 1.5, 0.15).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DomainViolation);
        let err = forward_volatility(1.0, 0.2, 1.0, 0.2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_term_structure_hits_pillars() {
        let ts = AtmTermStructure::new(&[0.25, 1.0, 2.0], &[0.25, 0.22, 0.21]).unwrap();
        assert_relative_eq!(ts.vol(1.0), 0.22, epsilon = 1e-15);
        assert_relative_eq!(ts.vol(2.0), 0.21, epsilon = 1e-15);
        assert_eq!(ts.vol(0.1), 0.25);
        assert_eq!(ts.vol(5.0), 0.21);
    }

    #[test]
    fn test_term_structure_flat_forward_variance() {
        let ts = AtmTermStructure::new(&[1.0, 2.0], &[0.20, 0.25]).unwrap();
        let fwd = forward_volatility(1.0, 0.20, 2.0, 0.25).unwrap();
        let w = ts.total_variance(1.5);
        assert_relative_eq!(w, 0.04 + fwd * fwd * 0.5, epsilon = 1e-15);
    }

    #[test]
    fn test_term_structure_rejects_arbitrage() {
        let err = AtmTermStructure::new(&[1.0, 2.0], &[0.4, 0.2]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DomainViolation);
    }
}
