//! Heston stochastic volatility model parameters.
//!
//! ```text
//! dS = (r - q) S dt + sqrt(v) S dW_S
//! dv = kappa (theta - v) dt + sigma sqrt(v) dW_v
//! E[dW_S dW_v] = rho dt
//! ```
//!
//! ## Feller condition
//!
//! `2 kappa theta >= sigma^2` keeps the variance strictly positive. It is
//! reported by [`HestonParams::satisfies_feller`] but not enforced: fitted
//! equity and FX smiles routinely violate it.
//!
//! ## Example
//!
//! ```
//! use pricer_models::models::heston::HestonParams;
//!
//! let params = HestonParams::new(0.04, 1.5, 0.04, 0.3, -0.7).unwrap();
//! assert!(params.satisfies_feller());
//! assert_eq!(params.to_array(), [0.04, 1.5, 0.04, 0.3, -0.7]);
//! ```

use pricer_core::types::{CalibrationError, ErrorLocation};

/// Heston model parameters.
///
/// The canonical ordering used by [`HestonParams::to_array`] and
/// [`HestonParams::from_array`] is `[v0, kappa, theta, sigma, rho]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HestonParams {
    /// Initial variance.
    pub v0: f64,
    /// Mean-reversion speed.
    pub kappa: f64,
    /// Long-run variance.
    pub theta: f64,
    /// Volatility of variance.
    pub sigma: f64,
    /// Spot/variance correlation.
    pub rho: f64,
}

impl HestonParams {
    /// Parameter names in canonical order.
    pub const NAMES: [&'static str; 5] = ["v0", "kappa", "theta", "sigma", "rho"];

    /// Creates validated parameters.
    ///
    /// # Errors
    ///
    /// `DomainViolation(Parameter(name))` when a value is non-finite,
    /// `v0`, `kappa`, `theta` or `sigma` is not strictly positive, or `rho`
    /// lies outside `[-1, 1]`.
    pub fn new(v0: f64, kappa: f64, theta: f64, sigma: f64, rho: f64) -> Result<Self, CalibrationError> {
        let params = Self {
            v0,
            kappa,
            theta,
            sigma,
            rho,
        };
        params.validate()?;
        Ok(params)
    }

    /// Builds parameters from `[v0, kappa, theta, sigma, rho]`.
    pub fn from_array(values: [f64; 5]) -> Result<Self, CalibrationError> {
        Self::new(values[0], values[1], values[2], values[3], values[4])
    }

    /// `[v0, kappa, theta, sigma, rho]`.
    pub fn to_array(&self) -> [f64; 5] {
        [self.v0, self.kappa, self.theta, self.sigma, self.rho]
    }

    /// Checks the hard bounds.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        for (name, value) in Self::NAMES.into_iter().zip(self.to_array()) {
            if !value.is_finite() {
                return Err(CalibrationError::domain_violation(
                    ErrorLocation::Parameter(name),
                    format!("{} must be finite, got {}", name, value),
                ));
            }
        }
        for (name, value) in Self::NAMES[..4].iter().copied().zip(self.to_array()) {
            if value <= 0.0 {
                return Err(CalibrationError::domain_violation(
                    ErrorLocation::Parameter(name),
                    format!("{} must be positive, got {}", name, value),
                ));
            }
        }
        if !(-1.0..=1.0).contains(&self.rho) {
            return Err(CalibrationError::domain_violation(
                ErrorLocation::Parameter("rho"),
                format!("rho must lie in [-1, 1], got {}", self.rho),
            ));
        }
        Ok(())
    }

    /// `2 kappa theta / sigma^2`.
    pub fn feller_ratio(&self) -> f64 {
        2.0 * self.kappa * self.theta / (self.sigma * self.sigma)
    }

    /// Whether `2 kappa theta >= sigma^2`.
    pub fn satisfies_feller(&self) -> bool {
        self.feller_ratio() >= 1.0
    }

    /// `E[v_t] = theta + (v0 - theta) e^{-kappa t}`.
    pub fn expected_variance(&self, t: f64) -> f64 {
        self.theta + (self.v0 - self.theta) * (-self.kappa * t).exp()
    }

    /// `∫_0^T E[v_t] dt = theta T + (v0 - theta)(1 - e^{-kappa T}) / kappa`.
    ///
    /// Divided by `T` this is the squared vol of a flat Black smile the
    /// model collapses to as `sigma -> 0`.
    pub fn integrated_variance(&self, horizon: f64) -> f64 {
        let kt = self.kappa * horizon;
        // (1 - e^{-x}) / x loses digits for tiny x
        let decay = if kt.abs() < 1e-8 {
            horizon * (1.0 - 0.5 * kt)
        } else {
            -(-kt).exp_m1() / self.kappa
        };
        self.theta * horizon + (self.v0 - self.theta) * decay
    }
}
