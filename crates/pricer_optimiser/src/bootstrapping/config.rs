//! Bootstrap configuration types.

use std::time::Duration;

use pricer_core::market_data::curves::{CurveOptions, Extrapolation, Interpolation};
use pricer_core::types::{BusinessDayConvention, CalibrationError, ErrorLocation};

/// Configuration for discount curve bootstrapping.
///
/// # Examples
///
/// ```
/// use pricer_optimiser::bootstrapping::BootstrapConfig;
/// use pricer_core::market_data::curves::Interpolation;
///
/// let config = BootstrapConfig::default();
/// assert_eq!(config.tolerance, 1e-10);
/// assert_eq!(config.max_iterations, 100);
///
/// let cubic = BootstrapConfig::default()
///     .with_interpolation(Interpolation::CubicLogDiscount)
///     .with_spot_lag(2);
/// assert!(cubic.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BootstrapConfig {
    /// Relative tolerance on each instrument's repriced quote.
    ///
    /// Default: 1e-10
    pub tolerance: f64,

    /// Root-finder evaluation cap per pillar.
    ///
    /// Default: 100
    pub max_iterations: usize,

    /// Interpolation rule for trial curves and the result.
    ///
    /// Default: LogLinear
    pub interpolation: Interpolation,

    /// Extrapolation mode of the resulting curve.
    ///
    /// Default: None
    pub extrapolation: Extrapolation,

    /// Accept increasing discount factors.
    ///
    /// Default: false
    pub allow_negative_rates: bool,

    /// Sweep cap for non-local interpolation.
    ///
    /// Default: 50
    pub max_passes: usize,

    /// Instruments maturing later (in years) are rejected.
    ///
    /// Default: 50.0
    pub max_maturity: f64,

    /// Business days from valuation to spot.
    ///
    /// Default: 0
    pub spot_lag: u32,

    /// Rolling rule for every generated date.
    ///
    /// Default: ModifiedFollowing
    pub business_day_convention: BusinessDayConvention,

    /// Wall-clock budget for one build.
    ///
    /// Default: None
    pub time_budget: Option<Duration>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 100,
            interpolation: Interpolation::LogLinear,
            extrapolation: Extrapolation::None,
            allow_negative_rates: false,
            max_passes: 50,
            max_maturity: 50.0,
            spot_lag: 0,
            business_day_convention: BusinessDayConvention::ModifiedFollowing,
            time_budget: None,
        }
    }
}

impl BootstrapConfig {
    /// Set the convergence tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the maximum iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the interpolation rule.
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Set the extrapolation mode.
    pub fn with_extrapolation(mut self, extrapolation: Extrapolation) -> Self {
        self.extrapolation = extrapolation;
        self
    }

    /// Allow or forbid negative rates.
    pub fn with_negative_rates(mut self, allow: bool) -> Self {
        self.allow_negative_rates = allow;
        self
    }

    /// Set the sweep cap for non-local interpolation.
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Set the maximum maturity.
    pub fn with_max_maturity(mut self, max_maturity: f64) -> Self {
        self.max_maturity = max_maturity;
        self
    }

    /// Set the spot lag in business days.
    pub fn with_spot_lag(mut self, spot_lag: u32) -> Self {
        self.spot_lag = spot_lag;
        self
    }

    /// Set the business-day convention.
    pub fn with_business_day_convention(mut self, bdc: BusinessDayConvention) -> Self {
        self.business_day_convention = bdc;
        self
    }

    /// Set a wall-clock budget.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    /// Options handed to the resulting curve.
    pub fn curve_options(&self) -> CurveOptions {
        CurveOptions {
            extrapolation: self.extrapolation,
            allow_negative_rates: self.allow_negative_rates,
        }
    }

    /// Check the configuration itself.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        let bad = |name: &'static str, reason: String| {
            Err(CalibrationError::invalid_input(ErrorLocation::Parameter(name), reason))
        };
        if !(self.tolerance > 0.0) || !self.tolerance.is_finite() {
            return bad("tolerance", format!("must be positive, got {}", self.tolerance));
        }
        if self.max_iterations < 4 {
            return bad("max_iterations", format!("must be at least 4, got {}", self.max_iterations));
        }
        if self.max_passes == 0 {
            return bad("max_passes", "must be positive".to_string());
        }
        if !(self.max_maturity > 0.0) {
            return bad("max_maturity", format!("must be positive, got {}", self.max_maturity));
        }
        Ok(())
    }
}
