//! Calibrator configuration.

use std::time::Duration;

use pricer_core::math::solvers::LMConfig;
use pricer_core::types::{CalibrationError, ErrorLocation};

/// Scaling applied to each quote's price residual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Weighting {
    /// `w_i (C_model - C_market) / vega_i`, approximately a vol error.
    #[default]
    Vega,
    /// `w_i (C_model - C_market)`, raw price error.
    Uniform,
}

/// Configuration for [`HestonCalibrator`](super::HestonCalibrator).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use pricer_models::calibration::{CalibratorConfig, Weighting};
///
/// let config = CalibratorConfig::default()
///     .with_restarts(6)
///     .with_weighting(Weighting::Uniform)
///     .with_time_budget(Duration::from_secs(2));
/// assert_eq!(config.n_restarts, 6);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CalibratorConfig {
    /// Settings of each Levenberg-Marquardt run.
    ///
    /// Default: `LMConfig::default()` with 200 iterations
    pub lm: LMConfig,

    /// Perturbed restarts after the first start.
    ///
    /// Default: 4
    pub n_restarts: usize,

    /// Residual scaling.
    ///
    /// Default: Vega
    pub weighting: Weighting,

    /// Largest accepted RMSE of the fitted implied vols.
    ///
    /// Default: 1e-3
    pub acceptance_rmse: f64,

    /// Wall-clock budget for one calibration, all restarts included.
    ///
    /// Default: None
    pub time_budget: Option<Duration>,
}

impl Default for CalibratorConfig {
    fn default() -> Self {
        Self {
            lm: LMConfig {
                max_iterations: 200,
                ..LMConfig::default()
            },
            n_restarts: 4,
            weighting: Weighting::Vega,
            acceptance_rmse: 1e-3,
            time_budget: None,
        }
    }
}

impl CalibratorConfig {
    /// Replace the LM settings.
    pub fn with_lm(mut self, lm: LMConfig) -> Self {
        self.lm = lm;
        self
    }

    /// Set the number of restarts.
    pub fn with_restarts(mut self, n_restarts: usize) -> Self {
        self.n_restarts = n_restarts;
        self
    }

    /// Set the residual weighting.
    pub fn with_weighting(mut self, weighting: Weighting) -> Self {
        self.weighting = weighting;
        self
    }

    /// Set the acceptance threshold in vol units.
    pub fn with_acceptance_rmse(mut self, acceptance_rmse: f64) -> Self {
        self.acceptance_rmse = acceptance_rmse;
        self
    }

    /// Bound the wall-clock time of a calibration.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    /// Checks that the settings are usable.
    ///
    /// # Errors
    ///
    /// `InvalidInput(Parameter(name))` for a non-positive acceptance RMSE, a
    /// zero iteration cap or an invalid LM damping schedule.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        let bad = |name: &'static str, reason: String| {
            Err(CalibrationError::invalid_input(ErrorLocation::Parameter(name), reason))
        };
        if !(self.acceptance_rmse > 0.0) || !self.acceptance_rmse.is_finite() {
            return bad(
                "acceptance_rmse",
                format!("must be positive and finite, got {}", self.acceptance_rmse),
            );
        }
        if self.lm.max_iterations == 0 {
            return bad("max_iterations", "must be at least 1".to_string());
        }
        if !(self.lm.tolerance >= 0.0) {
            return bad("tolerance", format!("must be non-negative, got {}", self.lm.tolerance));
        }
        if !(self.lm.initial_lambda > 0.0) || !(self.lm.max_lambda > self.lm.initial_lambda) {
            return bad(
                "initial_lambda",
                format!(
                    "need 0 < initial_lambda < max_lambda, got {} and {}",
                    self.lm.initial_lambda, self.lm.max_lambda
                ),
            );
        }
        if !(self.lm.lambda_up > 1.0) || !(self.lm.lambda_down > 0.0 && self.lm.lambda_down < 1.0) {
            return bad(
                "lambda_up",
                format!(
                    "need lambda_up > 1 and 0 < lambda_down < 1, got {} and {}",
                    self.lm.lambda_up, self.lm.lambda_down
                ),
            );
        }
        Ok(())
    }
}
