//! Monte Carlo simulation configuration.

use pricer_core::types::{CalibrationError, ErrorLocation};

/// Maximum number of simulation paths allowed.
pub const MAX_PATHS: usize = 10_000_000;

/// Maximum number of time steps allowed per path.
pub const MAX_STEPS: usize = 10_000;

/// Discretisation of the Heston variance process.
///
/// Each scheme keeps the variance used in the drift and diffusion
/// non-negative. They differ in bias per step:
///
/// - `FullTruncation`: Euler on `v`, with `v⁺ = max(v, 0)` wherever `v`
///   enters a coefficient. Lowest bias among Euler fixes.
/// - `Reflection`: Euler followed by `v ← |v|`. Biased upwards on coarse
///   grids.
/// - `QuadraticExponential`: Andersen's moment-matched QE step with
///   `ψ_c = 1.5`. Accurate with few steps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VarianceScheme {
    /// Full-truncation Euler.
    #[default]
    FullTruncation,
    /// Reflecting Euler.
    Reflection,
    /// Andersen quadratic-exponential.
    QuadraticExponential,
}

impl VarianceScheme {
    /// Short display name.
    pub fn name(&self) -> &'static str {
        match self {
            VarianceScheme::FullTruncation => "full-truncation",
            VarianceScheme::Reflection => "reflection",
            VarianceScheme::QuadraticExponential => "qe",
        }
    }
}

/// Simulation settings shared by every call of a simulator.
///
/// # Examples
///
/// ```rust
/// use pricer_pricing::mc::{SimulationConfig, VarianceScheme};
///
/// let config = SimulationConfig::default()
///     .with_spot(1.25)
///     .with_dividend_yield(0.03)
///     .with_scheme(VarianceScheme::QuadraticExponential)
///     .with_antithetic(true);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimulationConfig {
    /// Initial spot.
    ///
    /// Default: 100.0
    pub spot: f64,

    /// Continuous dividend (or foreign) yield.
    ///
    /// Default: 0.0
    pub dividend_yield: f64,

    /// Variance discretisation.
    ///
    /// Default: FullTruncation
    pub scheme: VarianceScheme,

    /// Pair each path with its negated-normal twin.
    ///
    /// Default: false
    pub antithetic: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            spot: 100.0,
            dividend_yield: 0.0,
            scheme: VarianceScheme::FullTruncation,
            antithetic: false,
        }
    }
}

impl SimulationConfig {
    /// Set the initial spot.
    pub fn with_spot(mut self, spot: f64) -> Self {
        self.spot = spot;
        self
    }

    /// Set the dividend yield.
    pub fn with_dividend_yield(mut self, dividend_yield: f64) -> Self {
        self.dividend_yield = dividend_yield;
        self
    }

    /// Set the variance scheme.
    pub fn with_scheme(mut self, scheme: VarianceScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Enable or disable antithetic pairs.
    pub fn with_antithetic(mut self, antithetic: bool) -> Self {
        self.antithetic = antithetic;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a non-positive or non-finite spot, or a
    /// non-finite dividend yield.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        if !(self.spot > 0.0) || !self.spot.is_finite() {
            return Err(CalibrationError::invalid_input(
                ErrorLocation::Parameter("spot"),
                format!("spot must be positive and finite, got {}", self.spot),
            ));
        }
        if !self.dividend_yield.is_finite() {
            return Err(CalibrationError::invalid_input(
                ErrorLocation::Parameter("dividend_yield"),
                "dividend yield must be finite",
            ));
        }
        Ok(())
    }
}

/// Checks a simulation grid request.
///
/// # Errors
///
/// `InvalidInput(Parameter(name))` unless `horizon` is positive and finite,
/// `1 <= n_paths <= MAX_PATHS` and `1 <= n_steps <= MAX_STEPS`.
pub fn validate_grid(horizon: f64, n_paths: usize, n_steps: usize) -> Result<(), CalibrationError> {
    if !(horizon > 0.0) || !horizon.is_finite() {
        return Err(CalibrationError::invalid_input(
            ErrorLocation::Parameter("horizon"),
            format!("horizon must be positive and finite, got {}", horizon),
        ));
    }
    if n_paths == 0 || n_paths > MAX_PATHS {
        return Err(CalibrationError::invalid_input(
            ErrorLocation::Parameter("n_paths"),
            format!("n_paths must lie in [1, {}], got {}", MAX_PATHS, n_paths),
        ));
    }
    if n_steps == 0 || n_steps > MAX_STEPS {
        return Err(CalibrationError::invalid_input(
            ErrorLocation::Parameter("n_steps"),
            format!("n_steps must lie in [1, {}], got {}", MAX_STEPS, n_steps),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricer_core::types::ErrorKind;

    #[test]
    fn test_grid_limits() {
        assert!(validate_grid(1.0, 1, 1).is_ok());
        assert!(validate_grid(1.0, MAX_PATHS, MAX_STEPS).is_ok());

        let cases = [
            (0.0, 10, 10, "horizon"),
            (f64::NAN, 10, 10, "horizon"),
            (1.0, 0, 10, "n_paths"),
            (1.0, MAX_PATHS + 1, 10, "n_paths"),
            (1.0, 10, 0, "n_steps"),
            (1.0, 10, MAX_STEPS + 1, "n_steps"),
        ];
        for (horizon, paths, steps, name) in cases {
            let err = validate_grid(horizon, paths, steps).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
            assert_eq!(err.location(), Some(ErrorLocation::Parameter(name)));
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(SimulationConfig::default().validate().is_ok());
        assert!(SimulationConfig::default().with_spot(0.0).validate().is_err());
        assert!(SimulationConfig::default()
            .with_dividend_yield(f64::INFINITY)
            .validate()
            .is_err());
    }
}
