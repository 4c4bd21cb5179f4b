//! Solver configuration types.

use num_traits::Float;

/// Configuration for root-finding algorithms.
///
/// A root is accepted when `|f(x)| <= tolerance` or when the bracket has
/// shrunk below `x_tolerance` relative to `|x|`.
///
/// # Example
///
/// ```
/// use pricer_core::math::solvers::SolverConfig;
///
/// let config: SolverConfig<f64> = SolverConfig::default();
/// assert!(config.tolerance < 1e-8);
/// assert_eq!(config.max_iterations, 100);
///
/// let custom = SolverConfig::new(1e-12, 200).with_x_tolerance(1e-14);
/// assert_eq!(custom.max_iterations, 200);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig<T: Float> {
    /// Absolute tolerance on the function value.
    pub tolerance: T,

    /// Relative tolerance on the bracket width.
    pub x_tolerance: T,

    /// Maximum number of function evaluations inside the iteration loop.
    pub max_iterations: usize,
}

impl<T: Float> Default for SolverConfig<T> {
    /// Default values:
    /// - `tolerance`: 1e-10
    /// - `x_tolerance`: 4 machine epsilons
    /// - `max_iterations`: 100
    fn default() -> Self {
        let four = T::one() + T::one() + T::one() + T::one();
        Self {
            tolerance: T::from(1e-10).unwrap_or_else(T::epsilon),
            x_tolerance: four * T::epsilon(),
            max_iterations: 100,
        }
    }
}

impl<T: Float> SolverConfig<T> {
    /// Create a new configuration.
    ///
    /// # Panics
    ///
    /// Panics if `tolerance <= 0` or `max_iterations == 0`.
    pub fn new(tolerance: T, max_iterations: usize) -> Self {
        assert!(tolerance > T::zero(), "tolerance must be positive");
        assert!(max_iterations > 0, "max_iterations must be > 0");
        Self {
            tolerance,
            max_iterations,
            ..Self::default()
        }
    }

    /// Replace the bracket tolerance.
    pub fn with_x_tolerance(mut self, x_tolerance: T) -> Self {
        self.x_tolerance = x_tolerance;
        self
    }

    /// Tight settings (`1e-14`, 500 iterations).
    pub fn high_precision() -> Self {
        Self {
            tolerance: T::from(1e-14).unwrap_or_else(T::epsilon),
            max_iterations: 500,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config: SolverConfig<f64> = SolverConfig::default();
        assert!((config.tolerance - 1e-10).abs() < 1e-15);
        assert!((config.x_tolerance - 4.0 * f64::EPSILON).abs() < 1e-30);
        assert_eq!(config.max_iterations, 100);
    }

    #[test]
    fn test_new_config() {
        let config: SolverConfig<f64> = SolverConfig::new(1e-12, 200);
        assert!((config.tolerance - 1e-12).abs() < 1e-17);
        assert_eq!(config.max_iterations, 200);
    }

    #[test]
    #[should_panic(expected = "tolerance must be positive")]
    fn test_new_config_zero_tolerance_panics() {
        let _: SolverConfig<f64> = SolverConfig::new(0.0, 100);
    }

    #[test]
    #[should_panic(expected = "max_iterations must be > 0")]
    fn test_new_config_zero_iterations_panics() {
        let _: SolverConfig<f64> = SolverConfig::new(1e-10, 0);
    }

    #[test]
    fn test_high_precision_config() {
        let config: SolverConfig<f64> = SolverConfig::high_precision();
        assert!(config.tolerance < 1e-12);
        assert!(config.max_iterations >= 500);
    }
}
