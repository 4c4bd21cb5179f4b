//! Geometric Brownian motion path simulation.
//!
//! Uses the exact log-space step
//!
//! ```text
//! S(t+dt) = S(t) × exp(r dt - q dt - σ²dt/2 + σ√dt × Z)
//! ```
//!
//! with the rate read from the curve per step, so there is no
//! discretisation bias. The variance buffer holds `σ²` throughout.

use std::time::Instant;

use pricer_core::market_data::curves::YieldCurve;
use pricer_core::types::{CalibrationError, ErrorLocation};
use tracing::debug;

use super::config::{validate_grid, SimulationConfig};
use super::engine::{generate, Grid, Stepper};
use super::paths::PathSet;
use crate::rng::entropy_seed;

/// Constant-volatility simulator on the same grid and seeding contract as
/// [`HestonSimulator`](super::HestonSimulator).
///
/// The variance scheme of the configuration is ignored.
#[derive(Debug, Clone, Copy)]
pub struct GbmSimulator {
    config: SimulationConfig,
    volatility: f64,
}

impl GbmSimulator {
    /// Simulator with volatility `volatility`.
    pub fn new(config: SimulationConfig, volatility: f64) -> Self {
        Self { config, volatility }
    }

    /// Active settings.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Constant volatility.
    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    /// Simulate `n_paths` paths of `n_steps` steps up to `horizon`.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an invalid grid, configuration or a negative
    /// volatility; `OutOfRange` when the curve does not reach `horizon`.
    pub fn simulate<C: YieldCurve + ?Sized>(
        &self,
        curve: &C,
        horizon: f64,
        n_paths: usize,
        n_steps: usize,
        seed: Option<u64>,
    ) -> Result<PathSet, CalibrationError> {
        let started = Instant::now();
        self.config.validate()?;
        validate_grid(horizon, n_paths, n_steps)?;
        if !(self.volatility >= 0.0) || !self.volatility.is_finite() {
            return Err(CalibrationError::invalid_input(
                ErrorLocation::Parameter("volatility"),
                format!("volatility must be non-negative and finite, got {}", self.volatility),
            ));
        }

        let grid = Grid::build(curve, horizon, n_steps, self.config.dividend_yield)?;
        let seed = seed.unwrap_or_else(entropy_seed);
        let stepper = GbmStepper {
            variance: self.volatility * self.volatility,
            sd: self.volatility * grid.dt.sqrt(),
            dt: grid.dt,
        };
        let (spot, variance) = generate(
            &stepper,
            &grid,
            self.config.spot,
            n_paths,
            seed,
            self.config.antithetic,
        );

        debug!(
            n_paths,
            n_steps,
            horizon,
            seed,
            volatility = self.volatility,
            elapsed_ms = started.elapsed().as_secs_f64() * 1e3,
            "gbm paths simulated"
        );
        Ok(PathSet::new(n_steps, grid.times, spot, variance, seed, self.config.antithetic))
    }
}

struct GbmStepper {
    variance: f64,
    sd: f64,
    dt: f64,
}

impl Stepper for GbmStepper {
    fn initial_variance(&self) -> f64 {
        self.variance
    }

    fn advance(&self, drift: f64, ln_s: &mut f64, _v: &mut f64, _z_v: f64, z_s: f64) -> f64 {
        *ln_s += drift - 0.5 * self.variance * self.dt + self.sd * z_s;
        self.variance
    }
}
