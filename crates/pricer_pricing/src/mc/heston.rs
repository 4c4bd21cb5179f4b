//! Heston path simulation.
//!
//! ```text
//! d ln S = (r - q - v/2) dt + sqrt(v) dW_S
//! dv     = kappa (theta - v) dt + sigma sqrt(v) dW_v,   dW_S dW_v = rho dt
//! ```
//!
//! on a uniform grid, with the variance step chosen by [`VarianceScheme`].
//!
//! # Examples
//!
//! ```rust
//! use pricer_core::market_data::FlatCurve;
//! use pricer_models::models::HestonParams;
//! use pricer_pricing::mc::{HestonSimulator, SimulationConfig};
//!
//! let params = HestonParams::new(0.04, 1.5, 0.04, 0.3, -0.7).unwrap();
//! let sim = HestonSimulator::new(SimulationConfig::default());
//! let paths = sim
//!     .simulate(&params, &FlatCurve::new(0.02), 1.0, 1_000, 50, Some(42))
//!     .unwrap();
//! assert_eq!(paths.n_paths(), 1_000);
//! assert_eq!(paths.times().len(), 51);
//! ```

use std::time::Instant;

use pricer_core::market_data::curves::YieldCurve;
use pricer_core::types::CalibrationError;
use pricer_models::analytical::norm_cdf;
use pricer_models::models::HestonParams;
use tracing::debug;

use super::config::{validate_grid, SimulationConfig, VarianceScheme};
use super::engine::{generate, Grid, Stepper};
use super::paths::PathSet;
use crate::rng::entropy_seed;

/// QE switches from the quadratic to the exponential branch above this
/// `ψ = s² / m²`.
pub const PSI_CRITICAL: f64 = 1.5;

/// Heston Monte Carlo simulator.
#[derive(Debug, Clone, Copy, Default)]
pub struct HestonSimulator {
    config: SimulationConfig,
}

impl HestonSimulator {
    /// Simulator with the given settings.
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// Active settings.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Simulate `n_paths` paths of `n_steps` steps up to `horizon`.
    ///
    /// With `seed = Some(s)` the output is bit-identical across calls and
    /// thread counts. With `None` a seed is drawn from the OS and reported
    /// by [`PathSet::seed`].
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for an invalid grid or configuration
    /// - `DomainViolation` for parameters outside their hard bounds
    /// - `OutOfRange` when the curve does not reach `horizon`
    pub fn simulate<C: YieldCurve + ?Sized>(
        &self,
        params: &HestonParams,
        curve: &C,
        horizon: f64,
        n_paths: usize,
        n_steps: usize,
        seed: Option<u64>,
    ) -> Result<PathSet, CalibrationError> {
        let started = Instant::now();
        self.config.validate()?;
        validate_grid(horizon, n_paths, n_steps)?;
        params.validate()?;

        let grid = Grid::build(curve, horizon, n_steps, self.config.dividend_yield)?;
        let seed = seed.unwrap_or_else(entropy_seed);
        let stepper = HestonStepper::new(params, self.config.scheme, grid.dt);
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
            scheme = self.config.scheme.name(),
            antithetic = self.config.antithetic,
            elapsed_ms = started.elapsed().as_secs_f64() * 1e3,
            "heston paths simulated"
        );
        Ok(PathSet::new(n_steps, grid.times, spot, variance, seed, self.config.antithetic))
    }
}

/// Andersen's QE constants for a fixed `dt`.
#[derive(Debug, Clone, Copy)]
struct QeCoefficients {
    decay: f64,
    var_v: f64,
    var_const: f64,
    k0: f64,
    k1: f64,
    k2: f64,
    k3: f64,
    k4: f64,
}

impl QeCoefficients {
    fn new(p: &HestonParams, dt: f64) -> Self {
        let decay = (-p.kappa * dt).exp();
        let one_minus = -(-p.kappa * dt).exp_m1();
        let s2 = p.sigma * p.sigma;
        // gamma1 = gamma2 = 1/2
        let (g1, g2) = (0.5, 0.5);
        let tilt = p.kappa * p.rho / p.sigma - 0.5;
        Self {
            decay,
            var_v: s2 * decay * one_minus / p.kappa,
            var_const: p.theta * s2 * one_minus * one_minus / (2.0 * p.kappa),
            k0: -p.rho * p.kappa * p.theta * dt / p.sigma,
            k1: g1 * dt * tilt - p.rho / p.sigma,
            k2: g2 * dt * tilt + p.rho / p.sigma,
            k3: g1 * dt * (1.0 - p.rho * p.rho),
            k4: g2 * dt * (1.0 - p.rho * p.rho),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct HestonStepper {
    params: HestonParams,
    scheme: VarianceScheme,
    dt: f64,
    rho_bar: f64,
    qe: QeCoefficients,
}

impl HestonStepper {
    fn new(params: &HestonParams, scheme: VarianceScheme, dt: f64) -> Self {
        Self {
            params: *params,
            scheme,
            dt,
            rho_bar: (1.0 - params.rho * params.rho).max(0.0).sqrt(),
            qe: QeCoefficients::new(params, dt),
        }
    }

    fn euler(&self, drift: f64, ln_s: &mut f64, v: f64, z_v: f64, z_s: f64) -> f64 {
        let p = &self.params;
        let sd = (v * self.dt).sqrt();
        *ln_s += drift - 0.5 * v * self.dt + sd * (p.rho * z_v + self.rho_bar * z_s);
        p.kappa * (p.theta - v) * self.dt + p.sigma * sd * z_v
    }

    fn quadratic_exponential(&self, drift: f64, ln_s: &mut f64, v: f64, z_v: f64, z_s: f64) -> f64 {
        let p = &self.params;
        let qe = &self.qe;
        let m = p.theta + (v - p.theta) * qe.decay;
        let s2 = v * qe.var_v + qe.var_const;
        let psi = s2 / (m * m);

        let next = if psi <= PSI_CRITICAL {
            let inv = 2.0 / psi;
            let b2 = inv - 1.0 + (inv * (inv - 1.0)).sqrt();
            let a = m / (1.0 + b2);
            let x = b2.sqrt() + z_v;
            a * x * x
        } else {
            let prob_zero = (psi - 1.0) / (psi + 1.0);
            let beta = (1.0 - prob_zero) / m;
            // 1 - U with U = N(z_v), evaluated directly for tail accuracy
            let tail = norm_cdf(-z_v).max(f64::MIN_POSITIVE);
            if tail >= 1.0 - prob_zero {
                0.0
            } else {
                ((1.0 - prob_zero) / tail).ln() / beta
            }
        };

        let spread = (qe.k3 * v + qe.k4 * next).max(0.0).sqrt();
        *ln_s += drift + qe.k0 + qe.k1 * v + qe.k2 * next + spread * z_s;
        next
    }
}

impl Stepper for HestonStepper {
    fn initial_variance(&self) -> f64 {
        self.params.v0
    }

    fn advance(&self, drift: f64, ln_s: &mut f64, v: &mut f64, z_v: f64, z_s: f64) -> f64 {
        match self.scheme {
            VarianceScheme::FullTruncation => {
                let vp = v.max(0.0);
                *v += self.euler(drift, ln_s, vp, z_v, z_s);
                v.max(0.0)
            }
            VarianceScheme::Reflection => {
                let current = *v;
                *v = (current + self.euler(drift, ln_s, current, z_v, z_s)).abs();
                *v
            }
            VarianceScheme::QuadraticExponential => {
                *v = self.quadratic_exponential(drift, ln_s, *v, z_v, z_s);
                *v
            }
        }
    }
}
