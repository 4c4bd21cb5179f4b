//! Root-finding and least-squares solvers.
//!
//! ## Root-Finding
//!
//! - [`BrentSolver`]: bracketing method without derivatives, with a
//!   secant-seeded variant for problems without a known bracket
//!
//! ## Optimisation
//!
//! - [`LevenbergMarquardtSolver`]: nonlinear least squares for model
//!   calibration, with iteration and wall-clock budgets
//!
//! ## Examples
//!
//! ```
//! use pricer_core::math::solvers::{BrentSolver, SolverConfig};
//!
//! let solver = BrentSolver::new(SolverConfig::default());
//! let root = solver.find_root(|x: f64| x * x - 2.0, 1.0, 2.0).unwrap();
//! assert!((root - std::f64::consts::SQRT_2).abs() < 1e-10);
//! ```
//!
//! ```
//! use pricer_core::math::solvers::LevenbergMarquardtSolver;
//!
//! let residuals = |p: &[f64]| -> Vec<f64> { vec![p[0] - 2.0, p[1] - 3.0] };
//! let result = LevenbergMarquardtSolver::with_defaults()
//!     .solve(residuals, vec![0.0, 0.0])
//!     .unwrap();
//! assert!(result.converged);
//! ```

mod brent;
mod config;
mod levenberg_marquardt;

pub use brent::{BrentSolver, RootResult};
pub use config::SolverConfig;
pub use levenberg_marquardt::{LMConfig, LMResult, LMTermination, LevenbergMarquardtSolver};
