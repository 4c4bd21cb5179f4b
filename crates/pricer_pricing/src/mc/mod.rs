//! Monte Carlo path simulation.
//!
//! # Architecture
//!
//! ```text
//! HestonSimulator / GbmSimulator
//! ├── SimulationConfig  (spot, dividend yield, scheme, antithetic)
//! ├── Grid              (uniform times, per-step drifts from the curve)
//! ├── Stepper           (one-step model transition)
//! └── generate()        (rayon over streams) ──> PathSet
//!                                                  └── european_price()
//! ```

mod config;
mod engine;
mod estimator;
mod gbm;
mod heston;
mod paths;

pub use config::{validate_grid, SimulationConfig, VarianceScheme, MAX_PATHS, MAX_STEPS};
pub use estimator::{european_price, McEstimate};
pub use gbm::GbmSimulator;
pub use heston::{HestonSimulator, PSI_CRITICAL};
pub use paths::{PathSet, PathView};
