//! Heston model calibration.
//!
//! - [`HestonCalibrator`]: Levenberg-Marquardt fit to one smile, a surface
//!   of smiles, or a batch of independent smiles
//! - [`CalibratorConfig`]: LM settings, restarts, weighting, acceptance
//! - [`CalibrationResult`]: fitted parameters with [`CalibrationDiagnostics`]
//!
//! # Flow
//!
//! ```text
//! SmileData ─┐
//!            ├─> market prices + vega scales ─> LM in x-space ─> HestonParams
//! YieldCurve ┘                                      │
//!                                     restarts, acceptance in vol RMSE
//! ```

mod config;
pub mod heston;
mod result;
pub mod transform;

pub use config::{CalibratorConfig, Weighting};
pub use heston::{HestonCalibrator, MIN_DISTINCT_QUOTES};
pub use result::{CalibrationDiagnostics, CalibrationResult};
