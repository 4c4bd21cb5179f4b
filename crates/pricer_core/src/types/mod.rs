//! Core time and error types.
//!
//! This module provides:
//! - `time`: Time types (Date, DayCountConvention, BusinessDayConvention, Tenor)
//! - `error`: The calibration error taxonomy and the narrow solver,
//!   interpolation and date errors it is built from
//!
//! # Re-exports
//!
//! - [`Date`], [`DayCountConvention`], [`BusinessDayConvention`], [`Tenor`], [`TenorUnit`] from `time`
//! - [`CalibrationError`], [`ErrorKind`], [`ErrorLocation`], [`DateError`], [`InterpolationError`], [`SolverError`] from `error`

pub mod error;
pub mod time;

pub use error::{
    CalibrationError, DateError, ErrorKind, ErrorLocation, InterpolationError, SolverError,
};
pub use time::{BusinessDayConvention, Date, DayCountConvention, Tenor, TenorUnit};
