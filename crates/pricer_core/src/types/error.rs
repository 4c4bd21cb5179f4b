//! Error types for structured error handling.
//!
//! This module provides:
//! - `CalibrationError`: the four-kind taxonomy shared by the curve builder,
//!   the model calibrator and the simulator
//! - `ErrorLocation`: which instrument, quote or parameter an error refers to
//! - `DateError`: Errors from date construction and parsing
//! - `InterpolationError`: Errors from interpolation operations
//! - `SolverError`: Errors from root-finding and least-squares solvers
//!
//! Numeric kernels return the narrow `SolverError` / `InterpolationError`
//! types. Engines translate them into `CalibrationError`, attaching the
//! location and iteration context the caller needs to diagnose a failure.

use std::fmt;
use thiserror::Error;

/// The item an error refers to.
///
/// # Examples
/// ```
/// use pricer_core::types::ErrorLocation;
///
/// assert_eq!(ErrorLocation::Instrument(3).to_string(), "instrument #3");
/// assert_eq!(ErrorLocation::Parameter("rho").to_string(), "parameter rho");
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ErrorLocation {
    /// The input as a whole (e.g. an empty instrument set).
    Input,
    /// Index into the caller's instrument sequence.
    Instrument(usize),
    /// Index into a smile's quote sequence.
    Quote(usize),
    /// Index into a sequence of smiles.
    Smile(usize),
    /// A named model parameter.
    Parameter(&'static str),
    /// A curve pillar identified by its time in years.
    Pillar(f64),
}

impl fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorLocation::Input => write!(f, "input"),
            ErrorLocation::Instrument(i) => write!(f, "instrument #{}", i),
            ErrorLocation::Quote(i) => write!(f, "quote #{}", i),
            ErrorLocation::Smile(i) => write!(f, "smile #{}", i),
            ErrorLocation::Parameter(name) => write!(f, "parameter {}", name),
            ErrorLocation::Pillar(t) => write!(f, "pillar t={:.6}", t),
        }
    }
}

/// Discriminant of [`CalibrationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ErrorKind {
    /// Caller data defect.
    InvalidInput,
    /// Iteration or time budget exhausted.
    NonConvergent,
    /// Query outside the curve domain.
    OutOfRange,
    /// Result violates a hard domain constraint.
    DomainViolation,
}

/// Errors raised by curve construction, model calibration and simulation.
///
/// No engine in this workspace returns a best-effort result on failure:
/// every unresolved numerical problem surfaces as one of these variants.
///
/// # Examples
/// ```
/// use pricer_core::types::{CalibrationError, ErrorKind, ErrorLocation};
///
/// let err = CalibrationError::non_convergent(ErrorLocation::Instrument(2), 100, 3.2e-6);
/// assert_eq!(err.kind(), ErrorKind::NonConvergent);
/// assert!(err.is_retryable());
/// assert!(err.to_string().contains("instrument #2"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum CalibrationError {
    /// Malformed or insufficient instruments, quotes or arguments.
    #[error("invalid input at {location}: {reason}")]
    InvalidInput {
        /// Offending item
        location: ErrorLocation,
        /// Human-readable description
        reason: String,
    },

    /// A root-finder or optimiser exhausted its budget.
    #[error("no convergence at {location}: residual {residual:.3e} after {iterations} iterations")]
    NonConvergent {
        /// Item being solved when the budget ran out
        location: ErrorLocation,
        /// Iterations performed
        iterations: usize,
        /// Best residual achieved
        residual: f64,
    },

    /// Curve queried outside `[min, max]` without extrapolation.
    #[error("time {t} outside curve domain [{min}, {max}]")]
    OutOfRange {
        /// Query time
        t: f64,
        /// Smallest supported time
        min: f64,
        /// Largest supported time
        max: f64,
    },

    /// Discount factors or model parameters violate a hard constraint.
    #[error("domain violation at {location}: {reason}")]
    DomainViolation {
        /// Offending item
        location: ErrorLocation,
        /// Human-readable description
        reason: String,
    },
}

impl CalibrationError {
    /// Create an `InvalidInput` error.
    pub fn invalid_input(location: ErrorLocation, reason: impl Into<String>) -> Self {
        CalibrationError::InvalidInput {
            location,
            reason: reason.into(),
        }
    }

    /// Create a `NonConvergent` error.
    pub fn non_convergent(location: ErrorLocation, iterations: usize, residual: f64) -> Self {
        CalibrationError::NonConvergent {
            location,
            iterations,
            residual,
        }
    }

    /// Create an `OutOfRange` error.
    pub fn out_of_range(t: f64, min: f64, max: f64) -> Self {
        CalibrationError::OutOfRange { t, min, max }
    }

    /// Create a `DomainViolation` error.
    pub fn domain_violation(location: ErrorLocation, reason: impl Into<String>) -> Self {
        CalibrationError::DomainViolation {
            location,
            reason: reason.into(),
        }
    }

    /// Translate a solver failure into the taxonomy.
    ///
    /// Budget exhaustion becomes `NonConvergent`; a missing bracket or a
    /// degenerate derivative means the problem has no admissible solution
    /// and becomes `DomainViolation`.
    pub fn from_solver(location: ErrorLocation, err: SolverError) -> Self {
        match err {
            SolverError::MaxIterationsExceeded {
                iterations,
                residual,
            } => CalibrationError::non_convergent(location, iterations, residual),
            SolverError::DeadlineExceeded {
                iterations,
                residual,
            } => CalibrationError::non_convergent(location, iterations, residual),
            other => CalibrationError::domain_violation(location, other.to_string()),
        }
    }

    /// The error's kind tag.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CalibrationError::InvalidInput { .. } => ErrorKind::InvalidInput,
            CalibrationError::NonConvergent { .. } => ErrorKind::NonConvergent,
            CalibrationError::OutOfRange { .. } => ErrorKind::OutOfRange,
            CalibrationError::DomainViolation { .. } => ErrorKind::DomainViolation,
        }
    }

    /// Whether retrying with a different guess or budget can help.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::NonConvergent
    }

    /// Location of the failure, when the variant carries one.
    pub fn location(&self) -> Option<ErrorLocation> {
        match self {
            CalibrationError::InvalidInput { location, .. }
            | CalibrationError::NonConvergent { location, .. }
            | CalibrationError::DomainViolation { location, .. } => Some(*location),
            CalibrationError::OutOfRange { .. } => None,
        }
    }
}

impl From<InterpolationError> for CalibrationError {
    fn from(err: InterpolationError) -> Self {
        match err {
            InterpolationError::OutOfBounds { x, min, max } => {
                CalibrationError::out_of_range(x, min, max)
            }
            other => CalibrationError::invalid_input(ErrorLocation::Input, other.to_string()),
        }
    }
}

/// Date-related errors.
///
/// # Examples
/// ```
/// use pricer_core::types::DateError;
///
/// let err = DateError::InvalidDate { year: 2024, month: 2, day: 30 };
/// assert_eq!(format!("{}", err), "Invalid date: 2024-2-30");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    /// Invalid date components.
    #[error("Invalid date: {year}-{month}-{day}")]
    InvalidDate {
        /// Year component
        year: i32,
        /// Month component
        month: u32,
        /// Day component
        day: u32,
    },

    /// Failed to parse a date or tenor string.
    #[error("Failed to parse '{input}': {reason}")]
    ParseError {
        /// The input string
        input: String,
        /// Why parsing failed
        reason: String,
    },
}

/// Interpolation errors.
///
/// # Examples
/// ```
/// use pricer_core::types::InterpolationError;
///
/// let err = InterpolationError::OutOfBounds { x: 5.0, min: 0.0, max: 3.0 };
/// assert!(format!("{}", err).contains("outside valid domain"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpolationError {
    /// Query point outside valid interpolation domain.
    #[error("Query point {x} outside valid domain [{min}, {max}]")]
    OutOfBounds {
        /// The query point that was out of bounds
        x: f64,
        /// Minimum valid value
        min: f64,
        /// Maximum valid value
        max: f64,
    },

    /// Insufficient data points for interpolation.
    #[error("Insufficient data points: got {got}, need at least {need}")]
    InsufficientData {
        /// Number of points provided
        got: usize,
        /// Minimum number of points required
        need: usize,
    },

    /// Abscissae not strictly increasing.
    #[error("Data is not strictly increasing at index {index}")]
    NonMonotonicData {
        /// Index where monotonicity violation was detected
        index: usize,
    },

    /// Invalid input data or parameters.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Root-finding and least-squares solver errors.
///
/// # Examples
/// ```
/// use pricer_core::types::SolverError;
///
/// let err = SolverError::MaxIterationsExceeded { iterations: 100, residual: 1e-3 };
/// assert!(format!("{}", err).contains("100 iterations"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// Solver failed to converge within maximum iterations.
    #[error("Failed to converge after {iterations} iterations (residual {residual:.3e})")]
    MaxIterationsExceeded {
        /// Number of iterations attempted
        iterations: usize,
        /// Residual at the last iterate
        residual: f64,
    },

    /// The wall-clock budget ran out.
    #[error("Deadline exceeded after {iterations} iterations (residual {residual:.3e})")]
    DeadlineExceeded {
        /// Number of iterations attempted
        iterations: usize,
        /// Residual at the last iterate
        residual: f64,
    },

    /// No valid bracket (function values at endpoints have same sign).
    #[error("No bracket: f({a}) and f({b}) have same sign")]
    NoBracket {
        /// Left bracket endpoint
        a: f64,
        /// Right bracket endpoint
        b: f64,
    },

    /// Normal equations could not be solved.
    #[error("Singular system: {0}")]
    SingularSystem(String),

    /// Non-finite values produced during iteration.
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),
}
