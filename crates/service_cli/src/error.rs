//! CLI error types.

use std::path::PathBuf;

use pricer_core::types::CalibrationError;
use thiserror::Error;

/// Failures of the `quantcore` binary.
///
/// Library errors keep their own taxonomy and are wrapped as they are.
#[derive(Debug, Error)]
pub enum CliError {
    /// The job file does not exist.
    #[error("job file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The job file or the environment overrides could not be read.
    #[error("cannot load job: {0}")]
    Config(#[from] config::ConfigError),

    /// The job loaded but describes something the pipeline cannot run.
    #[error("invalid job: {0}")]
    InvalidJob(String),

    /// A bootstrap, calibration or simulation step failed.
    #[error(transparent)]
    Pricer(#[from] CalibrationError),

    /// Writing the report failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding the report failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;
