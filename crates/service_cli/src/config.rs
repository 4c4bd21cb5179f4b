//! Job configuration management
//!
//! A job is read from a TOML file and then overridden from `QUANTCORE_*`
//! environment variables, nested keys joined by `__`:
//!
//! ```text
//! QUANTCORE_SIMULATION__N_PATHS=200000
//! QUANTCORE_CALIBRATION__N_RESTARTS=8
//! ```

use std::path::Path;

use config::{Config, Environment, File, FileFormat, Map};
use pricer_core::conventions::WeekendCalendar;
use pricer_core::market_data::SmileData;
use pricer_core::types::Date;
use pricer_models::calibration::CalibratorConfig;
use pricer_models::models::HestonParams;
use pricer_optimiser::bootstrapping::{BootstrapConfig, Instrument};
use pricer_pricing::mc::{validate_grid, SimulationConfig, VarianceScheme};
use serde::{Deserialize, Serialize};

use crate::{CliError, Result};

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "QUANTCORE";

/// Log levels accepted by `--log-level`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert log level to tracing filter string
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Monte Carlo settings of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationJob {
    /// Variance discretisation.
    ///
    /// Default: FullTruncation
    pub scheme: VarianceScheme,

    /// Antithetic pairing.
    ///
    /// Default: false
    pub antithetic: bool,

    /// Simulation horizon in years.
    ///
    /// Default: the longest smile expiry
    pub horizon: Option<f64>,

    /// Strike of the reported option.
    ///
    /// Default: the forward at the horizon
    pub strike: Option<f64>,

    /// Number of paths.
    ///
    /// Default: 50000
    pub n_paths: usize,

    /// Time steps per path.
    ///
    /// Default: 100
    pub n_steps: usize,

    /// Master seed; drawn from the OS and reported when absent.
    ///
    /// Default: None
    pub seed: Option<u64>,
}

impl Default for SimulationJob {
    fn default() -> Self {
        Self {
            scheme: VarianceScheme::FullTruncation,
            antithetic: false,
            horizon: None,
            strike: None,
            n_paths: 50_000,
            n_steps: 100,
            seed: None,
        }
    }
}

impl SimulationJob {
    /// Simulator settings for paths started from `smile`'s spot and yield.
    pub fn simulation_config(&self, smile: &SmileData) -> SimulationConfig {
        SimulationConfig::default()
            .with_spot(smile.spot())
            .with_dividend_yield(smile.dividend_yield())
            .with_scheme(self.scheme)
            .with_antithetic(self.antithetic)
    }

    /// The horizon, or `fallback` when none is configured.
    pub fn horizon_or(&self, fallback: f64) -> f64 {
        self.horizon.unwrap_or(fallback)
    }
}

/// A complete pipeline job: curve inputs, smiles and simulation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Valuation date, `t = 0` of the curve.
    pub valuation_date: Date,

    /// Holidays on top of weekends.
    #[serde(default)]
    pub holidays: Vec<Date>,

    /// Curve builder settings.
    #[serde(default)]
    pub bootstrap: BootstrapConfig,

    /// Quoted rate instruments.
    pub instruments: Vec<Instrument>,

    /// Implied-vol smiles, one per expiry.
    pub smiles: Vec<SmileData>,

    /// Calibrator settings.
    #[serde(default)]
    pub calibration: CalibratorConfig,

    /// First start of the calibration; derived from the smiles when absent.
    #[serde(default)]
    pub initial_guess: Option<HestonParams>,

    /// Monte Carlo settings.
    #[serde(default)]
    pub simulation: SimulationJob,
}

impl JobConfig {
    /// Load a job from `path` with environment overrides applied.
    ///
    /// # Errors
    ///
    /// `FileNotFound` when `path` does not exist, `Config` when the file or
    /// an override does not parse into a job.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CliError::FileNotFound(path.to_path_buf()));
        }
        Self::from_sources(File::from(path).format(FileFormat::Toml), None)
    }

    /// `env = None` reads the process environment.
    fn from_sources<S>(file: S, env: Option<Map<String, String>>) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let job = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize()?;
        Ok(job)
    }

    /// Weekend calendar with the job's holidays.
    pub fn conventions(&self) -> WeekendCalendar {
        WeekendCalendar::with_holidays(self.holidays.iter().copied())
    }

    /// The smile with the longest expiry, which anchors the simulation.
    pub fn reference_smile(&self) -> Option<&SmileData> {
        self.smiles
            .iter()
            .max_by(|a, b| a.expiry().total_cmp(&b.expiry()))
    }

    /// Check every setting without running any engine.
    ///
    /// # Errors
    ///
    /// `InvalidJob` for an empty instrument or smile list or a bad strike,
    /// `Pricer` for the first setting an engine would reject.
    pub fn validate(&self) -> Result<()> {
        if self.instruments.is_empty() {
            return Err(CliError::InvalidJob("no instruments".to_string()));
        }
        let smile = self
            .reference_smile()
            .ok_or_else(|| CliError::InvalidJob("no smiles".to_string()))?;

        for (i, inst) in self.instruments.iter().enumerate() {
            inst.validate(i)?;
        }
        self.bootstrap.validate()?;
        self.calibration.validate()?;
        if let Some(guess) = &self.initial_guess {
            guess.validate()?;
        }

        let sim = &self.simulation;
        validate_grid(sim.horizon_or(smile.expiry()), sim.n_paths, sim.n_steps)?;
        sim.simulation_config(smile).validate()?;
        if let Some(k) = sim.strike {
            if !(k > 0.0) || !k.is_finite() {
                return Err(CliError::InvalidJob(format!(
                    "simulation strike must be positive, got {}",
                    k
                )));
            }
        }
        Ok(())
    }
}
