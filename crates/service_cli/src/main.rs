//! quantcore CLI - curve bootstrapping, Heston calibration and simulation
//!
//! # Commands
//!
//! - `quantcore run --config job.toml [--output out.json]` - bootstrap the
//!   curve, calibrate Heston to the smiles, then compare a Monte Carlo price
//!   with the semi-analytic one and print a JSON report
//! - `quantcore check --config job.toml` - validate a job without running it
//!
//! # Architecture
//!
//! As part of the **S**ervice layer, this crate orchestrates the pricer
//! layers. It is the only place where a tracing subscriber is installed and
//! where files are read or written.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod error;

pub use error::{CliError, Result};

use crate::config::LogLevel;

/// quantcore pipeline runner
#[derive(Parser)]
#[command(name = "quantcore")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level; `RUST_LOG` is used when omitted
    #[arg(long, global = true, value_enum, env = "QUANTCORE_LOG_LEVEL")]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bootstrap, calibrate and simulate
    Run {
        /// Job file (TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a job file without running it
    Check {
        /// Job file (TOML)
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn init_tracing(level: Option<LogLevel>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level.as_filter_str()),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(LogLevel::default().as_filter_str())),
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level);

    match cli.command {
        Commands::Run { config, output } => commands::run::run(&config, output.as_deref()),
        Commands::Check { config } => commands::check::run(&config),
    }
}
