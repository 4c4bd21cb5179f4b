//! Check command implementation
//!
//! Loads and validates a job, resolves instrument dates and verifies that
//! the curve will reach every expiry, without solving anything.

use std::path::Path;

use anyhow::Context;
use pricer_core::market_data::curves::Extrapolation;
use pricer_optimiser::bootstrapping::CurveBuilder;
use tracing::info;

use crate::config::JobConfig;
use crate::CliError;

/// Validate the job at `config`.
pub fn run(config: &Path) -> anyhow::Result<()> {
    let job = JobConfig::load(config)
        .with_context(|| format!("loading job {}", config.display()))?;
    let summary = check(&job)?;
    println!(
        "{}: {} instruments up to {:.4}y, {} smiles up to {:.4}y",
        config.display(),
        job.instruments.len(),
        summary.curve_end,
        job.smiles.len(),
        summary.last_expiry
    );
    Ok(())
}

/// Extent of a checked job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    /// Year fraction of the latest instrument maturity.
    pub curve_end: f64,
    /// Latest time the pipeline reads from the curve.
    pub last_expiry: f64,
}

/// Everything `run` would reject before its first solve.
pub fn check(job: &JobConfig) -> anyhow::Result<Summary> {
    job.validate().context("validating job")?;

    let builder = CurveBuilder::new(job.bootstrap.clone(), job.valuation_date);
    let resolved = builder
        .resolve(&job.instruments, &job.conventions())
        .context("resolving instrument dates")?;
    for inst in &resolved {
        info!(
            instrument = inst.index,
            kind = %inst.kind,
            start = %inst.start_date,
            end = %inst.end_date,
            t = inst.end,
            "instrument resolved"
        );
    }

    let curve_end = resolved.iter().map(|r| r.end).fold(0.0, f64::max);
    let max_expiry = job.smiles.iter().map(|s| s.expiry()).fold(0.0, f64::max);
    let horizon = job.simulation.horizon_or(max_expiry);
    let last_expiry = max_expiry.max(horizon);
    if last_expiry > curve_end && job.bootstrap.extrapolation == Extrapolation::None {
        return Err(CliError::InvalidJob(format!(
            "the curve ends at {:.4}y but the job reads it at {:.4}y; \
             add instruments or set bootstrap.extrapolation = \"flat_forward\"",
            curve_end, last_expiry
        ))
        .into());
    }
    Ok(Summary {
        curve_end,
        last_expiry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = include_str!("../../jobs/sample.toml");

    fn sample() -> JobConfig {
        toml::from_str(SAMPLE).unwrap()
    }

    #[test]
    fn test_sample_job_passes() {
        let summary = check(&sample()).unwrap();
        assert!(summary.curve_end > 4.9 && summary.curve_end < 5.1);
        assert_eq!(summary.last_expiry, 2.0);
    }

    #[test]
    fn test_horizon_past_curve_needs_extrapolation() {
        let mut job = sample();
        job.simulation.horizon = Some(8.0);
        let err = check(&job).unwrap_err();
        assert!(err.to_string().contains("flat_forward"));

        job.bootstrap.extrapolation = Extrapolation::FlatForward;
        assert_eq!(check(&job).unwrap().last_expiry, 8.0);
    }

    #[test]
    fn test_invalid_instrument_is_reported() {
        let mut job = sample();
        job.instruments.clear();
        let err = check(&job).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::InvalidJob(_))
        ));
    }
}
