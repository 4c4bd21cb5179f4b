//! Run command implementation
//!
//! Bootstraps the curve, calibrates Heston to every smile at once and
//! checks a Monte Carlo price against the semi-analytic one.

use std::path::Path;

use anyhow::Context;
use pricer_core::market_data::curves::{DiscountCurve, YieldCurve};
use pricer_core::market_data::{OptionType, SmileData};
use pricer_models::analytical::HestonPricer;
use pricer_models::calibration::HestonCalibrator;
use pricer_models::models::HestonParams;
use pricer_optimiser::bootstrapping::CurveBuilder;
use pricer_pricing::mc::{european_price, HestonSimulator};
use tracing::info;

use super::report::{CurveReport, PricingReport, Report};
use crate::config::JobConfig;
use crate::CliError;

/// Run the job at `config` and write its report.
pub fn run(config: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let job = JobConfig::load(config)
        .with_context(|| format!("loading job {}", config.display()))?;
    job.validate().context("validating job")?;
    let report = execute(&job)?;
    report.write(output).context("writing report")?;
    Ok(())
}

/// Bootstrap, calibrate and simulate.
pub fn execute(job: &JobConfig) -> anyhow::Result<Report> {
    info!(
        valuation_date = %job.valuation_date,
        instruments = job.instruments.len(),
        smiles = job.smiles.len(),
        "running job"
    );

    let builder = CurveBuilder::new(job.bootstrap.clone(), job.valuation_date);
    let bootstrap = builder
        .build(&job.instruments, &job.conventions())
        .context("bootstrapping the discount curve")?;
    let curve_report = CurveReport::from_bootstrap(&bootstrap)?;
    info!(
        pillars = bootstrap.pillars.len(),
        passes = bootstrap.passes,
        max_relative_residual = curve_report.max_relative_residual,
        "curve built"
    );

    let fit = HestonCalibrator::new(job.calibration.clone())
        .calibrate_surface(&job.smiles, &bootstrap.curve, job.initial_guess)
        .context("calibrating Heston to the smiles")?;
    info!(
        v0 = fit.params.v0,
        kappa = fit.params.kappa,
        theta = fit.params.theta,
        sigma = fit.params.sigma,
        rho = fit.params.rho,
        rmse_vol = fit.diagnostics.rmse_vol,
        restarts = fit.diagnostics.restarts_tried,
        "heston calibrated"
    );

    let smile = job
        .reference_smile()
        .ok_or_else(|| CliError::InvalidJob("no smiles".to_string()))?;
    let pricing = price_call(job, smile, &fit.params, &bootstrap.curve)
        .context("pricing the reference option")?;
    info!(
        analytic = pricing.analytic,
        monte_carlo = pricing.monte_carlo.price,
        std_error = pricing.monte_carlo.std_error,
        "reference option priced"
    );

    Ok(Report {
        valuation_date: job.valuation_date,
        curve: curve_report,
        calibration: fit.into(),
        pricing,
    })
}

/// Call on the reference smile's underlying, struck at the forward unless
/// the job names a strike.
fn price_call(
    job: &JobConfig,
    smile: &SmileData,
    params: &HestonParams,
    curve: &DiscountCurve,
) -> anyhow::Result<PricingReport> {
    let sim = &job.simulation;
    let horizon = sim.horizon_or(smile.expiry());
    let forward =
        smile.spot() * (-smile.dividend_yield() * horizon).exp() / curve.discount_factor(horizon)?;
    let strike = sim.strike.unwrap_or(forward);

    let config = sim.simulation_config(smile);
    let paths = HestonSimulator::new(config).simulate(
        params,
        curve,
        horizon,
        sim.n_paths,
        sim.n_steps,
        sim.seed,
    )?;
    let monte_carlo = european_price(&paths, strike, OptionType::Call, curve)?;
    let analytic = HestonPricer::default().price(
        params,
        smile.spot(),
        smile.dividend_yield(),
        curve,
        strike,
        horizon,
        OptionType::Call,
    )?;

    Ok(PricingReport {
        scheme: config.scheme.name().to_string(),
        antithetic: config.antithetic,
        horizon,
        forward,
        strike,
        n_paths: sim.n_paths,
        n_steps: sim.n_steps,
        seed: paths.seed(),
        analytic,
        z_score: (monte_carlo.price - analytic) / monte_carlo.std_error,
        monte_carlo,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SAMPLE: &str = include_str!("../../jobs/sample.toml");

    fn small_job() -> JobConfig {
        let mut job: JobConfig = toml::from_str(SAMPLE).unwrap();
        job.calibration.n_restarts = 1;
        job.simulation.n_paths = 4_000;
        job.simulation.n_steps = 16;
        job
    }

    // ========================================
    // Pipeline
    // ========================================

    #[test]
    fn test_sample_job_runs_end_to_end() {
        let report = execute(&small_job()).unwrap();

        assert_eq!(report.curve.pillars.len(), 7);
        assert!(report.curve.max_relative_residual < 1e-8);
        assert!(report
            .curve
            .pillars
            .windows(2)
            .all(|w| w[1].discount_factor < w[0].discount_factor));

        let fit = &report.calibration.result;
        assert!(fit.diagnostics.rmse_vol <= 2e-3);
        assert_relative_eq!(fit.params.v0, 0.04, max_relative = 0.1);
        assert!(fit.params.rho < -0.3, "rho = {}", fit.params.rho);

        let pricing = &report.pricing;
        assert_eq!(pricing.horizon, 2.0);
        assert_eq!(pricing.seed, 20250102);
        assert_eq!(pricing.strike, pricing.forward);
        assert!(pricing.z_score.abs() < 4.0, "z = {}", pricing.z_score);
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let job = small_job();
        let a = execute(&job).unwrap();
        let b = execute(&job).unwrap();
        assert_eq!(a.pricing.monte_carlo, b.pricing.monte_carlo);
        assert_eq!(a.calibration.result.params, b.calibration.result.params);
    }

    #[test]
    fn test_report_json_has_every_section() {
        let report = execute(&small_job()).unwrap();
        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        for key in ["valuation_date", "curve", "calibration", "pricing"] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(json["valuation_date"], "2025-01-02");
        assert!(json["calibration"]["params"]["kappa"].is_number());
        assert!(json["calibration"]["diagnostics"]["rmse_vol"].is_number());
        assert_eq!(json["curve"]["pillars"][0]["kind"], "Deposit");
    }

    #[test]
    fn test_short_curve_fails_with_context() {
        let mut job = small_job();
        job.instruments.truncate(4);
        let err = execute(&job).unwrap_err();
        assert!(format!("{:#}", err).contains("calibrating"));
    }
}
