//! JSON report of a pipeline run.

use std::path::Path;

use pricer_core::market_data::curves::YieldCurve;
use pricer_core::types::{CalibrationError, Date};
use pricer_models::calibration::CalibrationResult;
use pricer_optimiser::bootstrapping::{BootstrapResult, InstrumentKind};
use pricer_pricing::mc::McEstimate;
use serde::Serialize;
use tracing::info;

use crate::Result;

/// One bootstrapped pillar.
#[derive(Debug, Clone, Serialize)]
pub struct PillarReport {
    /// Position of the instrument in the job file.
    pub instrument: usize,
    pub kind: InstrumentKind,
    pub maturity: Date,
    pub t: f64,
    pub discount_factor: f64,
    pub zero_rate: f64,
    /// `implied - quote` on the finished curve.
    pub residual: f64,
}

/// Bootstrapped curve, pillars in maturity order.
#[derive(Debug, Clone, Serialize)]
pub struct CurveReport {
    pub pillars: Vec<PillarReport>,
    pub passes: usize,
    pub max_relative_residual: f64,
}

impl CurveReport {
    /// Summarise a bootstrap.
    pub fn from_bootstrap(result: &BootstrapResult) -> std::result::Result<Self, CalibrationError> {
        let mut pillars = result
            .instruments
            .iter()
            .zip(&result.residuals)
            .map(|(inst, &residual)| {
                Ok(PillarReport {
                    instrument: inst.index,
                    kind: inst.kind,
                    maturity: inst.end_date,
                    t: inst.end,
                    discount_factor: result.curve.discount_factor(inst.end)?,
                    zero_rate: result.curve.zero_rate(inst.end)?,
                    residual,
                })
            })
            .collect::<std::result::Result<Vec<_>, CalibrationError>>()?;
        pillars.sort_by(|a, b| a.t.total_cmp(&b.t));
        Ok(Self {
            pillars,
            passes: result.passes,
            max_relative_residual: result.max_relative_residual(),
        })
    }
}

/// Fitted Heston parameters with their diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct CalibrationReport {
    #[serde(flatten)]
    pub result: CalibrationResult,
    pub feller_satisfied: bool,
}

impl From<CalibrationResult> for CalibrationReport {
    fn from(result: CalibrationResult) -> Self {
        let feller_satisfied = result.params.satisfies_feller();
        Self {
            result,
            feller_satisfied,
        }
    }
}

/// Monte Carlo against semi-analytic price of one European call.
#[derive(Debug, Clone, Serialize)]
pub struct PricingReport {
    pub scheme: String,
    pub antithetic: bool,
    pub horizon: f64,
    pub forward: f64,
    pub strike: f64,
    pub n_paths: usize,
    pub n_steps: usize,
    /// The seed actually used, so an unseeded run can be replayed.
    pub seed: u64,
    pub analytic: f64,
    pub monte_carlo: McEstimate,
    /// `(mc - analytic) / std_error`.
    pub z_score: f64,
}

/// Everything `quantcore run` produces.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub valuation_date: Date,
    pub curve: CurveReport,
    pub calibration: CalibrationReport,
    pub pricing: PricingReport,
}

impl Report {
    /// Pretty JSON to `output`, or to stdout when `None`.
    pub fn write(&self, output: Option<&Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        match output {
            Some(path) => {
                std::fs::write(path, json + "\n")?;
                info!(path = %path.display(), "report written");
            }
            None => println!("{}", json),
        }
        Ok(())
    }
}
