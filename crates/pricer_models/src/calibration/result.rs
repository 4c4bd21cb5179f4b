//! Calibration result types.

use std::time::Duration;

use pricer_core::math::solvers::LMTermination;

use crate::models::HestonParams;

/// How the accepted fit was reached.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CalibrationDiagnostics {
    /// LM iterations summed over every start.
    pub iterations: usize,
    /// Starts attempted, the first one included.
    pub restarts_tried: usize,
    /// Weighted sum of squared residuals of the accepted start.
    pub residual_ss: f64,
    /// Root mean squared implied-vol error.
    pub rmse_vol: f64,
    /// Largest absolute implied-vol error.
    pub max_abs_vol_error: f64,
    /// Always `true` for a returned result.
    pub converged: bool,
    /// Why the accepted start stopped.
    pub termination: LMTermination,
    /// Wall-clock time of the whole calibration.
    pub duration: Duration,
}

/// Fitted Heston parameters with per-quote vols.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CalibrationResult {
    /// Fitted parameters.
    pub params: HestonParams,
    /// Fit statistics.
    pub diagnostics: CalibrationDiagnostics,
    market_vols: Vec<f64>,
    model_vols: Vec<f64>,
}

impl CalibrationResult {
    pub(crate) fn new(
        params: HestonParams,
        diagnostics: CalibrationDiagnostics,
        market_vols: Vec<f64>,
        model_vols: Vec<f64>,
    ) -> Self {
        Self {
            params,
            diagnostics,
            market_vols,
            model_vols,
        }
    }

    /// Implied vols of the fitted model, one per input quote in input order.
    pub fn model_vols(&self) -> &[f64] {
        &self.model_vols
    }

    /// Quoted vols in the same order as [`model_vols`](Self::model_vols).
    pub fn market_vols(&self) -> &[f64] {
        &self.market_vols
    }

    /// `model - market` per quote.
    pub fn vol_errors(&self) -> Vec<f64> {
        self.model_vols
            .iter()
            .zip(&self.market_vols)
            .map(|(m, q)| m - q)
            .collect()
    }
}
