//! Heston calibration to implied-volatility smiles.
//!
//! The calibrator fits `[v0, kappa, theta, sigma, rho]` to one smile, to a
//! set of smiles jointly, or to many smiles independently.
//!
//! ## Objective
//!
//! One residual per quote:
//!
//! ```text
//! r_i = w_i (C_model(K_i) - C_market(K_i)) / vega_i
//! ```
//!
//! With [`Weighting::Vega`] this is a first-order implied-vol error; with
//! [`Weighting::Uniform`] the vega division is dropped. Market prices come
//! from the quoted Black vols on the curve forward.
//!
//! ## Search
//!
//! Levenberg-Marquardt runs in the unconstrained space of
//! [`super::transform`]. The first start is the caller's guess or
//! `v0 = theta = ATM²`, `kappa = 1`, `sigma = 0.3`, `rho = -0.5`. The
//! second start is the same point near the deterministic-variance limit
//! (`sigma` scaled by `e^-4.5`); further starts shift the first by a fixed
//! table, so results are reproducible. A start is accepted when LM
//! converged (or stalled at a minimum) and the implied vol RMSE is at most
//! `acceptance_rmse`.
//!
//! Accepted starts whose vol RMSE is within [`EQUIVALENT_FIT_RMSE`] of the
//! best fit the quotes equally well; among those the smallest `sigma` wins,
//! then the lowest residual. A flat smile puts a ridge of near-equal fits
//! along growing `kappa` and `sigma`, and this picks its Black end.
//!
//! ## Example
//!
//! ```no_run
//! use pricer_core::market_data::{FlatCurve, SmileData, SmileQuote};
//! use pricer_models::calibration::{CalibratorConfig, HestonCalibrator};
//!
//! let quotes = [0.26, 0.23, 0.21, 0.20, 0.205, 0.215]
//!     .iter()
//!     .zip([80.0, 90.0, 100.0, 105.0, 110.0, 120.0])
//!     .map(|(&vol, k)| SmileQuote::new(k, 1.0, vol))
//!     .collect();
//! let smile = SmileData::new(100.0, 1.0, 0.0, quotes).unwrap();
//! let curve = FlatCurve::new(0.02);
//!
//! let calibrator = HestonCalibrator::new(CalibratorConfig::default());
//! let fit = calibrator.calibrate(&smile, &curve, None).unwrap();
//! assert!(fit.diagnostics.rmse_vol <= 1e-3);
//! ```

use std::time::Instant;

use pricer_core::market_data::curves::YieldCurve;
use pricer_core::market_data::{OptionType, SmileData};
use pricer_core::math::solvers::{LMTermination, LevenbergMarquardtSolver};
use pricer_core::types::{CalibrationError, ErrorLocation};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, warn};

use super::config::{CalibratorConfig, Weighting};
use super::result::{CalibrationDiagnostics, CalibrationResult};
use super::transform::{from_unconstrained, to_unconstrained};
use crate::analytical::black::{black_price, black_vega, implied_volatility};
use crate::analytical::HestonPricer;
use crate::models::HestonParams;

/// One distinct quote per free parameter.
pub const MIN_DISTINCT_QUOTES: usize = 5;

/// Vega below `VEGA_FLOOR * D * F` is floored in the residual scale.
const VEGA_FLOOR: f64 = 1e-8;

/// Vol RMSE gap under which two accepted fits count as equally good.
pub const EQUIVALENT_FIT_RMSE: f64 = 1e-5;

/// Shift of `ln sigma` for the low vol-of-vol start.
const LOW_VOL_OF_VOL_SHIFT: f64 = -4.5;

/// Offsets of the restart points in unconstrained space.
const RESTART_SHIFTS: [[f64; 5]; 4] = [
    [0.5, 0.7, -0.5, 0.4, 0.6],
    [-0.5, -0.7, 0.5, -0.4, -0.6],
    [0.3, 1.2, 0.3, -0.8, -0.9],
    [-0.3, -1.0, -0.3, 0.8, 0.9],
];

/// Market data of one expiry, prepared once per calibration.
#[derive(Debug)]
struct Slice {
    expiry: f64,
    forward: f64,
    discount: f64,
    atm_vol: f64,
    strikes: Vec<f64>,
    option_types: Vec<OptionType>,
    market_prices: Vec<f64>,
    market_vols: Vec<f64>,
    scales: Vec<f64>,
}

impl Slice {
    fn build<C: YieldCurve + ?Sized>(
        smile: &SmileData,
        curve: &C,
        weighting: Weighting,
    ) -> Result<Self, CalibrationError> {
        let expiry = smile.expiry();
        let discount = curve.discount_factor(expiry)?;
        let forward = smile.forward(curve)?;
        let quotes = smile.quotes();

        let mut slice = Slice {
            expiry,
            forward,
            discount,
            atm_vol: smile.atm_vol(forward),
            strikes: Vec::with_capacity(quotes.len()),
            option_types: Vec::with_capacity(quotes.len()),
            market_prices: Vec::with_capacity(quotes.len()),
            market_vols: Vec::with_capacity(quotes.len()),
            scales: Vec::with_capacity(quotes.len()),
        };
        for q in quotes {
            let price = black_price(forward, q.strike, q.implied_vol, expiry, discount, q.option_type);
            let scale = match weighting {
                Weighting::Vega => {
                    let vega = black_vega(forward, q.strike, q.implied_vol, expiry, discount);
                    q.weight / vega.max(VEGA_FLOOR * discount * forward)
                }
                Weighting::Uniform => q.weight,
            };
            slice.strikes.push(q.strike);
            slice.option_types.push(q.option_type);
            slice.market_prices.push(price);
            slice.market_vols.push(q.implied_vol);
            slice.scales.push(scale);
        }
        Ok(slice)
    }

    fn model_prices(&self, pricer: &HestonPricer, params: &HestonParams) -> Vec<f64> {
        let calls = pricer.call_prices(params, self.forward, self.discount, self.expiry, &self.strikes);
        calls
            .into_iter()
            .zip(&self.strikes)
            .zip(&self.option_types)
            .map(|((call, &strike), &option_type)| match option_type {
                OptionType::Call => call,
                OptionType::Put => call - self.discount * (self.forward - strike),
            })
            .collect()
    }
}

/// Implied-vol quality of a parameter set.
#[derive(Debug)]
struct VolFit {
    model_vols: Vec<f64>,
    rmse_vol: f64,
    max_abs_vol_error: f64,
}

#[derive(Debug)]
struct Accepted {
    params: HestonParams,
    fit: VolFit,
    residual_ss: f64,
    termination: LMTermination,
}

/// Heston calibrator.
///
/// Stateless apart from its configuration; one instance can serve any
/// number of concurrent calibrations.
#[derive(Debug, Clone, Default)]
pub struct HestonCalibrator {
    config: CalibratorConfig,
    pricer: HestonPricer,
}

impl HestonCalibrator {
    /// Calibrator with the default pricer.
    pub fn new(config: CalibratorConfig) -> Self {
        Self {
            config,
            pricer: HestonPricer::default(),
        }
    }

    /// Replace the pricer used for model prices.
    pub fn with_pricer(mut self, pricer: HestonPricer) -> Self {
        self.pricer = pricer;
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &CalibratorConfig {
        &self.config
    }

    /// Pricer used for model prices.
    pub fn pricer(&self) -> &HestonPricer {
        &self.pricer
    }

    /// Fit one smile.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for fewer than [`MIN_DISTINCT_QUOTES`] distinct
    ///   quotes, a smile whose quotes are all identical, an invalid guess
    ///   or an invalid configuration
    /// - `OutOfRange` when the curve does not cover the expiry
    /// - `NonConvergent` when no start reaches the acceptance RMSE
    /// - `DomainViolation` when the accepted parameters break a hard bound
    pub fn calibrate<C: YieldCurve + ?Sized>(
        &self,
        smile: &SmileData,
        curve: &C,
        initial_guess: Option<HestonParams>,
    ) -> Result<CalibrationResult, CalibrationError> {
        self.fit(std::slice::from_ref(smile), curve, initial_guess, |_| ErrorLocation::Input)
    }

    /// Fit one parameter set to several expiries jointly.
    ///
    /// A smile-specific problem is reported at `Smile(j)`. The model vols of
    /// the result follow the smiles' order, then each smile's quote order.
    pub fn calibrate_surface<C: YieldCurve + ?Sized>(
        &self,
        smiles: &[SmileData],
        curve: &C,
        initial_guess: Option<HestonParams>,
    ) -> Result<CalibrationResult, CalibrationError> {
        self.fit(smiles, curve, initial_guess, ErrorLocation::Smile)
    }

    /// Independent fits of each smile, in input order.
    ///
    /// Runs on the rayon pool when the `parallel` feature is enabled.
    pub fn calibrate_batch<C: YieldCurve + ?Sized>(
        &self,
        smiles: &[SmileData],
        curve: &C,
    ) -> Vec<Result<CalibrationResult, CalibrationError>> {
        #[cfg(feature = "parallel")]
        {
            smiles
                .par_iter()
                .map(|smile| self.calibrate(smile, curve, None))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            smiles
                .iter()
                .map(|smile| self.calibrate(smile, curve, None))
                .collect()
        }
    }

    fn fit<C: YieldCurve + ?Sized>(
        &self,
        smiles: &[SmileData],
        curve: &C,
        initial_guess: Option<HestonParams>,
        locate: fn(usize) -> ErrorLocation,
    ) -> Result<CalibrationResult, CalibrationError> {
        let started = Instant::now();
        self.config.validate()?;
        let slices = self.prepare(smiles, curve, locate)?;

        let guess = match initial_guess {
            Some(guess) => {
                guess.validate().map_err(|e| {
                    CalibrationError::invalid_input(
                        e.location().unwrap_or(ErrorLocation::Input),
                        format!("initial guess: {}", e),
                    )
                })?;
                guess
            }
            None => default_guess(&slices),
        };
        let x0 = to_unconstrained(&guess);

        let n_quotes: usize = slices.iter().map(|s| s.strikes.len()).sum();
        let residuals = |x: &[f64]| self.residuals(&slices, x, n_quotes);
        let deadline = self.config.time_budget.map(|budget| started + budget);

        let mut accepted_starts = Vec::new();
        let mut iterations = 0;
        let mut tried = 0;
        let mut failed = 0;
        let mut best_ss = f64::INFINITY;

        for k in 0..=self.config.n_restarts {
            let mut lm = self.config.lm;
            if let Some(deadline) = deadline {
                let now = Instant::now();
                if now >= deadline {
                    debug!(restart = k, "heston calibration budget exhausted");
                    break;
                }
                let remaining = deadline - now;
                lm.time_budget = Some(lm.time_budget.map_or(remaining, |b| b.min(remaining)));
            }

            tried += 1;
            let outcome = match LevenbergMarquardtSolver::new(lm).solve(&residuals, start_point(&x0, k)) {
                Ok(outcome) => outcome,
                Err(e) => {
                    failed += 1;
                    debug!(restart = k, error = %e, "heston start rejected");
                    continue;
                }
            };
            iterations += outcome.iterations;
            best_ss = best_ss.min(outcome.residual_ss);

            let params = from_unconstrained(&outcome.params);
            let fit = self.assess(&slices, &params);
            let settled = outcome.converged || outcome.termination == LMTermination::Stalled;
            let accepted = settled && fit.rmse_vol <= self.config.acceptance_rmse;
            debug!(
                restart = k,
                iterations = outcome.iterations,
                residual_ss = outcome.residual_ss,
                rmse_vol = fit.rmse_vol,
                termination = ?outcome.termination,
                accepted,
                "heston start finished"
            );
            if !accepted {
                failed += 1;
                continue;
            }
            accepted_starts.push(Accepted {
                params,
                fit,
                residual_ss: outcome.residual_ss,
                termination: outcome.termination,
            });
        }

        let Some(best) = select_winner(accepted_starts) else {
            return Err(CalibrationError::non_convergent(ErrorLocation::Input, iterations, best_ss));
        };
        best.params.validate()?;
        if failed > 0 {
            warn!(failed, tried, "heston calibration accepted after failed starts");
        }

        let diagnostics = CalibrationDiagnostics {
            iterations,
            restarts_tried: tried,
            residual_ss: best.residual_ss,
            rmse_vol: best.fit.rmse_vol,
            max_abs_vol_error: best.fit.max_abs_vol_error,
            converged: true,
            termination: best.termination,
            duration: started.elapsed(),
        };
        let market_vols = slices.iter().flat_map(|s| s.market_vols.iter().copied()).collect();
        Ok(CalibrationResult::new(best.params, diagnostics, market_vols, best.fit.model_vols))
    }

    fn prepare<C: YieldCurve + ?Sized>(
        &self,
        smiles: &[SmileData],
        curve: &C,
        locate: fn(usize) -> ErrorLocation,
    ) -> Result<Vec<Slice>, CalibrationError> {
        if smiles.is_empty() {
            return Err(CalibrationError::invalid_input(ErrorLocation::Input, "no smiles to calibrate"));
        }
        let mut distinct = 0;
        let mut slices = Vec::with_capacity(smiles.len());
        for (j, smile) in smiles.iter().enumerate() {
            let count = smile.distinct_quote_count();
            if smile.len() > 1 && count == 1 {
                return Err(CalibrationError::invalid_input(
                    locate(j),
                    format!("all {} quotes are identical", smile.len()),
                ));
            }
            distinct += count;
            slices.push(Slice::build(smile, curve, self.config.weighting)?);
        }
        if distinct < MIN_DISTINCT_QUOTES {
            return Err(CalibrationError::invalid_input(
                ErrorLocation::Input,
                format!(
                    "{} distinct quotes cannot identify {} parameters",
                    distinct, MIN_DISTINCT_QUOTES
                ),
            ));
        }
        Ok(slices)
    }

    fn residuals(&self, slices: &[Slice], x: &[f64], n_quotes: usize) -> Vec<f64> {
        let params = from_unconstrained(x);
        let mut out = Vec::with_capacity(n_quotes);
        for slice in slices {
            let model = slice.model_prices(&self.pricer, &params);
            for ((m, market), scale) in model.iter().zip(&slice.market_prices).zip(&slice.scales) {
                out.push((m - market) * scale);
            }
        }
        out
    }

    /// Model implied vols and their errors against the quotes.
    ///
    /// A model price outside the invertible range falls back to the
    /// first-order vol `market_vol + (model - market) / vega`.
    fn assess(&self, slices: &[Slice], params: &HestonParams) -> VolFit {
        let mut model_vols = Vec::new();
        let mut sum_sq = 0.0;
        let mut max_abs = 0.0_f64;
        for slice in slices {
            let prices = slice.model_prices(&self.pricer, params);
            for (i, price) in prices.into_iter().enumerate() {
                let (strike, market_vol) = (slice.strikes[i], slice.market_vols[i]);
                let vol = implied_volatility(
                    price,
                    slice.forward,
                    strike,
                    slice.expiry,
                    slice.discount,
                    slice.option_types[i],
                )
                .unwrap_or_else(|_| {
                    let vega = black_vega(slice.forward, strike, market_vol, slice.expiry, slice.discount);
                    if vega > 0.0 {
                        market_vol + (price - slice.market_prices[i]) / vega
                    } else {
                        f64::NAN
                    }
                });
                let err = vol - market_vol;
                if err.is_finite() {
                    sum_sq += err * err;
                    max_abs = max_abs.max(err.abs());
                } else {
                    sum_sq = f64::INFINITY;
                    max_abs = f64::INFINITY;
                }
                model_vols.push(vol);
            }
        }
        let n = model_vols.len().max(1) as f64;
        VolFit {
            model_vols,
            rmse_vol: (sum_sq / n).sqrt(),
            max_abs_vol_error: max_abs,
        }
    }
}

/// `v0` from the shortest expiry, `theta` from the longest.
fn default_guess(slices: &[Slice]) -> HestonParams {
    let by_expiry = |a: &&Slice, b: &&Slice| a.expiry.total_cmp(&b.expiry);
    let short = slices.iter().min_by(by_expiry).map_or(0.2, |s| s.atm_vol);
    let long = slices.iter().max_by(by_expiry).map_or(0.2, |s| s.atm_vol);
    HestonParams {
        v0: short * short,
        kappa: 1.0,
        theta: long * long,
        sigma: 0.3,
        rho: -0.5,
    }
}

/// Smallest `sigma` among the fits equivalent to the best one; lowest
/// residual on a tie.
fn select_winner(accepted: Vec<Accepted>) -> Option<Accepted> {
    let best_rmse = accepted.iter().map(|a| a.fit.rmse_vol).fold(f64::INFINITY, f64::min);
    accepted
        .into_iter()
        .filter(|a| a.fit.rmse_vol <= best_rmse + EQUIVALENT_FIT_RMSE)
        .min_by(|a, b| {
            a.params
                .sigma
                .total_cmp(&b.params.sigma)
                .then(a.residual_ss.total_cmp(&b.residual_ss))
        })
}

/// Start `k`: the guess itself, the guess at low vol-of-vol, then the shift
/// table, widened on each pass.
fn start_point(x0: &[f64], k: usize) -> Vec<f64> {
    match k {
        0 => x0.to_vec(),
        1 => {
            let mut x = x0.to_vec();
            x[3] += LOW_VOL_OF_VOL_SHIFT;
            x
        }
        _ => {
            let shift = &RESTART_SHIFTS[(k - 2) % RESTART_SHIFTS.len()];
            let widen = 1.0 + 0.5 * ((k - 2) / RESTART_SHIFTS.len()) as f64;
            x0.iter().zip(shift).map(|(x, s)| x + widen * s).collect()
        }
    }
}
