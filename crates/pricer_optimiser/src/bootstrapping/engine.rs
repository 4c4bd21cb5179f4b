//! Sequential bootstrapping engine.
//!
//! [`CurveBuilder`] solves one discount factor per instrument, shortest
//! maturity first. Each pillar is found with a bracketed Brent search on
//! `ln D` seeded by a secant step from the previous segment's forward rate.
//! The residual is `implied_quote(trial) - quote`, where the trial curve is
//! built by the same [`Interpolation`] rule the finished curve will use.
//!
//! With a non-local rule (`CubicLogDiscount`) adding a pillar moves every
//! earlier segment, so the sweep is repeated over all pillars until every
//! instrument reprices.

use std::time::Instant;

use pricer_core::conventions::ConventionLayer;
use pricer_core::market_data::curves::{DiscountCurve, Interpolation};
use pricer_core::math::solvers::{BrentSolver, SolverConfig};
use pricer_core::types::{CalibrationError, Date, ErrorLocation};
use tracing::debug;

use super::config::BootstrapConfig;
use super::instrument::{Instrument, ResolvedInstrument};

/// Quotes smaller than this are compared in absolute terms.
const QUOTE_FLOOR: f64 = 1e-4;

/// Search bounds on `ln D` for one pillar.
const LN_DF_MIN: f64 = -18.420680743952367; // ln 1e-8
const LN_DF_MAX: f64 = 2.302585092994046; // ln 10

/// Result of a bootstrap operation.
#[derive(Debug, Clone)]
pub struct BootstrapResult {
    /// The bootstrapped curve
    pub curve: DiscountCurve,
    /// Pillar maturities in years, ascending, excluding `t = 0`
    pub pillars: Vec<f64>,
    /// Discount factors at each pillar
    pub discount_factors: Vec<f64>,
    /// `implied - quote` on the final curve, in input order
    pub residuals: Vec<f64>,
    /// Function evaluations spent per instrument, in input order
    pub iterations: Vec<usize>,
    /// Number of sweeps over the pillars
    pub passes: usize,
    /// Resolved instruments, in input order
    pub instruments: Vec<ResolvedInstrument>,
}

impl BootstrapResult {
    /// Largest `|implied - quote| / max(|quote|, 1e-4)` over all instruments.
    pub fn max_relative_residual(&self) -> f64 {
        self.residuals
            .iter()
            .zip(&self.instruments)
            .map(|(r, inst)| r.abs() / inst.quote.abs().max(QUOTE_FLOOR))
            .fold(0.0, f64::max)
    }
}

/// Sequential bootstrapper.
///
/// # Examples
///
/// ```
/// use pricer_core::conventions::WeekendCalendar;
/// use pricer_core::market_data::curves::YieldCurve;
/// use pricer_core::types::{Date, Tenor};
/// use pricer_optimiser::bootstrapping::{BootstrapConfig, CurveBuilder, Instrument};
///
/// let valuation = Date::from_ymd(2025, 1, 1).unwrap();
/// let builder = CurveBuilder::new(BootstrapConfig::default(), valuation);
/// let result = builder
///     .build(&[Instrument::deposit(Tenor::years(1), 0.05)], &WeekendCalendar::new())
///     .unwrap();
///
/// let df = result.curve.discount_factor(1.0).unwrap();
/// assert!((df - 1.0 / 1.05).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct CurveBuilder {
    config: BootstrapConfig,
    valuation: Date,
}

impl CurveBuilder {
    /// Create a builder for curves valued on `valuation`.
    pub fn new(config: BootstrapConfig, valuation: Date) -> Self {
        Self { config, valuation }
    }

    /// Get the configuration.
    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    /// Valuation date, `t = 0` of every curve this builder produces.
    pub fn valuation(&self) -> Date {
        self.valuation
    }

    /// Resolve and validate instruments in input order.
    pub fn resolve(
        &self,
        instruments: &[Instrument],
        conventions: &dyn ConventionLayer,
    ) -> Result<Vec<ResolvedInstrument>, CalibrationError> {
        if instruments.is_empty() {
            return Err(CalibrationError::invalid_input(
                ErrorLocation::Input,
                "no instruments to bootstrap",
            ));
        }
        let mut resolved = Vec::with_capacity(instruments.len());
        for (i, inst) in instruments.iter().enumerate() {
            inst.validate(i)?;
            let r = inst.resolve(
                i,
                self.valuation,
                conventions,
                self.config.business_day_convention,
                self.config.spot_lag,
            )?;
            if r.end > self.config.max_maturity {
                return Err(CalibrationError::invalid_input(
                    ErrorLocation::Instrument(i),
                    format!(
                        "maturity {:.4}y exceeds maximum {}y",
                        r.end, self.config.max_maturity
                    ),
                ));
            }
            resolved.push(r);
        }
        Ok(resolved)
    }

    /// Bootstrap a discount curve.
    ///
    /// # Errors
    ///
    /// - `InvalidInput`: empty set, invalid instrument, duplicate maturity,
    ///   maturity beyond `max_maturity`, or invalid configuration
    /// - `NonConvergent`: a pillar exhausted its iteration cap, the sweep cap
    ///   was hit, or the time budget ran out
    /// - `DomainViolation`: no positive discount factor reprices an
    ///   instrument, or the result is not strictly decreasing while negative
    ///   rates are not allowed
    pub fn build(
        &self,
        instruments: &[Instrument],
        conventions: &dyn ConventionLayer,
    ) -> Result<BootstrapResult, CalibrationError> {
        self.config.validate()?;
        let resolved = self.resolve(instruments, conventions)?;
        let started = Instant::now();

        let mut order: Vec<usize> = (0..resolved.len()).collect();
        order.sort_by(|&a, &b| resolved[a].end.total_cmp(&resolved[b].end));
        for w in order.windows(2) {
            if resolved[w[0]].end_date == resolved[w[1]].end_date {
                let (first, second) = (w[0].min(w[1]), w[0].max(w[1]));
                return Err(CalibrationError::invalid_input(
                    ErrorLocation::Instrument(second),
                    format!(
                        "instruments #{} and #{} both mature on {}",
                        first, second, resolved[second].end_date
                    ),
                ));
            }
        }

        let n = order.len();
        let interpolation = self.config.interpolation;
        let mut times = Vec::with_capacity(n + 1);
        times.push(0.0);
        times.extend(order.iter().map(|&i| resolved[i].end));
        let mut log_dfs = vec![0.0; n + 1];
        let mut iterations = vec![0usize; resolved.len()];

        let max_passes = if interpolation.is_local() {
            1
        } else {
            self.config.max_passes
        };
        let mut passes = 0;

        loop {
            passes += 1;
            for (k, &idx) in order.iter().enumerate() {
                self.check_deadline(started, idx, &iterations)?;
                let pillar = k + 1;
                let known = if passes == 1 { pillar + 1 } else { n + 1 };
                let guess = if passes > 1 {
                    log_dfs[pillar]
                } else {
                    first_pass_guess(&times, &log_dfs, pillar, &resolved[idx])
                };
                let (root, evals) = self.solve_pillar(
                    &resolved[idx],
                    interpolation,
                    &times[..known],
                    &log_dfs[..known],
                    pillar,
                    guess,
                )?;
                log_dfs[pillar] = root;
                iterations[idx] += evals;
                debug!(
                    instrument = idx,
                    kind = %resolved[idx].kind,
                    t = times[pillar],
                    df = root.exp(),
                    pass = passes,
                    evals,
                    "pillar solved"
                );
            }

            if interpolation.is_local() {
                break;
            }
            let worst = max_relative_residual(&resolved, interpolation, &times, &log_dfs)?;
            debug!(pass = passes, max_relative_residual = worst, "sweep finished");
            if worst <= 10.0 * self.config.tolerance {
                break;
            }
            if passes >= max_passes {
                return Err(CalibrationError::non_convergent(
                    ErrorLocation::Input,
                    passes,
                    worst,
                ));
            }
        }

        if !self.config.allow_negative_rates {
            for i in 1..=n {
                if !(log_dfs[i] < log_dfs[i - 1]) {
                    return Err(CalibrationError::domain_violation(
                        ErrorLocation::Pillar(times[i]),
                        format!(
                            "discount factor {:.12} at instrument #{} does not decrease",
                            log_dfs[i].exp(),
                            order[i - 1]
                        ),
                    ));
                }
            }
            let fitted = interpolation.build(&times, &log_dfs)?;
            if let Some((t, forward)) = fitted.negative_forward() {
                let segment = times.partition_point(|&x| x < t).clamp(1, n);
                return Err(CalibrationError::domain_violation(
                    ErrorLocation::Pillar(t),
                    format!(
                        "{} curve rises on the segment ending at instrument #{}: forward {:.6e} at t = {:.6}",
                        interpolation,
                        order[segment - 1],
                        forward,
                        t
                    ),
                ));
            }
        }

        let dfs: Vec<f64> = log_dfs.iter().map(|ld| ld.exp()).collect();
        let curve = DiscountCurve::new(&times, &dfs, interpolation, self.config.curve_options())?;

        let mut residuals = Vec::with_capacity(resolved.len());
        for inst in &resolved {
            residuals.push(inst.implied_quote(&curve)? - inst.quote);
        }

        debug!(
            pillars = n,
            passes,
            elapsed_us = started.elapsed().as_micros() as u64,
            "curve bootstrapped"
        );

        Ok(BootstrapResult {
            curve,
            pillars: times[1..].to_vec(),
            discount_factors: dfs[1..].to_vec(),
            residuals,
            iterations,
            passes,
            instruments: resolved,
        })
    }

    fn check_deadline(
        &self,
        started: Instant,
        idx: usize,
        iterations: &[usize],
    ) -> Result<(), CalibrationError> {
        if let Some(budget) = self.config.time_budget {
            if started.elapsed() >= budget {
                return Err(CalibrationError::non_convergent(
                    ErrorLocation::Instrument(idx),
                    iterations.iter().sum(),
                    f64::INFINITY,
                ));
            }
        }
        Ok(())
    }

    /// Solve for `ln D` at `pillar` with every other known pillar fixed.
    fn solve_pillar(
        &self,
        inst: &ResolvedInstrument,
        interpolation: Interpolation,
        times: &[f64],
        log_dfs: &[f64],
        pillar: usize,
        guess: f64,
    ) -> Result<(f64, usize), CalibrationError> {
        let at = ErrorLocation::Instrument(inst.index);
        let scale = inst.quote.abs().max(QUOTE_FLOOR);
        let solver = BrentSolver::new(
            SolverConfig::new(self.config.tolerance * scale, self.config.max_iterations)
                .with_x_tolerance(4.0 * f64::EPSILON),
        );

        let residual = |x: f64| -> f64 {
            let mut lds = log_dfs.to_vec();
            lds[pillar] = x;
            match interpolation.build(times, &lds) {
                Ok(curve) => inst
                    .implied_quote(&curve)
                    .map(|v| v - inst.quote)
                    .unwrap_or(f64::NAN),
                Err(_) => f64::NAN,
            }
        };

        let step = 1e-4 * times[pillar].max(1e-3);
        let result = solver
            .solve_seeded(residual, guess, step, LN_DF_MIN, LN_DF_MAX)
            .map_err(|e| CalibrationError::from_solver(at, e))?;

        // Brent also stops on bracket width; such a root may not reprice.
        if result.residual.abs() > self.config.tolerance * scale {
            return Err(CalibrationError::non_convergent(
                at,
                result.iterations,
                result.residual.abs() / scale,
            ));
        }
        Ok((result.root, result.iterations))
    }
}

/// Seed for the first sweep: extend the previous segment's forward, or use
/// simple compounding of the quote for the first pillar.
fn first_pass_guess(times: &[f64], log_dfs: &[f64], pillar: usize, inst: &ResolvedInstrument) -> f64 {
    let t = times[pillar];
    if pillar == 1 {
        let approx = 1.0 + inst.quote * t;
        return if approx > 0.0 { -approx.ln() } else { -inst.quote * t };
    }
    let (t0, t1) = (times[pillar - 2], times[pillar - 1]);
    let fwd = -(log_dfs[pillar - 1] - log_dfs[pillar - 2]) / (t1 - t0);
    log_dfs[pillar - 1] - fwd * (t - t1)
}

fn max_relative_residual(
    resolved: &[ResolvedInstrument],
    interpolation: Interpolation,
    times: &[f64],
    log_dfs: &[f64],
) -> Result<f64, CalibrationError> {
    let curve = interpolation.build(times, log_dfs)?;
    let mut worst = 0.0_f64;
    for inst in resolved {
        let r = (inst.implied_quote(&curve)? - inst.quote).abs() / inst.quote.abs().max(QUOTE_FLOOR);
        worst = worst.max(r);
    }
    Ok(worst)
}
