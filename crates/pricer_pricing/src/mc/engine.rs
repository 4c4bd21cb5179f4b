//! Shared path-generation driver.
//!
//! A [`Stepper`] advances one `(ln S, v)` state by one grid step from two
//! independent standard normals. [`generate`] runs it over every path on
//! the rayon pool, one RNG stream per path or antithetic pair.

use pricer_core::market_data::curves::YieldCurve;
use pricer_core::types::CalibrationError;
use rayon::prelude::*;

use crate::rng::PricerRng;

/// One-step transition of a spot/variance model.
pub(crate) trait Stepper: Sync {
    /// Variance recorded at `t = 0`.
    fn initial_variance(&self) -> f64;

    /// Advance `(ln_s, v)` by one step with log-drift `drift`; returns the
    /// variance to record for the new point.
    fn advance(&self, drift: f64, ln_s: &mut f64, v: &mut f64, z_v: f64, z_s: f64) -> f64;
}

/// Uniform time grid with per-step log-drifts read from a curve.
#[derive(Debug, Clone)]
pub(crate) struct Grid {
    pub times: Vec<f64>,
    /// `ln(D(t_i) / D(t_{i+1})) - q dt`
    pub drifts: Vec<f64>,
    pub dt: f64,
}

impl Grid {
    /// `horizon` is assumed validated.
    pub fn build<C: YieldCurve + ?Sized>(
        curve: &C,
        horizon: f64,
        n_steps: usize,
        dividend_yield: f64,
    ) -> Result<Self, CalibrationError> {
        curve.discount_factor(horizon)?;
        let dt = horizon / n_steps as f64;
        let mut times: Vec<f64> = (0..=n_steps).map(|i| i as f64 * dt).collect();
        times[n_steps] = horizon;

        let mut log_dfs = Vec::with_capacity(times.len());
        for &t in &times {
            log_dfs.push(curve.discount_factor(t)?.ln());
        }
        let drifts = log_dfs
            .windows(2)
            .map(|w| w[0] - w[1] - dividend_yield * dt)
            .collect();
        Ok(Self { times, drifts, dt })
    }
}

/// Row-major `(spot, variance)` buffers for `n_paths` paths.
///
/// With `antithetic`, path `2k + 1` is driven by the negated normals of
/// path `2k`; an odd last path runs alone on its own stream.
pub(crate) fn generate<S: Stepper>(
    stepper: &S,
    grid: &Grid,
    spot0: f64,
    n_paths: usize,
    seed: u64,
    antithetic: bool,
) -> (Vec<f64>, Vec<f64>) {
    let row = grid.drifts.len() + 1;
    let chunk = if antithetic { 2 * row } else { row };
    let mut spot = vec![0.0; n_paths * row];
    let mut variance = vec![0.0; n_paths * row];

    spot.par_chunks_mut(chunk)
        .zip(variance.par_chunks_mut(chunk))
        .enumerate()
        .for_each(|(stream, (spots, vars))| {
            let rng = PricerRng::stream(seed, stream as u64);
            fill_stream(stepper, &grid.drifts, spot0, rng, spots, vars, row);
        });
    (spot, variance)
}

fn fill_stream<S: Stepper>(
    stepper: &S,
    drifts: &[f64],
    spot0: f64,
    mut rng: PricerRng,
    spots: &mut [f64],
    vars: &mut [f64],
    row: usize,
) {
    let rows = spots.len() / row;
    let v0 = stepper.initial_variance();
    let mut state = [(spot0.ln(), v0); 2];
    for r in 0..rows {
        spots[r * row] = spot0;
        vars[r * row] = v0;
    }

    let mut z = [0.0; 2];
    for (i, &drift) in drifts.iter().enumerate() {
        rng.fill_normal(&mut z);
        let [z_v, z_s] = z;
        for (r, (ln_s, v)) in state.iter_mut().take(rows).enumerate() {
            let sign = if r == 0 { 1.0 } else { -1.0 };
            let recorded = stepper.advance(drift, ln_s, v, sign * z_v, sign * z_s);
            spots[r * row + i + 1] = ln_s.exp();
            vars[r * row + i + 1] = recorded;
        }
    }
}
