//! Unconstrained parameterisation of [`HestonParams`].
//!
//! ```text
//! x = [ln v0, ln kappa, ln theta, ln sigma, atanh(rho / RHO_MAX)]
//! ```
//!
//! Every real `x` maps to positive `v0, kappa, theta, sigma` and
//! `|rho| < RHO_MAX`, so the optimiser never needs clipping.

use crate::models::HestonParams;

/// Largest correlation magnitude reachable by the optimiser.
pub const RHO_MAX: f64 = 0.999;

/// Maps parameters into optimiser space.
///
/// A correlation at or beyond `±RHO_MAX` is pulled just inside the range.
pub fn to_unconstrained(params: &HestonParams) -> Vec<f64> {
    let edge = RHO_MAX * (1.0 - 1e-9);
    let rho = params.rho.clamp(-edge, edge);
    vec![
        params.v0.ln(),
        params.kappa.ln(),
        params.theta.ln(),
        params.sigma.ln(),
        (rho / RHO_MAX).atanh(),
    ]
}

/// Maps an optimiser point back. The result is not validated.
pub fn from_unconstrained(x: &[f64]) -> HestonParams {
    let at = |i: usize| x.get(i).copied().unwrap_or(f64::NAN);
    HestonParams {
        v0: at(0).exp(),
        kappa: at(1).exp(),
        theta: at(2).exp(),
        sigma: at(3).exp(),
        rho: RHO_MAX * at(4).tanh(),
    }
}
