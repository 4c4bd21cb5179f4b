//! Levenberg-Marquardt nonlinear least-squares solver.
//!
//! This module provides the [`LevenbergMarquardtSolver`] for solving nonlinear
//! least-squares problems commonly encountered in model calibration.
//!
//! # Algorithm
//!
//! ```text
//! (J^T J + λ D) δ = -J^T r,    D = diag(J^T J) floored at 1e-12
//! p_{n+1} = p_n + δ            (only if the step reduces ||r||²)
//! ```
//!
//! The Jacobian is built by forward differences. Rejected steps raise λ,
//! accepted ones lower it.
//!
//! # Termination
//!
//! The solver reports *why* it stopped through [`LMTermination`]. Four of
//! the reasons count as convergence: residual norm, gradient norm, relative
//! reduction of the objective, and relative step size. The remaining three
//! (iteration cap, wall-clock deadline, damping saturated) do not, and
//! callers must treat such a result as a failure.
//!
//! # Example
//!
//! ```
//! use pricer_core::math::solvers::{LevenbergMarquardtSolver, LMConfig};
//!
//! // Fit y = a * exp(-b * x) to data
//! let x_data = vec![0.0, 1.0, 2.0, 3.0, 4.0];
//! let y_data: Vec<f64> = x_data.iter().map(|x: &f64| 2.0 * (-0.5 * x).exp()).collect();
//!
//! let solver = LevenbergMarquardtSolver::new(LMConfig::default());
//! let residuals = |params: &[f64]| -> Vec<f64> {
//!     x_data.iter().zip(&y_data).map(|(&x, &y)| params[0] * (-params[1] * x).exp() - y).collect()
//! };
//!
//! let result = solver.solve(residuals, vec![1.0, 1.0]).unwrap();
//! assert!(result.converged);
//! assert!((result.params[1] - 0.5).abs() < 1e-6);
//! ```

use std::time::{Duration, Instant};

use crate::types::SolverError;

/// Configuration for Levenberg-Marquardt solver.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LMConfig {
    /// Absolute tolerance on the residual norm `||r||`.
    pub tolerance: f64,
    /// Maximum number of iterations.
    pub max_iterations: usize,
    /// Initial damping factor.
    pub initial_lambda: f64,
    /// Factor to increase lambda on rejected step.
    pub lambda_up: f64,
    /// Factor to decrease lambda on accepted step.
    pub lambda_down: f64,
    /// Minimum damping factor.
    pub min_lambda: f64,
    /// Maximum damping factor; reaching it stops the solver.
    pub max_lambda: f64,
    /// Relative step size below which the solver stops.
    pub param_tolerance: f64,
    /// Tolerance on `max |J^T r|`.
    pub gradient_tolerance: f64,
    /// Relative objective reduction below which an accepted step stops the solver.
    pub function_tolerance: f64,
    /// Optional wall-clock budget.
    pub time_budget: Option<Duration>,
}

impl Default for LMConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 100,
            initial_lambda: 1e-3,
            lambda_up: 10.0,
            lambda_down: 0.1,
            min_lambda: 1e-12,
            max_lambda: 1e10,
            param_tolerance: 1e-10,
            gradient_tolerance: 1e-14,
            function_tolerance: 1e-12,
            time_budget: None,
        }
    }
}

impl LMConfig {
    /// Create a new LM configuration.
    pub fn new(tolerance: f64, max_iterations: usize) -> Self {
        Self {
            tolerance,
            max_iterations,
            ..Default::default()
        }
    }

    /// Add a wall-clock budget.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }
}

/// Why the solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum LMTermination {
    /// `||r|| <= tolerance`
    ResidualTolerance,
    /// `max |J^T r| <= gradient_tolerance`
    GradientTolerance,
    /// Accepted step reduced the objective by less than `function_tolerance` relatively
    FunctionTolerance,
    /// Accepted step smaller than `param_tolerance` relatively
    ParameterTolerance,
    /// Iteration cap reached
    MaxIterations,
    /// Wall-clock budget exhausted
    Deadline,
    /// Damping reached `max_lambda` without an acceptable step
    Stalled,
}

impl LMTermination {
    /// Whether this reason counts as convergence.
    pub fn is_converged(&self) -> bool {
        matches!(
            self,
            LMTermination::ResidualTolerance
                | LMTermination::GradientTolerance
                | LMTermination::FunctionTolerance
                | LMTermination::ParameterTolerance
        )
    }
}

/// Result of Levenberg-Marquardt optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct LMResult {
    /// Final optimized parameters.
    pub params: Vec<f64>,
    /// Final residual vector.
    pub residuals: Vec<f64>,
    /// Final residual sum of squares.
    pub residual_ss: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether convergence was achieved.
    pub converged: bool,
    /// Stopping reason.
    pub termination: LMTermination,
    /// Final lambda value.
    pub final_lambda: f64,
}

impl LMResult {
    /// Get the root mean square error.
    pub fn rmse(&self) -> f64 {
        if self.residuals.is_empty() {
            return 0.0;
        }
        (self.residual_ss / self.residuals.len() as f64).sqrt()
    }
}

/// Levenberg-Marquardt nonlinear least-squares solver.
///
/// Solves `min_p ||f(p)||²` where `f(p)` is the residual vector.
/// A residual function returning non-finite values at a trial point is
/// treated as a rejected step.
#[derive(Debug, Clone)]
pub struct LevenbergMarquardtSolver {
    config: LMConfig,
}

impl LevenbergMarquardtSolver {
    /// Create a new LM solver with the given configuration.
    pub fn new(config: LMConfig) -> Self {
        Self { config }
    }

    /// Create a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(LMConfig::default())
    }

    /// Get the solver configuration.
    pub fn config(&self) -> &LMConfig {
        &self.config
    }

    /// Solve the nonlinear least-squares problem.
    ///
    /// # Errors
    ///
    /// `SolverError::NumericalInstability` for an empty parameter or residual
    /// vector, or non-finite residuals at the initial point. Budget
    /// exhaustion is *not* an error here: it is reported through
    /// [`LMResult::termination`].
    pub fn solve<F>(&self, residuals: F, initial_params: Vec<f64>) -> Result<LMResult, SolverError>
    where
        F: Fn(&[f64]) -> Vec<f64>,
    {
        let cfg = &self.config;
        let n_params = initial_params.len();
        if n_params == 0 {
            return Err(SolverError::NumericalInstability(
                "Empty parameter vector".to_string(),
            ));
        }

        let started = Instant::now();
        let mut params = initial_params;
        let mut lambda = cfg.initial_lambda;

        let mut r = residuals(&params);
        if r.is_empty() {
            return Err(SolverError::NumericalInstability(
                "Empty residual vector".to_string(),
            ));
        }
        let mut ss = sum_of_squares(&r);
        if !ss.is_finite() {
            return Err(SolverError::NumericalInstability(
                "Non-finite residuals at initial parameters".to_string(),
            ));
        }

        let finish = |params: Vec<f64>, r: Vec<f64>, ss: f64, it: usize, t: LMTermination, l: f64| {
            LMResult {
                params,
                residuals: r,
                residual_ss: ss,
                iterations: it,
                converged: t.is_converged(),
                termination: t,
                final_lambda: l,
            }
        };

        let mut jacobian = compute_jacobian(&residuals, &params, &r);
        let mut iteration = 0;

        while iteration < cfg.max_iterations {
            if ss.sqrt() <= cfg.tolerance {
                return Ok(finish(params, r, ss, iteration, LMTermination::ResidualTolerance, lambda));
            }
            if let Some(budget) = cfg.time_budget {
                if started.elapsed() >= budget {
                    return Ok(finish(params, r, ss, iteration, LMTermination::Deadline, lambda));
                }
            }

            let (jtj, jtr) = normal_equations(&jacobian, &r, n_params);
            let grad_inf = jtr.iter().fold(0.0_f64, |m, g| m.max(g.abs()));
            if grad_inf <= cfg.gradient_tolerance {
                return Ok(finish(params, r, ss, iteration, LMTermination::GradientTolerance, lambda));
            }

            iteration += 1;

            let mut damped = jtj.clone();
            for (i, row) in damped.iter_mut().enumerate() {
                row[i] += lambda * jtj[i][i].max(1e-12);
            }
            let neg_jtr: Vec<f64> = jtr.iter().map(|g| -g).collect();

            let delta = match solve_cholesky(&damped, &neg_jtr) {
                Some(d) => d,
                None => {
                    lambda *= cfg.lambda_up;
                    if lambda >= cfg.max_lambda {
                        return Ok(finish(params, r, ss, iteration, LMTermination::Stalled, lambda));
                    }
                    continue;
                }
            };

            let trial: Vec<f64> = params.iter().zip(&delta).map(|(p, d)| p + d).collect();
            let trial_r = residuals(&trial);
            let trial_ss = sum_of_squares(&trial_r);

            if trial_ss.is_finite() && trial_r.len() == r.len() && trial_ss < ss {
                let reduction = (ss - trial_ss) / ss;
                let step = delta.iter().map(|d| d * d).sum::<f64>().sqrt();
                let norm = params.iter().map(|p| p * p).sum::<f64>().sqrt();

                params = trial;
                r = trial_r;
                ss = trial_ss;
                lambda = (lambda * cfg.lambda_down).max(cfg.min_lambda);

                if reduction <= cfg.function_tolerance {
                    return Ok(finish(params, r, ss, iteration, LMTermination::FunctionTolerance, lambda));
                }
                if step <= cfg.param_tolerance * (norm + cfg.param_tolerance) {
                    return Ok(finish(params, r, ss, iteration, LMTermination::ParameterTolerance, lambda));
                }
                jacobian = compute_jacobian(&residuals, &params, &r);
            } else {
                lambda *= cfg.lambda_up;
                if lambda >= cfg.max_lambda {
                    return Ok(finish(params, r, ss, iteration, LMTermination::Stalled, lambda));
                }
            }
        }

        if ss.sqrt() <= cfg.tolerance {
            return Ok(finish(params, r, ss, iteration, LMTermination::ResidualTolerance, lambda));
        }
        Ok(finish(params, r, ss, iteration, LMTermination::MaxIterations, lambda))
    }
}

/// `J^T J` and `J^T r`.
fn normal_equations(jacobian: &[Vec<f64>], r: &[f64], n_params: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
    let mut jtj = vec![vec![0.0; n_params]; n_params];
    let mut jtr = vec![0.0; n_params];
    for (row, &ri) in jacobian.iter().zip(r) {
        for i in 0..n_params {
            jtr[i] += row[i] * ri;
            for j in 0..=i {
                jtj[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..n_params {
        for j in 0..i {
            jtj[j][i] = jtj[i][j];
        }
    }
    (jtj, jtr)
}

/// Forward-difference Jacobian, one row per residual.
fn compute_jacobian<F>(residuals: &F, params: &[f64], r0: &[f64]) -> Vec<Vec<f64>>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let n_params = params.len();
    let n_residuals = r0.len();
    let eps = f64::EPSILON.sqrt();

    let mut jacobian = vec![vec![0.0; n_params]; n_residuals];
    let mut bumped = params.to_vec();

    for j in 0..n_params {
        let h = eps * params[j].abs().max(1.0);
        bumped[j] = params[j] + h;
        let r_plus = residuals(&bumped);
        bumped[j] = params[j];

        for i in 0..n_residuals {
            let v = r_plus.get(i).copied().unwrap_or(f64::NAN);
            jacobian[i][j] = if v.is_finite() { (v - r0[i]) / h } else { 0.0 };
        }
    }

    jacobian
}

#[inline]
fn sum_of_squares(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum()
}

/// Solve Ax = b using Cholesky decomposition.
fn solve_cholesky(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }
            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    x.iter().all(|v| v.is_finite()).then_some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================
    // LMConfig Tests
    // ========================================

    #[test]
    fn test_config_default() {
        let config = LMConfig::default();
        assert!((config.tolerance - 1e-10).abs() < 1e-15);
        assert_eq!(config.max_iterations, 100);
        assert!(config.time_budget.is_none());
    }

    #[test]
    fn test_termination_classification() {
        assert!(LMTermination::ResidualTolerance.is_converged());
        assert!(LMTermination::GradientTolerance.is_converged());
        assert!(LMTermination::FunctionTolerance.is_converged());
        assert!(LMTermination::ParameterTolerance.is_converged());
        assert!(!LMTermination::MaxIterations.is_converged());
        assert!(!LMTermination::Deadline.is_converged());
        assert!(!LMTermination::Stalled.is_converged());
    }

    // ========================================
    // LevenbergMarquardtSolver Tests
    // ========================================

    #[test]
    fn test_solve_simple_linear() {
        let residuals = |p: &[f64]| -> Vec<f64> { vec![p[0] - 2.0, p[1] - 3.0] };
        let result = LevenbergMarquardtSolver::with_defaults()
            .solve(residuals, vec![0.0, 0.0])
            .unwrap();

        assert!(result.converged);
        assert!((result.params[0] - 2.0).abs() < 1e-6);
        assert!((result.params[1] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_solve_rosenbrock() {
        let residuals =
            |p: &[f64]| -> Vec<f64> { vec![10.0 * (p[1] - p[0] * p[0]), 1.0 - p[0]] };
        let config = LMConfig {
            max_iterations: 200,
            ..Default::default()
        };
        let result = LevenbergMarquardtSolver::new(config)
            .solve(residuals, vec![-1.2, 1.0])
            .unwrap();

        assert!(result.converged, "termination {:?}", result.termination);
        assert!((result.params[0] - 1.0).abs() < 1e-5);
        assert!((result.params[1] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_solve_already_optimal() {
        let residuals = |p: &[f64]| -> Vec<f64> { vec![p[0] - 5.0] };
        let result = LevenbergMarquardtSolver::with_defaults()
            .solve(residuals, vec![5.0])
            .unwrap();

        assert!(result.converged);
        assert_eq!(result.iterations, 0);
        assert_eq!(result.termination, LMTermination::ResidualTolerance);
    }

    #[test]
    fn test_nonzero_residual_problem_stops_on_gradient_or_reduction() {
        // Inconsistent system: best fit p = 2 with ss = 2
        let residuals = |p: &[f64]| -> Vec<f64> { vec![p[0] - 1.0, p[0] - 3.0] };
        let result = LevenbergMarquardtSolver::with_defaults()
            .solve(residuals, vec![10.0])
            .unwrap();

        assert!(result.converged, "termination {:?}", result.termination);
        assert!((result.params[0] - 2.0).abs() < 1e-6);
        assert!((result.residual_ss - 2.0).abs() < 1e-9);
        assert!(result.rmse() > 0.9);
    }

    #[test]
    fn test_iteration_cap_is_not_convergence() {
        let residuals =
            |p: &[f64]| -> Vec<f64> { vec![10.0 * (p[1] - p[0] * p[0]), 1.0 - p[0]] };
        let config = LMConfig {
            max_iterations: 2,
            ..Default::default()
        };
        let result = LevenbergMarquardtSolver::new(config)
            .solve(residuals, vec![-1.2, 1.0])
            .unwrap();

        assert!(!result.converged);
        assert_eq!(result.termination, LMTermination::MaxIterations);
        assert_eq!(result.iterations, 2);
    }

    #[test]
    fn test_zero_time_budget_reports_deadline() {
        let residuals = |p: &[f64]| -> Vec<f64> { vec![p[0] - 1.0, p[1] + 1.0] };
        let config = LMConfig::default().with_time_budget(Duration::ZERO);
        let result = LevenbergMarquardtSolver::new(config)
            .solve(residuals, vec![5.0, 5.0])
            .unwrap();

        assert_eq!(result.termination, LMTermination::Deadline);
        assert!(!result.converged);
    }

    #[test]
    fn test_non_finite_trial_is_rejected() {
        // Residual undefined for p <= 0; optimum at p = 1
        let residuals = |p: &[f64]| -> Vec<f64> {
            if p[0] <= 0.0 {
                vec![f64::NAN]
            } else {
                vec![p[0].ln()]
            }
        };
        let result = LevenbergMarquardtSolver::with_defaults()
            .solve(residuals, vec![5.0])
            .unwrap();

        assert!(result.converged);
        assert!((result.params[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_solve_empty_params() {
        let residuals = |_p: &[f64]| -> Vec<f64> { vec![1.0] };
        assert!(LevenbergMarquardtSolver::with_defaults()
            .solve(residuals, vec![])
            .is_err());
    }

    #[test]
    fn test_non_finite_initial_residuals() {
        let residuals = |_p: &[f64]| -> Vec<f64> { vec![f64::INFINITY] };
        let err = LevenbergMarquardtSolver::with_defaults()
            .solve(residuals, vec![1.0])
            .unwrap_err();
        assert!(matches!(err, SolverError::NumericalInstability(_)));
    }

    // ========================================
    // Linear Algebra Tests
    // ========================================

    #[test]
    fn test_cholesky_simple() {
        let a = vec![vec![4.0, 2.0], vec![2.0, 2.0]];
        let x = solve_cholesky(&a, &[8.0, 5.0]).unwrap();
        assert!((x[0] - 1.5).abs() < 1e-10);
        assert!((x[1] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_cholesky_non_positive_definite() {
        let a = vec![vec![-1.0, 0.0], vec![0.0, 1.0]];
        assert!(solve_cholesky(&a, &[1.0, 1.0]).is_none());
    }

    #[test]
    fn test_jacobian_linear() {
        let residuals = |p: &[f64]| -> Vec<f64> { vec![2.0 * p[0] + 3.0 * p[1]] };
        let params = vec![1.0, 1.0];
        let r0 = residuals(&params);
        let jacobian = compute_jacobian(&residuals, &params, &r0);
        assert!((jacobian[0][0] - 2.0).abs() < 1e-6);
        assert!((jacobian[0][1] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_normal_equations_symmetric() {
        let jac = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let (jtj, jtr) = normal_equations(&jac, &[1.0, 1.0, 1.0], 2);
        assert_eq!(jtj[0][1], jtj[1][0]);
        assert_eq!(jtj[0][0], 35.0);
        assert_eq!(jtj[0][1], 44.0);
        assert_eq!(jtr, vec![9.0, 12.0]);
    }
}
