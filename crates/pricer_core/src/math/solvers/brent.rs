//! Brent's method root-finding solver.

use super::SolverConfig;
use crate::types::SolverError;
use num_traits::Float;

/// Outcome of a successful root search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootResult<T: Float> {
    /// The root.
    pub root: T,
    /// Function value at the root.
    pub residual: T,
    /// Function evaluations spent, including bracketing.
    pub iterations: usize,
}

/// Brent's method root finder.
///
/// Combines bisection, secant, and inverse quadratic interpolation for
/// robust root finding without requiring derivatives. Guaranteed to
/// converge for continuous functions with a valid bracket.
///
/// [`BrentSolver::solve_seeded`] front-loads a secant step from an initial
/// guess and grows a bracket around it, so callers that know roughly where
/// the root is (e.g. a discount factor implied by the previous forward)
/// need not supply a bracket.
///
/// # Example
///
/// ```
/// use pricer_core::math::solvers::{BrentSolver, SolverConfig};
///
/// let solver = BrentSolver::new(SolverConfig::default());
///
/// // Solve x³ - x - 2 = 0 in bracket [1, 2]
/// let f = |x: f64| x * x * x - x - 2.0;
///
/// let root = solver.find_root(f, 1.0, 2.0).unwrap();
/// assert!((f(root)).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct BrentSolver<T: Float> {
    config: SolverConfig<T>,
}

impl<T: Float> BrentSolver<T> {
    /// Create a new Brent solver with the given configuration.
    pub fn new(config: SolverConfig<T>) -> Self {
        Self { config }
    }

    /// Create a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(SolverConfig::default())
    }

    /// Returns a reference to the solver configuration.
    pub fn config(&self) -> &SolverConfig<T> {
        &self.config
    }

    /// Find a root of `f` in the bracket [a, b], returning only the root.
    ///
    /// # Errors
    ///
    /// * `SolverError::NoBracket` - `f(a)` and `f(b)` have same sign
    /// * `SolverError::MaxIterationsExceeded` - Failed to converge
    pub fn find_root<F>(&self, f: F, a: T, b: T) -> Result<T, SolverError>
    where
        F: Fn(T) -> T,
    {
        self.solve(f, a, b).map(|r| r.root)
    }

    /// Find a root of `f` in the bracket [a, b].
    pub fn solve<F>(&self, f: F, a: T, b: T) -> Result<RootResult<T>, SolverError>
    where
        F: Fn(T) -> T,
    {
        let fa = f(a);
        let fb = f(b);
        self.brent(&f, a, fa, b, fb, 2)
    }

    /// Find a root starting from `guess` without a known bracket.
    ///
    /// A secant step through `guess` and `guess + step` gives a first
    /// estimate; a bracket is then grown geometrically around that estimate,
    /// never leaving `[lower, upper]`, and refined with Brent's method.
    ///
    /// # Example
    ///
    /// ```
    /// use pricer_core::math::solvers::BrentSolver;
    ///
    /// let solver = BrentSolver::<f64>::with_defaults();
    /// let result = solver
    ///     .solve_seeded(|x| x.exp() - 2.0, 0.5, 0.01, -10.0, 10.0)
    ///     .unwrap();
    /// assert!((result.root - 2f64.ln()).abs() < 1e-10);
    /// ```
    pub fn solve_seeded<F>(
        &self,
        f: F,
        guess: T,
        step: T,
        lower: T,
        upper: T,
    ) -> Result<RootResult<T>, SolverError>
    where
        F: Fn(T) -> T,
    {
        let two = T::one() + T::one();
        let clamp = |x: T| x.max(lower).min(upper);

        let x0 = clamp(guess);
        let f0 = f(x0);
        let mut evals = 1;
        if !f0.is_finite() {
            return Err(SolverError::NumericalInstability(
                "non-finite function value at initial guess".to_string(),
            ));
        }
        if f0.abs() <= self.config.tolerance {
            return Ok(RootResult {
                root: x0,
                residual: f0,
                iterations: evals,
            });
        }

        let step = if step.abs() > T::zero() {
            step.abs()
        } else {
            T::from(1e-4).unwrap_or_else(T::epsilon)
        };
        let x1 = clamp(x0 + step);
        let f1 = f(x1);
        evals += 1;

        // Secant estimate; fall back to the guess when the slope is useless.
        let centre = if f1.is_finite() && f1 != f0 {
            let xs = x1 - f1 * (x1 - x0) / (f1 - f0);
            if xs.is_finite() {
                clamp(xs)
            } else {
                x0
            }
        } else {
            x0
        };
        let mut width = ((centre - x0).abs() + (x1 - x0).abs()).max(step);

        loop {
            let a = clamp(centre - width);
            let b = clamp(centre + width);
            let fa = f(a);
            let fb = f(b);
            evals += 2;

            if fa.is_finite() && fb.is_finite() && fa * fb <= T::zero() {
                return self.brent(&f, a, fa, b, fb, evals);
            }
            if (a <= lower && b >= upper) || evals >= self.config.max_iterations {
                return Err(SolverError::NoBracket {
                    a: a.to_f64().unwrap_or(f64::NAN),
                    b: b.to_f64().unwrap_or(f64::NAN),
                });
            }
            width = width * two;
        }
    }

    fn brent<F>(
        &self,
        f: &F,
        a: T,
        fa: T,
        b: T,
        fb: T,
        evals_so_far: usize,
    ) -> Result<RootResult<T>, SolverError>
    where
        F: Fn(T) -> T,
    {
        if fa * fb > T::zero() {
            return Err(SolverError::NoBracket {
                a: a.to_f64().unwrap_or(f64::NAN),
                b: b.to_f64().unwrap_or(f64::NAN),
            });
        }
        if fa == T::zero() {
            return Ok(RootResult {
                root: a,
                residual: fa,
                iterations: evals_so_far,
            });
        }

        let two = T::one() + T::one();
        let three = two + T::one();
        let half = T::one() / two;

        let (mut a, mut fa, mut b, mut fb) = (a, fa, b, fb);
        let (mut c, mut fc) = (b, fb);
        let mut d = b - a;
        let mut e = d;
        let mut evals = evals_so_far;

        for _ in 0..self.config.max_iterations {
            if (fb > T::zero() && fc > T::zero()) || (fb < T::zero() && fc < T::zero()) {
                c = a;
                fc = fa;
                d = b - a;
                e = d;
            }
            if fc.abs() < fb.abs() {
                a = b;
                b = c;
                c = a;
                fa = fb;
                fb = fc;
                fc = fa;
            }

            let tol1 = two * T::epsilon() * b.abs() + half * self.config.x_tolerance * b.abs();
            let xm = half * (c - b);
            if fb.abs() <= self.config.tolerance || xm.abs() <= tol1 || fb == T::zero() {
                return Ok(RootResult {
                    root: b,
                    residual: fb,
                    iterations: evals,
                });
            }

            if e.abs() >= tol1 && fa.abs() > fb.abs() {
                let s = fb / fa;
                let (mut p, mut q);
                if a == c {
                    // Secant step
                    p = two * xm * s;
                    q = T::one() - s;
                } else {
                    // Inverse quadratic interpolation
                    let qq = fa / fc;
                    let r = fb / fc;
                    p = s * (two * xm * qq * (qq - r) - (b - a) * (r - T::one()));
                    q = (qq - T::one()) * (r - T::one()) * (s - T::one());
                }
                if p > T::zero() {
                    q = -q;
                }
                p = p.abs();
                let min1 = three * xm * q - (tol1 * q).abs();
                let min2 = (e * q).abs();
                if two * p < min1.min(min2) {
                    e = d;
                    d = p / q;
                } else {
                    d = xm;
                    e = d;
                }
            } else {
                d = xm;
                e = d;
            }

            a = b;
            fa = fb;
            b = if d.abs() > tol1 {
                b + d
            } else if xm > T::zero() {
                b + tol1
            } else {
                b - tol1
            };
            fb = f(b);
            evals += 1;
            if !fb.is_finite() {
                return Err(SolverError::NumericalInstability(format!(
                    "non-finite function value at x = {}",
                    b.to_f64().unwrap_or(f64::NAN)
                )));
            }
        }

        Err(SolverError::MaxIterationsExceeded {
            iterations: evals,
            residual: fb.to_f64().unwrap_or(f64::NAN),
        })
    }
}
