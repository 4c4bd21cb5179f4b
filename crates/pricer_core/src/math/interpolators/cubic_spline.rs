//! Natural cubic spline interpolation.

use super::traits::{find_segment, out_of_bounds, validate_knots};
use super::Interpolator;
use crate::types::InterpolationError;
use num_traits::Float;

/// Natural cubic spline (zero second derivative at both ends).
///
/// With exactly two knots the spline degenerates to a straight line.
/// The second derivatives are found with the Thomas algorithm.
///
/// # Example
///
/// ```
/// use pricer_core::math::interpolators::{CubicSplineInterpolator, Interpolator};
///
/// let xs: [f64; 4] = [0.0, 1.0, 2.0, 3.0];
/// let ys = [0.0, 1.0, 4.0, 9.0];
/// let spline = CubicSplineInterpolator::new(&xs, &ys).unwrap();
/// assert!((spline.interpolate(2.0).unwrap() - 4.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CubicSplineInterpolator<T: Float> {
    xs: Vec<T>,
    ys: Vec<T>,
    /// Second derivatives at the knots
    m: Vec<T>,
}

impl<T: Float> CubicSplineInterpolator<T> {
    /// Construct a natural cubic spline.
    ///
    /// # Errors
    ///
    /// Same as [`super::LinearInterpolator::new`].
    pub fn new(xs: &[T], ys: &[T]) -> Result<Self, InterpolationError> {
        validate_knots(xs, ys, 2)?;
        let m = Self::second_derivatives(xs, ys);
        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            m,
        })
    }

    fn second_derivatives(xs: &[T], ys: &[T]) -> Vec<T> {
        let n = xs.len();
        let mut m = vec![T::zero(); n];
        if n < 3 {
            return m;
        }
        let two = T::one() + T::one();
        let six = two * (two + T::one());

        let h: Vec<T> = xs.windows(2).map(|w| w[1] - w[0]).collect();
        let interior = n - 2;
        let mut c_prime = vec![T::zero(); interior];
        let mut d_prime = vec![T::zero(); interior];

        for k in 0..interior {
            let i = k + 1;
            let sub = h[i - 1];
            let diag = two * (h[i - 1] + h[i]);
            let sup = h[i];
            let rhs = six * ((ys[i + 1] - ys[i]) / h[i] - (ys[i] - ys[i - 1]) / h[i - 1]);
            if k == 0 {
                c_prime[k] = sup / diag;
                d_prime[k] = rhs / diag;
            } else {
                let denom = diag - sub * c_prime[k - 1];
                c_prime[k] = sup / denom;
                d_prime[k] = (rhs - sub * d_prime[k - 1]) / denom;
            }
        }

        m[interior] = d_prime[interior - 1];
        for k in (0..interior - 1).rev() {
            m[k + 1] = d_prime[k] - c_prime[k] * m[k + 2];
        }
        m
    }

    /// Slope on segment `i` at fraction `b` of its width.
    fn segment_slope(&self, i: usize, b: T) -> T {
        let one = T::one();
        let three = one + one + one;
        let six = three + three;
        let h = self.xs[i + 1] - self.xs[i];
        let a = one - b;
        (self.ys[i + 1] - self.ys[i]) / h
            + h / six * ((three * b * b - one) * self.m[i + 1] - (three * a * a - one) * self.m[i])
    }

    /// First derivative at `x`.
    pub fn derivative(&self, x: T) -> Result<T, InterpolationError> {
        let (lo, hi) = self.domain();
        if !(x >= lo && x <= hi) {
            return Err(out_of_bounds(x, lo, hi));
        }
        let i = find_segment(&self.xs, x);
        let b = (x - self.xs[i]) / (self.xs[i + 1] - self.xs[i]);
        Ok(self.segment_slope(i, b))
    }

    /// Largest first derivative over the domain, as `(x, slope)`.
    ///
    /// The slope is quadratic on each segment, so its maximum sits at a knot
    /// or where the second derivative crosses zero.
    pub fn max_derivative(&self) -> (T, T) {
        let mut best = (self.xs[0], self.segment_slope(0, T::zero()));
        for i in 0..self.xs.len() - 1 {
            let (m0, m1) = (self.m[i], self.m[i + 1]);
            let mut fractions = vec![T::zero(), T::one()];
            if m0 != m1 {
                let b = m0 / (m0 - m1);
                if b > T::zero() && b < T::one() {
                    fractions.push(b);
                }
            }
            let h = self.xs[i + 1] - self.xs[i];
            for b in fractions {
                let slope = self.segment_slope(i, b);
                if slope > best.1 {
                    best = (self.xs[i] + b * h, slope);
                }
            }
        }
        best
    }
}

impl<T: Float> Interpolator<T> for CubicSplineInterpolator<T> {
    fn interpolate(&self, x: T) -> Result<T, InterpolationError> {
        let (lo, hi) = self.domain();
        if !(x >= lo && x <= hi) {
            return Err(out_of_bounds(x, lo, hi));
        }
        let six = T::from(6.0).unwrap_or_else(T::one);
        let i = find_segment(&self.xs, x);
        let h = self.xs[i + 1] - self.xs[i];
        let a = (self.xs[i + 1] - x) / h;
        let b = (x - self.xs[i]) / h;
        Ok(a * self.ys[i]
            + b * self.ys[i + 1]
            + ((a * a * a - a) * self.m[i] + (b * b * b - b) * self.m[i + 1]) * h * h / six)
    }

    #[inline]
    fn domain(&self) -> (T, T) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }
}
