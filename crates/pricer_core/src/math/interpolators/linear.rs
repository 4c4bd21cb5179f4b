//! Linear interpolation implementation.

use super::traits::{find_segment, out_of_bounds, validate_knots};
use super::Interpolator;
use crate::types::InterpolationError;
use num_traits::Float;

/// Piecewise linear interpolator.
///
/// Knots must be strictly increasing; at least 2 are required.
///
/// # Example
///
/// ```
/// use pricer_core::math::interpolators::{Interpolator, LinearInterpolator};
///
/// let interp = LinearInterpolator::<f64>::new(&[0.0, 1.0, 2.0], &[0.0, 2.0, 4.0]).unwrap();
/// assert!((interp.interpolate(0.5).unwrap() - 1.0).abs() < 1e-12);
/// assert_eq!(interp.domain(), (0.0, 2.0));
/// assert!(interp.interpolate(2.5).is_err());
/// assert_eq!(interp.interpolate_flat(2.5), 4.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LinearInterpolator<T: Float> {
    xs: Vec<T>,
    ys: Vec<T>,
}

impl<T: Float> LinearInterpolator<T> {
    /// Construct from knots.
    ///
    /// # Errors
    ///
    /// * `InsufficientData` - fewer than 2 points
    /// * `NonMonotonicData` - `xs` not strictly increasing
    /// * `InvalidInput` - mismatched lengths or non-finite values
    pub fn new(xs: &[T], ys: &[T]) -> Result<Self, InterpolationError> {
        validate_knots(xs, ys, 2)?;
        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
        })
    }

    /// Knot abscissae.
    #[inline]
    pub fn xs(&self) -> &[T] {
        &self.xs
    }

    /// Knot values.
    #[inline]
    pub fn ys(&self) -> &[T] {
        &self.ys
    }
}

impl<T: Float> Interpolator<T> for LinearInterpolator<T> {
    fn interpolate(&self, x: T) -> Result<T, InterpolationError> {
        let (lo, hi) = self.domain();
        if !(x >= lo && x <= hi) {
            return Err(out_of_bounds(x, lo, hi));
        }
        let i = find_segment(&self.xs, x);
        let t = (x - self.xs[i]) / (self.xs[i + 1] - self.xs[i]);
        Ok(self.ys[i] + (self.ys[i + 1] - self.ys[i]) * t)
    }

    #[inline]
    fn domain(&self) -> (T, T) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_knots_reproduced() {
        let interp = LinearInterpolator::new(&[0.0, 1.0, 3.0], &[1.0, 2.0, 0.0]).unwrap();
        assert_relative_eq!(interp.interpolate(0.0).unwrap(), 1.0);
        assert_relative_eq!(interp.interpolate(1.0).unwrap(), 2.0);
        assert_relative_eq!(interp.interpolate(3.0).unwrap(), 0.0);
        assert_relative_eq!(interp.interpolate(2.0).unwrap(), 1.0);
    }

    #[test]
    fn test_rejects_unsorted() {
        let err = LinearInterpolator::new(&[0.0, 2.0, 1.0], &[0.0, 1.0, 2.0]).unwrap_err();
        assert_eq!(err, InterpolationError::NonMonotonicData { index: 2 });
    }

    #[test]
    fn test_rejects_duplicates_and_short_input() {
        assert!(LinearInterpolator::new(&[1.0, 1.0], &[0.0, 1.0]).is_err());
        assert!(matches!(
            LinearInterpolator::new(&[1.0], &[0.0]),
            Err(InterpolationError::InsufficientData { got: 1, need: 2 })
        ));
        assert!(LinearInterpolator::new(&[1.0, 2.0], &[0.0]).is_err());
    }

    #[test]
    fn test_out_of_bounds() {
        let interp = LinearInterpolator::new(&[1.0, 2.0], &[1.0, 4.0]).unwrap();
        match interp.interpolate(0.5) {
            Err(InterpolationError::OutOfBounds { x, min, max }) => {
                assert_eq!((x, min, max), (0.5, 1.0, 2.0));
            }
            other => panic!("expected OutOfBounds, got {:?}", other),
        }
        assert_eq!(interp.interpolate_flat(0.5), 1.0);
    }
}
