//! Interpolator trait.

use crate::types::InterpolationError;
use num_traits::Float;

/// One-dimensional interpolation over a fixed knot set.
pub trait Interpolator<T: Float> {
    /// Value at `x`; `OutOfBounds` outside [`Interpolator::domain`].
    fn interpolate(&self, x: T) -> Result<T, InterpolationError>;

    /// Smallest and largest knot.
    fn domain(&self) -> (T, T);

    /// Value at `x` with the end values held flat outside the domain.
    fn interpolate_flat(&self, x: T) -> T {
        let (lo, hi) = self.domain();
        let clamped = x.max(lo).min(hi);
        self.interpolate(clamped).unwrap_or_else(|_| T::nan())
    }
}

/// Check that `xs` and `ys` pair up and `xs` is strictly increasing.
pub(crate) fn validate_knots<T: Float>(
    xs: &[T],
    ys: &[T],
    need: usize,
) -> Result<(), InterpolationError> {
    if xs.len() != ys.len() {
        return Err(InterpolationError::InvalidInput(format!(
            "xs and ys must have same length: got {} and {}",
            xs.len(),
            ys.len()
        )));
    }
    if xs.len() < need {
        return Err(InterpolationError::InsufficientData {
            got: xs.len(),
            need,
        });
    }
    if let Some(i) = xs.windows(2).position(|w| !(w[1] > w[0])) {
        return Err(InterpolationError::NonMonotonicData { index: i + 1 });
    }
    if xs.iter().chain(ys).any(|v| !v.is_finite()) {
        return Err(InterpolationError::InvalidInput(
            "knots must be finite".to_string(),
        ));
    }
    Ok(())
}

/// Index `i` with `xs[i] <= x < xs[i+1]`, clamped to `[0, n-2]`.
#[inline]
pub(crate) fn find_segment<T: Float>(xs: &[T], x: T) -> usize {
    let pos = xs.partition_point(|&xi| xi <= x);
    if pos == 0 {
        0
    } else {
        (pos - 1).min(xs.len() - 2)
    }
}

#[inline]
pub(crate) fn out_of_bounds<T: Float>(x: T, lo: T, hi: T) -> InterpolationError {
    InterpolationError::OutOfBounds {
        x: x.to_f64().unwrap_or(f64::NAN),
        min: lo.to_f64().unwrap_or(f64::NAN),
        max: hi.to_f64().unwrap_or(f64::NAN),
    }
}
