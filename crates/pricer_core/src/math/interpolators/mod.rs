//! Interpolation methods for numerical computation.
//!
//! - [`LinearInterpolator`]: Piecewise linear interpolation between knots
//! - [`CubicSplineInterpolator`]: Natural cubic spline with C² continuity
//!
//! Both implement [`Interpolator`], generic over `T: num_traits::Float`,
//! and reject unsorted or duplicate knots instead of silently reordering
//! them.
//!
//! ## Example
//!
//! ```
//! use pricer_core::math::interpolators::{Interpolator, LinearInterpolator};
//!
//! let interp = LinearInterpolator::<f64>::new(&[0.0, 1.0, 2.0, 3.0], &[0.0, 1.0, 4.0, 9.0]).unwrap();
//! let y = interp.interpolate(1.5).unwrap();
//! assert!((y - 2.5).abs() < 1e-10);
//! ```

mod cubic_spline;
mod linear;
mod traits;

pub use cubic_spline::CubicSplineInterpolator;
pub use linear::LinearInterpolator;
pub use traits::Interpolator;
