//! Discount curves.
//!
//! - [`YieldCurve`]: discount factor, zero and forward rate queries
//! - [`FlatCurve`]: one rate for every maturity
//! - [`DiscountCurve`]: immutable pillar curve produced by the bootstrapper
//! - [`Interpolation`]: pillar interpolation rule, shared with the builder

mod discount;
mod flat;
mod interpolation;
mod traits;

pub use discount::{CurveOptions, CurveSnapshot, DiscountCurve, Extrapolation};
pub use flat::FlatCurve;
pub use interpolation::{Interpolation, PillarInterpolator};
pub use traits::YieldCurve;
