//! # pricer_core: Foundation layer for curve building and model calibration
//!
//! ## Layer 1 (Foundation) Role
//!
//! pricer_core is the bottom layer of the workspace and provides:
//! - Error taxonomy: `CalibrationError`, `ErrorLocation` (`types::error`)
//! - Time types: `Date`, `Tenor`, `DayCountConvention` (`types::time`)
//! - Calendars and rolling rules behind `ConventionLayer` (`conventions`)
//! - Brent and Levenberg–Marquardt solvers, Gauss–Legendre quadrature and
//!   1-D interpolators (`math`)
//! - Immutable discount curves and implied-vol smiles (`market_data`)
//!
//! ## Dependencies
//!
//! Layer 1 depends on no other pricer_* crate:
//! - num-traits: generic numerics for the solvers and interpolators
//! - chrono: date arithmetic
//! - thiserror: error enums
//! - tracing: diagnostic events (no subscriber is installed here)
//! - serde: serialisation support (optional)
//!
//! ## Usage Examples
//!
//! ```rust
//! use pricer_core::market_data::curves::{CurveOptions, DiscountCurve, Interpolation, YieldCurve};
//! use pricer_core::types::{Date, DayCountConvention};
//!
//! let start = Date::from_ymd(2025, 1, 1).unwrap();
//! let end = Date::from_ymd(2026, 1, 1).unwrap();
//! let t = DayCountConvention::Act365Fixed.year_fraction(start, end);
//! assert_eq!(t, 1.0);
//!
//! let curve = DiscountCurve::from_pillars(
//!     &[t],
//!     &[1.0 / 1.05],
//!     Interpolation::LogLinear,
//!     CurveOptions::default(),
//! )
//! .unwrap();
//! assert!((curve.discount_factor(1.0).unwrap() * 1.05 - 1.0).abs() < 1e-15);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): serialisation for dates, tenors, conventions, curves
//!   and smiles

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod conventions;
pub mod market_data;
pub mod math;
pub mod types;
