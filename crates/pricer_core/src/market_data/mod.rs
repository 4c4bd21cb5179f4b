//! Market data consumed by the calibration and simulation engines.
//!
//! - [`curves`]: discount curves and the [`curves::YieldCurve`] trait
//! - [`smile`]: implied-volatility smiles and the ATM term structure
//!
//! # Example
//!
//! ```
//! use pricer_core::market_data::curves::{FlatCurve, YieldCurve};
//! use pricer_core::market_data::smile::{SmileData, SmileQuote};
//!
//! let curve = FlatCurve::new(0.05);
//! let smile = SmileData::new(100.0, 1.0, 0.0, vec![SmileQuote::new(100.0, 1.0, 0.2)]).unwrap();
//! let fwd = smile.forward(&curve).unwrap();
//! assert!((fwd - 100.0 * 0.05f64.exp()).abs() < 1e-10);
//! ```

pub mod curves;
pub mod smile;

pub use curves::{CurveOptions, DiscountCurve, Extrapolation, FlatCurve, Interpolation, YieldCurve};
pub use smile::{OptionType, SmileData, SmileQuote};
