//! # pricer_optimiser
//!
//! Discount curve construction for quantcore.
//!
//! This crate sits between Models (L2) and Pricing (L3) in the architecture,
//! solving the inverse problem of finding discount factors that reprice a set
//! of quoted instruments.
//!
//! ## Architecture Position
//!
//! Layer 2.5 in the **P**ricer layer. Depends on `pricer_core` (L1) for dates,
//! conventions, solvers and the curve type.
//!
//! ## Modules
//!
//! - `bootstrapping`: instruments, the sequential curve builder and the
//!   fingerprint-keyed curve cache
//!
//! ## Example
//!
//! ```rust
//! use pricer_core::conventions::WeekendCalendar;
//! use pricer_core::market_data::curves::YieldCurve;
//! use pricer_core::types::{Date, Tenor};
//! use pricer_optimiser::prelude::*;
//!
//! let builder = CurveBuilder::new(BootstrapConfig::default(), Date::from_ymd(2025, 1, 1).unwrap());
//! let result = builder
//!     .build(
//!         &[
//!             Instrument::deposit(Tenor::months(6), 0.030),
//!             Instrument::swap(Tenor::years(2), 0.033),
//!             Instrument::swap(Tenor::years(5), 0.036),
//!         ],
//!         &WeekendCalendar::new(),
//!     )
//!     .unwrap();
//! assert_eq!(result.pillars.len(), 3);
//! assert!(result.curve.forward_rate(2.0, 5.0).unwrap() > 0.036);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod bootstrapping;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::bootstrapping::*;
}
