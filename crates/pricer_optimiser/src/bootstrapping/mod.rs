//! Discount curve bootstrapping from deposits, FRAs, futures and swaps.
//!
//! ## Architecture
//!
//! - [`Instrument`]: quoted market instruments, resolved into dated
//!   [`ResolvedInstrument`]s through a [`ConventionLayer`]
//! - [`CurveBuilder`]: sequential stripping engine producing a
//!   [`DiscountCurve`] that reprices every instrument
//! - [`BootstrapConfig`]: tolerances, interpolation and extrapolation
//! - [`CurveCache`]: caller-owned reuse of built curves keyed by
//!   [`Fingerprint`]
//!
//! [`ConventionLayer`]: pricer_core::conventions::ConventionLayer
//! [`DiscountCurve`]: pricer_core::market_data::curves::DiscountCurve

mod cache;
mod config;
mod engine;
mod instrument;
mod schedule;

pub use cache::{CurveCache, Fingerprint};
pub use config::BootstrapConfig;
pub use engine::{BootstrapResult, CurveBuilder};
pub use instrument::{AccrualPeriod, Frequency, Instrument, InstrumentKind, ResolvedInstrument};
