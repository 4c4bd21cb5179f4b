//! Model parameter sets.
//!
//! Only the Heston model is carried; the simulators in `pricer_pricing`
//! and the pricers in [`crate::analytical`] consume [`HestonParams`]
//! directly.

pub mod heston;

pub use heston::HestonParams;
