//! # Pricer Models (L2: Business Logic)
//!
//! Option pricing formulas and the Heston model.
//!
//! This crate provides:
//! - Black-76 prices, vegas and implied volatilities
//! - Garman-Kohlhagen FX pricing and delta-quoted smiles
//! - Heston parameters, characteristic function and semi-analytic pricer
//! - Heston calibration to implied-volatility smiles
//!
//! ## Design Principles
//!
//! - **Immutable inputs**: pricers and calibrators borrow smiles and curves
//! - **Typed failures**: every fallible call returns
//!   [`pricer_core::types::CalibrationError`]
//! - **Builder pattern** for configuration with sensible defaults

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod analytical;
pub mod calibration;
pub mod models;
