//! # Pricer Pricing (Layer 3: Simulation)
//!
//! Monte Carlo simulation driven by calibrated model parameters.
//!
//! - [`mc::HestonSimulator`]: Heston paths with full-truncation, reflection
//!   or quadratic-exponential variance steps
//! - [`mc::GbmSimulator`]: constant-volatility paths on the same grid
//! - [`mc::european_price`]: discounted payoff estimate with standard error
//! - [`rng`]: per-path random streams
//!
//! ## Reproducibility
//!
//! Each path (or antithetic pair) draws from its own stream, seeded from
//! the run seed and the stream index. A fixed seed therefore yields the
//! same paths whatever the size of the rayon pool.
//!
//! ## Usage Example
//!
//! ```rust
//! use pricer_core::market_data::{FlatCurve, OptionType};
//! use pricer_models::models::HestonParams;
//! use pricer_pricing::mc::{european_price, HestonSimulator, SimulationConfig};
//!
//! let curve = FlatCurve::new(0.02);
//! let params = HestonParams::new(0.04, 2.0, 0.04, 0.3, -0.7).unwrap();
//! let sim = HestonSimulator::new(SimulationConfig::default().with_antithetic(true));
//! let paths = sim.simulate(&params, &curve, 1.0, 4_000, 32, Some(7)).unwrap();
//! let call = european_price(&paths, 100.0, OptionType::Call, &curve).unwrap();
//! assert!(call.price > 0.0 && call.std_error > 0.0);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod mc;
pub mod rng;
