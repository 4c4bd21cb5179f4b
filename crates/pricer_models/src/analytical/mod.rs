//! Analytical and semi-analytic European option pricers.
//!
//! - [`black`]: Black-76 on the forward, vega, implied volatility
//! - [`garman_kohlhagen`]: FX options, forward-delta strikes, delta-quoted smiles
//! - [`heston`]: Lewis-integral Heston prices
//! - [`distributions`]: standard normal pdf, cdf and quantile

pub mod black;
pub mod distributions;
pub mod garman_kohlhagen;
pub mod heston;

pub use black::{black_price, black_vega, implied_volatility};
pub use distributions::{inverse_norm_cdf, norm_cdf, norm_pdf};
pub use garman_kohlhagen::{
    smile_from_forward_deltas, strike_from_forward_delta, GarmanKohlhagen, GarmanKohlhagenParams,
};
pub use heston::HestonPricer;
