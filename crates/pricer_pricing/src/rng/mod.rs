//! # Random Number Generation
//!
//! Seeded streams for Monte Carlo simulation.
//!
//! Every path (or antithetic pair) owns one stream. The stream seed is
//! derived from the run seed and the stream index with [`splitmix64`], so a
//! path's draws never depend on how paths are spread across threads, and
//! neighbouring run seeds share no streams.
//!
//! ## Usage Example
//!
//! ```rust
//! use pricer_pricing::rng::PricerRng;
//!
//! let mut a = PricerRng::stream(42, 7);
//! let mut b = PricerRng::stream(42, 7);
//! assert_eq!(a.gen_normal(), b.gen_normal());
//!
//! let mut buffer = vec![0.0; 1000];
//! a.fill_normal(&mut buffer);
//! ```

mod prng;

pub use prng::PricerRng;

use rand::rngs::OsRng;
use rand::RngCore;

/// SplitMix64 finaliser.
///
/// A bijection on `u64` with full avalanche, so neighbouring stream indices
/// give unrelated seeds.
#[inline]
pub fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seed of stream `index` within a run seeded by `seed`.
///
/// The run seed is mixed before the index is added; combining them first
/// would map `(s, i)` and `(s ^ 1, i ^ 1)` to the same stream.
#[inline]
pub fn stream_seed(seed: u64, index: u64) -> u64 {
    splitmix64(splitmix64(seed).wrapping_add(index))
}

/// Fresh run seed from the operating system's entropy source.
pub fn entropy_seed() -> u64 {
    OsRng.next_u64()
}
