//! Fingerprint-keyed cache of bootstrapped curves.
//!
//! The cache is an ordinary value owned by the caller; there is no global
//! state. Building the same instrument set twice yields identical curves, so
//! a curve can be reused whenever its [`Fingerprint`] matches.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use pricer_core::conventions::ConventionLayer;
use pricer_core::market_data::curves::{DiscountCurve, Extrapolation};
use pricer_core::types::{CalibrationError, Date, Tenor, TenorUnit};
use tracing::debug;

use super::config::BootstrapConfig;
use super::engine::CurveBuilder;
use super::instrument::Instrument;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a over explicit byte encodings, stable across runs and builds.
struct FnvHasher(u64);

impl FnvHasher {
    fn new() -> Self {
        Self(FNV_OFFSET)
    }

    fn bytes(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.0 ^= u64::from(*b);
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }

    fn u64(&mut self, v: u64) {
        self.bytes(&v.to_le_bytes());
    }

    fn f64(&mut self, v: f64) {
        // +0.0 and -0.0 quote the same rate
        let v = if v == 0.0 { 0.0 } else { v };
        self.u64(v.to_bits());
    }

    fn str(&mut self, s: &str) {
        self.u64(s.len() as u64);
        self.bytes(s.as_bytes());
    }

    fn tenor(&mut self, t: Tenor) {
        self.u64(u64::from(t.count));
        let unit = match t.unit {
            TenorUnit::Days => 0,
            TenorUnit::Weeks => 1,
            TenorUnit::Months => 2,
            TenorUnit::Years => 3,
        };
        self.u64(unit);
    }
}

/// 64-bit identity of a curve build request.
///
/// Covers every instrument field (floats by bit pattern), the valuation date
/// and every configuration field that affects the result. The calendar is
/// not covered: callers mixing calendars add a tag with
/// [`Fingerprint::with_tag`].
///
/// # Example
///
/// ```
/// use pricer_core::types::{Date, Tenor};
/// use pricer_optimiser::bootstrapping::{BootstrapConfig, Fingerprint, Instrument};
///
/// let val = Date::from_ymd(2025, 1, 1).unwrap();
/// let cfg = BootstrapConfig::default();
/// let a = Fingerprint::of(&[Instrument::deposit(Tenor::years(1), 0.05)], val, &cfg);
/// let b = Fingerprint::of(&[Instrument::deposit(Tenor::years(1), 0.0500001)], val, &cfg);
/// assert_ne!(a, b);
/// assert_eq!(a, Fingerprint::of(&[Instrument::deposit(Tenor::years(1), 0.05)], val, &cfg));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    /// Fingerprint of a build request.
    pub fn of(instruments: &[Instrument], valuation: Date, config: &BootstrapConfig) -> Self {
        let mut h = FnvHasher::new();
        h.str(&valuation.to_string());

        h.u64(instruments.len() as u64);
        for inst in instruments {
            h.str(&inst.kind().to_string());
            h.str(inst.day_count().name());
            match *inst {
                Instrument::Deposit { tenor, rate, .. } => {
                    h.tenor(tenor);
                    h.f64(rate);
                }
                Instrument::Fra {
                    start, end, rate, ..
                } => {
                    h.tenor(start);
                    h.tenor(end);
                    h.f64(rate);
                }
                Instrument::Future {
                    start,
                    end,
                    price,
                    convexity_adjustment,
                    ..
                } => {
                    h.tenor(start);
                    h.tenor(end);
                    h.f64(price);
                    h.f64(convexity_adjustment);
                }
                Instrument::Swap {
                    tenor,
                    rate,
                    fixed_frequency,
                    ..
                } => {
                    h.tenor(tenor);
                    h.f64(rate);
                    h.u64(u64::from(fixed_frequency.months()));
                }
            }
        }

        h.f64(config.tolerance);
        h.u64(config.max_iterations as u64);
        h.str(config.interpolation.name());
        h.u64(match config.extrapolation {
            Extrapolation::None => 0,
            Extrapolation::FlatForward => 1,
        });
        h.u64(u64::from(config.allow_negative_rates));
        h.u64(config.max_passes as u64);
        h.f64(config.max_maturity);
        h.u64(u64::from(config.spot_lag));
        h.str(config.business_day_convention.name());
        Fingerprint(h.0)
    }

    /// Mix a caller-chosen tag (e.g. a calendar name) into the fingerprint.
    pub fn with_tag(self, tag: &str) -> Self {
        let mut h = FnvHasher(self.0);
        h.str(tag);
        Fingerprint(h.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Caller-owned map from [`Fingerprint`] to a shared, read-only curve.
///
/// Builder errors are returned to the caller and never cached.
///
/// # Example
///
/// ```
/// use pricer_core::conventions::NullCalendar;
/// use pricer_core::types::{Date, Tenor};
/// use pricer_optimiser::bootstrapping::{BootstrapConfig, CurveBuilder, CurveCache, Instrument};
///
/// let builder = CurveBuilder::new(BootstrapConfig::default(), Date::from_ymd(2025, 1, 1).unwrap());
/// let quotes = [Instrument::deposit(Tenor::years(1), 0.05)];
/// let mut cache = CurveCache::new();
///
/// let a = cache.get_or_bootstrap(&builder, &quotes, &NullCalendar).unwrap();
/// let b = cache.get_or_bootstrap(&builder, &quotes, &NullCalendar).unwrap();
/// assert!(std::sync::Arc::ptr_eq(&a, &b));
/// assert_eq!((cache.hits(), cache.misses()), (1, 1));
/// ```
#[derive(Debug, Default)]
pub struct CurveCache {
    entries: HashMap<Fingerprint, Arc<DiscountCurve>>,
    hits: u64,
    misses: u64,
}

impl CurveCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached curve for `fingerprint`, or the result of `build`.
    pub fn get_or_build<F>(
        &mut self,
        fingerprint: Fingerprint,
        build: F,
    ) -> Result<Arc<DiscountCurve>, CalibrationError>
    where
        F: FnOnce() -> Result<DiscountCurve, CalibrationError>,
    {
        if let Some(curve) = self.entries.get(&fingerprint) {
            self.hits += 1;
            debug!(%fingerprint, "curve cache hit");
            return Ok(Arc::clone(curve));
        }
        self.misses += 1;
        debug!(%fingerprint, "curve cache miss");
        let curve = Arc::new(build()?);
        self.entries.insert(fingerprint, Arc::clone(&curve));
        Ok(curve)
    }

    /// Fingerprint the request and bootstrap on a miss.
    pub fn get_or_bootstrap(
        &mut self,
        builder: &CurveBuilder,
        instruments: &[Instrument],
        conventions: &dyn ConventionLayer,
    ) -> Result<Arc<DiscountCurve>, CalibrationError> {
        let fp = Fingerprint::of(instruments, builder.valuation(), builder.config());
        self.get_or_build(fp, || Ok(builder.build(instruments, conventions)?.curve))
    }

    /// Cached curve, without counting a hit or miss.
    pub fn get(&self, fingerprint: Fingerprint) -> Option<Arc<DiscountCurve>> {
        self.entries.get(&fingerprint).cloned()
    }

    /// Store a curve, returning the one it replaced.
    pub fn insert(&mut self, fingerprint: Fingerprint, curve: DiscountCurve) -> Option<Arc<DiscountCurve>> {
        self.entries.insert(fingerprint, Arc::new(curve))
    }

    /// Drop one entry. Returns whether it was present.
    pub fn invalidate(&mut self, fingerprint: Fingerprint) -> bool {
        self.entries.remove(&fingerprint).is_some()
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached curves.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no curves.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookups served from the cache.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Lookups that required a build.
    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricer_core::conventions::NullCalendar;
    use pricer_core::market_data::curves::Interpolation;
    use pricer_core::types::ErrorLocation;

    fn val() -> Date {
        Date::from_ymd(2025, 1, 1).unwrap()
    }

    fn quotes() -> Vec<Instrument> {
        vec![
            Instrument::deposit(Tenor::months(6), 0.03),
            Instrument::swap(Tenor::years(2), 0.032),
        ]
    }

    // ========================================
    // Fingerprint Tests
    // ========================================

    #[test]
    fn test_fingerprint_sensitivity() {
        let cfg = BootstrapConfig::default();
        let base = Fingerprint::of(&quotes(), val(), &cfg);

        let other_day = Fingerprint::of(&quotes(), Date::from_ymd(2025, 1, 2).unwrap(), &cfg);
        assert_ne!(base, other_day);

        let cubic = cfg.clone().with_interpolation(Interpolation::CubicLogDiscount);
        assert_ne!(base, Fingerprint::of(&quotes(), val(), &cubic));

        let mut reordered = quotes();
        reordered.swap(0, 1);
        assert_ne!(base, Fingerprint::of(&reordered, val(), &cfg));

        assert_ne!(base, base.with_tag("TARGET"));
    }

    #[test]
    fn test_fingerprint_ignores_time_budget_and_signed_zero() {
        let cfg = BootstrapConfig::default();
        let budget = cfg.clone().with_time_budget(std::time::Duration::from_secs(1));
        assert_eq!(Fingerprint::of(&quotes(), val(), &cfg), Fingerprint::of(&quotes(), val(), &budget));

        let pos = [Instrument::deposit(Tenor::years(1), 0.0)];
        let neg = [Instrument::deposit(Tenor::years(1), -0.0)];
        assert_eq!(Fingerprint::of(&pos, val(), &cfg), Fingerprint::of(&neg, val(), &cfg));
    }

    // ========================================
    // Cache Tests
    // ========================================

    #[test]
    fn test_hit_miss_and_invalidate() {
        let builder = CurveBuilder::new(BootstrapConfig::default(), val());
        let mut cache = CurveCache::new();
        let fp = Fingerprint::of(&quotes(), val(), builder.config());

        let first = cache.get_or_bootstrap(&builder, &quotes(), &NullCalendar).unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.get(fp).is_some());

        let second = cache.get_or_bootstrap(&builder, &quotes(), &NullCalendar).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        assert!(cache.invalidate(fp));
        assert!(!cache.invalidate(fp));
        let third = cache.get_or_bootstrap(&builder, &quotes(), &NullCalendar).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(*first, *third);
        assert_eq!((cache.hits(), cache.misses()), (1, 2));

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_errors_are_not_cached() {
        let mut cache = CurveCache::new();
        let fp = Fingerprint(42);
        let err = cache
            .get_or_build(fp, || {
                Err(CalibrationError::invalid_input(ErrorLocation::Input, "boom"))
            })
            .unwrap_err();
        assert_eq!(err.location(), Some(ErrorLocation::Input));
        assert!(cache.is_empty());
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_insert_replaces() {
        let curve = CurveBuilder::new(BootstrapConfig::default(), val())
            .build(&quotes(), &NullCalendar)
            .unwrap()
            .curve;
        let mut cache = CurveCache::new();
        assert!(cache.insert(Fingerprint(1), curve.clone()).is_none());
        assert!(cache.insert(Fingerprint(1), curve).is_some());
        assert_eq!(cache.len(), 1);
    }
}
