//! Pillar-based discount curve.

use super::interpolation::{Interpolation, PillarInterpolator};
use super::YieldCurve;
use crate::types::{CalibrationError, ErrorLocation};

/// Behaviour of a curve queried beyond its last pillar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Extrapolation {
    /// Queries past the last pillar fail with `OutOfRange`.
    #[default]
    None,
    /// The last segment's forward rate is held flat past the last pillar.
    FlatForward,
}

/// Construction options of a [`DiscountCurve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CurveOptions {
    /// Extrapolation mode past the last pillar.
    pub extrapolation: Extrapolation,
    /// Accept increasing discount factors (negative forward rates).
    pub allow_negative_rates: bool,
}

impl CurveOptions {
    /// Opt in to flat-forward extrapolation.
    pub fn with_extrapolation(mut self, extrapolation: Extrapolation) -> Self {
        self.extrapolation = extrapolation;
        self
    }

    /// Allow or forbid negative forward rates.
    pub fn with_negative_rates(mut self, allow: bool) -> Self {
        self.allow_negative_rates = allow;
        self
    }
}

/// Plain pillar data of a [`DiscountCurve`], used for serialisation and
/// reporting.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurveSnapshot {
    /// Pillar times in years, starting at `0.0`.
    pub times: Vec<f64>,
    /// Discount factors at the pillar times, starting at `1.0`.
    pub discount_factors: Vec<f64>,
    /// Interpolation rule.
    #[cfg_attr(feature = "serde", serde(default))]
    pub interpolation: Interpolation,
    /// Construction options.
    #[cfg_attr(feature = "serde", serde(default))]
    pub options: CurveOptions,
}

/// Immutable discount curve over ordered pillars `(t_i, D_i)`.
///
/// The pillar `(0, 1)` is always present. A curve never changes after
/// construction, so it is shared freely across threads.
///
/// # Example
///
/// ```
/// use pricer_core::market_data::curves::{
///     CurveOptions, DiscountCurve, Extrapolation, Interpolation, YieldCurve,
/// };
///
/// let curve = DiscountCurve::from_pillars(
///     &[1.0, 2.0],
///     &[0.96, 0.92],
///     Interpolation::LogLinear,
///     CurveOptions::default(),
/// )
/// .unwrap();
/// assert_eq!(curve.discount_factor(0.0).unwrap(), 1.0);
/// assert!((curve.discount_factor(1.0).unwrap() - 0.96).abs() < 1e-15);
/// assert!(curve.discount_factor(3.0).is_err());
///
/// let extended = curve.with_options(
///     CurveOptions::default().with_extrapolation(Extrapolation::FlatForward),
/// ).unwrap();
/// assert!(extended.discount_factor(3.0).unwrap() < 0.92);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "CurveSnapshot", into = "CurveSnapshot"))]
pub struct DiscountCurve {
    times: Vec<f64>,
    dfs: Vec<f64>,
    interpolation: Interpolation,
    options: CurveOptions,
    interpolator: PillarInterpolator,
}

impl DiscountCurve {
    /// Build a curve from pivots that include `(0, 1)` as the first entry.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for mismatched lengths, a missing `(0, 1)` pivot,
    ///   non-finite or non-increasing times
    /// - `DomainViolation` for non-positive discount factors, or when
    ///   negative rates are not allowed and the interpolated curve rises
    ///   anywhere, at a pillar or between two
    pub fn new(
        times: &[f64],
        dfs: &[f64],
        interpolation: Interpolation,
        options: CurveOptions,
    ) -> Result<Self, CalibrationError> {
        validate_pivots(times, dfs, options)?;
        let log_dfs: Vec<f64> = dfs.iter().map(|d| d.ln()).collect();
        let interpolator = interpolation.build(times, &log_dfs)?;
        if !options.allow_negative_rates {
            if let Some((t, forward)) = interpolator.negative_forward() {
                return Err(CalibrationError::domain_violation(
                    ErrorLocation::Pillar(t),
                    format!(
                        "{} interpolation rises between pillars: forward {:.6e} at t = {:.6}",
                        interpolation, forward, t
                    ),
                ));
            }
        }
        Ok(Self {
            times: times.to_vec(),
            dfs: dfs.to_vec(),
            interpolation,
            options,
            interpolator,
        })
    }

    /// Build a curve from pillars strictly after `t = 0`; `(0, 1)` is prepended.
    pub fn from_pillars(
        times: &[f64],
        dfs: &[f64],
        interpolation: Interpolation,
        options: CurveOptions,
    ) -> Result<Self, CalibrationError> {
        let mut all_t = Vec::with_capacity(times.len() + 1);
        let mut all_d = Vec::with_capacity(dfs.len() + 1);
        all_t.push(0.0);
        all_d.push(1.0);
        all_t.extend_from_slice(times);
        all_d.extend_from_slice(dfs);
        Self::new(&all_t, &all_d, interpolation, options)
    }

    /// Same pivots with different options.
    pub fn with_options(&self, options: CurveOptions) -> Result<Self, CalibrationError> {
        Self::new(&self.times, &self.dfs, self.interpolation, options)
    }

    /// Pivot times, starting at `0.0`.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Pivot discount factors, starting at `1.0`.
    pub fn discount_factors(&self) -> &[f64] {
        &self.dfs
    }

    /// `(t_i, D_i)` pivots in order.
    pub fn pillars(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.times.iter().copied().zip(self.dfs.iter().copied())
    }

    /// Interpolation rule.
    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Construction options.
    pub fn options(&self) -> CurveOptions {
        self.options
    }

    /// Owned copy of the pillar data.
    pub fn snapshot(&self) -> CurveSnapshot {
        CurveSnapshot {
            times: self.times.clone(),
            discount_factors: self.dfs.clone(),
            interpolation: self.interpolation,
            options: self.options,
        }
    }

    fn last_time(&self) -> f64 {
        self.interpolator.t_max()
    }
}

impl PartialEq for DiscountCurve {
    fn eq(&self, other: &Self) -> bool {
        self.times == other.times
            && self.dfs == other.dfs
            && self.interpolation == other.interpolation
            && self.options == other.options
    }
}

impl YieldCurve for DiscountCurve {
    fn discount_factor(&self, t: f64) -> Result<f64, CalibrationError> {
        let t_max = self.last_time();
        if !(t >= 0.0) {
            return Err(CalibrationError::out_of_range(t, 0.0, t_max));
        }
        let ld = if t <= t_max {
            self.interpolator.log_discount(t)?
        } else {
            match self.options.extrapolation {
                Extrapolation::None => {
                    return Err(CalibrationError::out_of_range(t, 0.0, t_max));
                }
                Extrapolation::FlatForward => self.interpolator.log_discount_flat_forward(t)?,
            }
        };
        Ok(ld.exp())
    }

    fn max_time(&self) -> f64 {
        match self.options.extrapolation {
            Extrapolation::None => self.last_time(),
            Extrapolation::FlatForward => f64::INFINITY,
        }
    }
}

impl From<DiscountCurve> for CurveSnapshot {
    fn from(curve: DiscountCurve) -> Self {
        CurveSnapshot {
            times: curve.times,
            discount_factors: curve.dfs,
            interpolation: curve.interpolation,
            options: curve.options,
        }
    }
}

impl TryFrom<CurveSnapshot> for DiscountCurve {
    type Error = CalibrationError;

    fn try_from(s: CurveSnapshot) -> Result<Self, Self::Error> {
        DiscountCurve::new(&s.times, &s.discount_factors, s.interpolation, s.options)
    }
}

fn validate_pivots(times: &[f64], dfs: &[f64], options: CurveOptions) -> Result<(), CalibrationError> {
    if times.len() != dfs.len() {
        return Err(CalibrationError::invalid_input(
            ErrorLocation::Input,
            format!("{} times but {} discount factors", times.len(), dfs.len()),
        ));
    }
    if times.len() < 2 {
        return Err(CalibrationError::invalid_input(
            ErrorLocation::Input,
            "a curve needs at least one pillar after t = 0",
        ));
    }
    if times[0] != 0.0 || dfs[0] != 1.0 {
        return Err(CalibrationError::invalid_input(
            ErrorLocation::Pillar(times[0]),
            "first pivot must be (0, 1)",
        ));
    }
    for (i, w) in times.windows(2).enumerate() {
        if !w[1].is_finite() || !(w[1] > w[0]) {
            return Err(CalibrationError::invalid_input(
                ErrorLocation::Pillar(w[1]),
                format!("pivot times must be finite and strictly increasing at index {}", i + 1),
            ));
        }
    }
    for (&t, &d) in times.iter().zip(dfs) {
        if !d.is_finite() || d <= 0.0 {
            return Err(CalibrationError::domain_violation(
                ErrorLocation::Pillar(t),
                format!("discount factor {} is not positive", d),
            ));
        }
    }
    if !options.allow_negative_rates {
        for (w, t) in dfs.windows(2).zip(&times[1..]) {
            if w[1] > w[0] {
                return Err(CalibrationError::domain_violation(
                    ErrorLocation::Pillar(*t),
                    format!("discount factor rises from {} to {}", w[0], w[1]),
                ));
            }
        }
    }
    Ok(())
}
