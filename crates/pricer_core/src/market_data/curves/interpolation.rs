//! Pillar interpolation rules shared by curve construction and curve queries.

use std::fmt;
use std::str::FromStr;

use super::YieldCurve;
use crate::math::interpolators::{CubicSplineInterpolator, Interpolator, LinearInterpolator};
use crate::types::{CalibrationError, InterpolationError};

/// Interpolation rule between discount-factor pillars.
///
/// The rule is fixed when a curve is built. The bootstrapper evaluates trial
/// curves through exactly the same [`PillarInterpolator`] that the finished
/// curve uses for queries, so a pillar solved against one rule reprices under
/// the same rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Interpolation {
    /// Linear in `ln D(t)`. Piecewise-flat instantaneous forwards.
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "log_linear", alias = "LogLinear"))]
    LogLinear,
    /// Linear in the continuously compounded zero rate. The zero rate is held
    /// flat between `t = 0` and the first pillar.
    #[cfg_attr(feature = "serde", serde(rename = "linear_zero", alias = "LinearZero"))]
    LinearZero,
    /// Natural cubic spline on `ln D(t)`. Moving one pillar changes the curve
    /// between every pair of pillars.
    #[cfg_attr(
        feature = "serde",
        serde(rename = "cubic_log_discount", alias = "CubicLogDiscount")
    )]
    CubicLogDiscount,
}

impl Interpolation {
    /// Whether each segment depends only on its two end pillars.
    ///
    /// Non-local rules need repeated bootstrap sweeps.
    pub fn is_local(&self) -> bool {
        !matches!(self, Interpolation::CubicLogDiscount)
    }

    /// Lower-case name used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            Interpolation::LogLinear => "log_linear",
            Interpolation::LinearZero => "linear_zero",
            Interpolation::CubicLogDiscount => "cubic_log_discount",
        }
    }

    /// Build the evaluator over `(times, log_dfs)`.
    ///
    /// `times` must start at `0.0` with `log_dfs[0] == 0.0` and be strictly
    /// increasing; at least one pillar beyond zero is required.
    pub fn build(&self, times: &[f64], log_dfs: &[f64]) -> Result<PillarInterpolator, InterpolationError> {
        if times.len() != log_dfs.len() {
            return Err(InterpolationError::InvalidInput(format!(
                "times and log discount factors differ in length: {} vs {}",
                times.len(),
                log_dfs.len()
            )));
        }
        if times.len() < 2 {
            return Err(InterpolationError::InsufficientData {
                got: times.len(),
                need: 2,
            });
        }
        if times[0] != 0.0 || log_dfs[0] != 0.0 {
            return Err(InterpolationError::InvalidInput(
                "first pillar must be (0, 1)".to_string(),
            ));
        }

        let kind = match self {
            Interpolation::LogLinear => Kernel::LogLinear(LinearInterpolator::new(times, log_dfs)?),
            Interpolation::CubicLogDiscount => {
                Kernel::Cubic(CubicSplineInterpolator::new(times, log_dfs)?)
            }
            Interpolation::LinearZero => {
                // zero rates are undefined at t = 0, so knots start at the first pillar
                let ts = &times[1..];
                let zs: Vec<f64> = ts
                    .iter()
                    .zip(&log_dfs[1..])
                    .map(|(&t, &ld)| -ld / t)
                    .collect();
                if ts.len() == 1 {
                    if !zs[0].is_finite() {
                        return Err(InterpolationError::InvalidInput(
                            "knots must be finite".to_string(),
                        ));
                    }
                    Kernel::FlatZero(zs[0])
                } else {
                    Kernel::LinearZero(LinearInterpolator::new(ts, &zs)?)
                }
            }
        };

        let n = times.len();
        let last_forward = -(log_dfs[n - 1] - log_dfs[n - 2]) / (times[n - 1] - times[n - 2]);

        Ok(PillarInterpolator {
            kind,
            t_max: times[n - 1],
            log_df_max: log_dfs[n - 1],
            last_forward,
        })
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Interpolation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "log_linear" | "loglinear" => Ok(Interpolation::LogLinear),
            "linear_zero" | "linearzero" => Ok(Interpolation::LinearZero),
            "cubic_log_discount" | "cubiclogdiscount" | "cubic" => {
                Ok(Interpolation::CubicLogDiscount)
            }
            other => Err(format!("unknown interpolation '{}'", other)),
        }
    }
}

/// Rounding allowance on instantaneous forwards.
const FORWARD_ROUNDING: f64 = 1e-12;

#[derive(Debug, Clone)]
enum Kernel {
    LogLinear(LinearInterpolator<f64>),
    LinearZero(LinearInterpolator<f64>),
    FlatZero(f64),
    Cubic(CubicSplineInterpolator<f64>),
}

/// Evaluator for one set of pillars under one [`Interpolation`] rule.
#[derive(Debug, Clone)]
pub struct PillarInterpolator {
    kind: Kernel,
    t_max: f64,
    log_df_max: f64,
    last_forward: f64,
}

impl PillarInterpolator {
    /// `ln D(t)` for `t` in `[0, t_max]`.
    pub fn log_discount(&self, t: f64) -> Result<f64, InterpolationError> {
        if !(0.0..=self.t_max).contains(&t) {
            return Err(InterpolationError::OutOfBounds {
                x: t,
                min: 0.0,
                max: self.t_max,
            });
        }
        match &self.kind {
            Kernel::LogLinear(li) => li.interpolate(t),
            Kernel::Cubic(cs) => cs.interpolate(t),
            Kernel::FlatZero(z) => Ok(-z * t),
            Kernel::LinearZero(li) => {
                let (lo, _) = li.domain();
                let z = if t <= lo { li.interpolate(lo)? } else { li.interpolate(t)? };
                Ok(-z * t)
            }
        }
    }

    /// `ln D(t)` beyond the last pillar with the last segment's average
    /// forward held flat.
    pub fn log_discount_flat_forward(&self, t: f64) -> Result<f64, InterpolationError> {
        if t <= self.t_max {
            return self.log_discount(t);
        }
        Ok(self.log_df_max - self.last_forward * (t - self.t_max))
    }

    /// Smallest instantaneous forward `-d ln D / dt` on `[0, t_max]`, as
    /// `(t, forward)`.
    ///
    /// Exact for every rule: log-linear forwards are flat per segment, the
    /// linear-zero forward `z + t z'` is linear per segment and the spline
    /// forward is quadratic per segment.
    pub fn min_forward(&self) -> (f64, f64) {
        match &self.kind {
            Kernel::LogLinear(li) => {
                let mut worst = (self.t_max, f64::INFINITY);
                for (t, y) in li.xs().windows(2).zip(li.ys().windows(2)) {
                    let forward = -(y[1] - y[0]) / (t[1] - t[0]);
                    if forward < worst.1 {
                        worst = (t[1], forward);
                    }
                }
                worst
            }
            Kernel::FlatZero(z) => (self.t_max, *z),
            Kernel::LinearZero(li) => {
                let (ts, zs) = (li.xs(), li.ys());
                // flat zero rate up to the first knot
                let mut worst = (ts[0], zs[0]);
                for (t, z) in ts.windows(2).zip(zs.windows(2)) {
                    let slope = (z[1] - z[0]) / (t[1] - t[0]);
                    for (tk, zk) in [(t[0], z[0]), (t[1], z[1])] {
                        let forward = zk + tk * slope;
                        if forward < worst.1 {
                            worst = (tk, forward);
                        }
                    }
                }
                worst
            }
            Kernel::Cubic(cs) => {
                let (t, slope) = cs.max_derivative();
                (t, -slope)
            }
        }
    }

    /// Where the curve rises between pillars, as `(t, forward)`.
    ///
    /// Forwards above `-FORWARD_ROUNDING` count as non-negative, which keeps
    /// exactly flat segments valid under every rule.
    pub fn negative_forward(&self) -> Option<(f64, f64)> {
        let (t, forward) = self.min_forward();
        (forward < -FORWARD_ROUNDING).then_some((t, forward))
    }

    /// Last pillar time.
    pub fn t_max(&self) -> f64 {
        self.t_max
    }

    /// Continuously compounded forward over the last pillar segment.
    pub fn last_forward(&self) -> f64 {
        self.last_forward
    }
}

/// Read-only view used for trial curves while pillars are being solved.
///
/// No monotonicity check is applied, so a root-finder can try any
/// positive discount factor.
impl YieldCurve for PillarInterpolator {
    fn discount_factor(&self, t: f64) -> Result<f64, CalibrationError> {
        Ok(self.log_discount(t)?.exp())
    }

    fn max_time(&self) -> f64 {
        self.t_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pillars() -> (Vec<f64>, Vec<f64>) {
        let times = vec![0.0, 0.5, 1.0, 2.0, 5.0];
        let zeros = [0.03, 0.032, 0.035, 0.04];
        let mut lds = vec![0.0];
        lds.extend(times[1..].iter().zip(zeros).map(|(t, z)| -z * t));
        (times, lds)
    }

    // ========================================
    // Knot Reproduction Tests
    // ========================================

    #[test]
    fn test_all_rules_hit_pillars() {
        let (times, lds) = pillars();
        for rule in [
            Interpolation::LogLinear,
            Interpolation::LinearZero,
            Interpolation::CubicLogDiscount,
        ] {
            let p = rule.build(&times, &lds).unwrap();
            for (t, ld) in times.iter().zip(&lds) {
                assert_relative_eq!(p.log_discount(*t).unwrap(), *ld, epsilon = 1e-14);
            }
        }
    }

    #[test]
    fn test_log_linear_forward_is_piecewise_flat() {
        let (times, lds) = pillars();
        let p = Interpolation::LogLinear.build(&times, &lds).unwrap();
        let f1 = -(p.log_discount(1.25).unwrap() - p.log_discount(1.1).unwrap()) / 0.15;
        let f2 = -(p.log_discount(1.9).unwrap() - p.log_discount(1.5).unwrap()) / 0.4;
        assert_relative_eq!(f1, f2, epsilon = 1e-12);
    }

    #[test]
    fn test_linear_zero_flat_before_first_pillar() {
        let (times, lds) = pillars();
        let p = Interpolation::LinearZero.build(&times, &lds).unwrap();
        assert_relative_eq!(p.log_discount(0.25).unwrap(), -0.03 * 0.25, epsilon = 1e-15);
        assert_eq!(p.log_discount(0.0).unwrap(), 0.0);
        // halfway between 1.0 (3.2%) and 2.0 (3.5%)
        assert_relative_eq!(p.log_discount(1.5).unwrap(), -0.0335 * 1.5, epsilon = 1e-14);
    }

    #[test]
    fn test_linear_zero_single_pillar() {
        let p = Interpolation::LinearZero
            .build(&[0.0, 1.0], &[0.0, -0.05])
            .unwrap();
        assert_relative_eq!(p.log_discount(0.5).unwrap(), -0.025, epsilon = 1e-15);
    }

    // ========================================
    // Domain Tests
    // ========================================

    // ========================================
    // Forward Tests
    // ========================================

    /// Steep short end, flat long end: every pillar DF still decreases.
    fn inverted() -> (Vec<f64>, Vec<f64>) {
        (vec![0.0, 1.0, 10.0], vec![0.0, (1.0f64 / 1.105).ln(), (1.0f64 / 1.22).ln()])
    }

    #[test]
    fn test_min_forward_of_upward_curve_is_positive() {
        let (times, lds) = pillars();
        for rule in [
            Interpolation::LogLinear,
            Interpolation::LinearZero,
            Interpolation::CubicLogDiscount,
        ] {
            let (_, forward) = rule.build(&times, &lds).unwrap().min_forward();
            assert!(forward > 0.0, "{}: {}", rule, forward);
        }
    }

    #[test]
    fn test_min_forward_finds_rise_between_pillars() {
        let (times, lds) = inverted();
        for rule in [Interpolation::LinearZero, Interpolation::CubicLogDiscount] {
            let curve = rule.build(&times, &lds).unwrap();
            let (t, forward) = curve.min_forward();
            assert!(forward < 0.0, "{}: {}", rule, forward);
            assert!(t > 1.0 && t <= 10.0, "{}: t = {}", rule, t);
            // the curve really rises there
            let before = curve.log_discount(t - 0.05).unwrap();
            let at = curve.log_discount(t).unwrap();
            assert!(at > before, "{}", rule);
        }
        let (_, forward) = Interpolation::LogLinear.build(&times, &lds).unwrap().min_forward();
        assert!(forward > 0.0);
    }

    #[test]
    fn test_linear_zero_min_forward_matches_finite_difference() {
        let (times, lds) = inverted();
        let curve = Interpolation::LinearZero.build(&times, &lds).unwrap();
        let (t, forward) = curve.min_forward();
        let h = 1e-6;
        let fd = -(curve.log_discount(t).unwrap() - curve.log_discount(t - h).unwrap()) / h;
        assert_relative_eq!(forward, fd, max_relative = 1e-4);
    }

    #[test]
    fn test_out_of_bounds() {
        let (times, lds) = pillars();
        let p = Interpolation::LogLinear.build(&times, &lds).unwrap();
        assert!(matches!(
            p.log_discount(5.5),
            Err(InterpolationError::OutOfBounds { .. })
        ));
        assert!(p.log_discount(-1e-9).is_err());
    }

    #[test]
    fn test_flat_forward_extension() {
        let (times, lds) = pillars();
        let p = Interpolation::LogLinear.build(&times, &lds).unwrap();
        let f = p.last_forward();
        assert_relative_eq!(f, -(lds[4] - lds[3]) / 3.0, epsilon = 1e-15);
        assert_relative_eq!(
            p.log_discount_flat_forward(7.0).unwrap(),
            lds[4] - 2.0 * f,
            epsilon = 1e-14
        );
        assert!(p.log_discount_flat_forward(-1.0).is_err());
    }

    #[test]
    fn test_build_rejects_bad_pillars() {
        assert!(Interpolation::LogLinear.build(&[0.0], &[0.0]).is_err());
        assert!(Interpolation::LogLinear.build(&[0.5, 1.0], &[-0.01, -0.02]).is_err());
        assert!(Interpolation::LogLinear
            .build(&[0.0, 1.0, 1.0], &[0.0, -0.02, -0.03])
            .is_err());
    }

    #[test]
    fn test_trial_curve_view() {
        let p = Interpolation::LogLinear.build(&[0.0, 1.0], &[0.0, -0.05]).unwrap();
        assert_relative_eq!(p.discount_factor(1.0).unwrap(), (-0.05f64).exp(), epsilon = 1e-15);
        assert!(p.discount_factor(1.5).is_err());
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("cubic".parse::<Interpolation>().unwrap(), Interpolation::CubicLogDiscount);
        assert_eq!("Log-Linear".parse::<Interpolation>().unwrap(), Interpolation::LogLinear);
        assert_eq!(Interpolation::LinearZero.to_string(), "linear_zero");
        assert!("spline".parse::<Interpolation>().is_err());
        assert!(!Interpolation::CubicLogDiscount.is_local());
    }
}
