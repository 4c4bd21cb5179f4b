//! Standard normal distribution functions.
//!
//! - [`norm_cdf`]: cumulative distribution function
//! - [`norm_pdf`]: probability density function
//! - [`inverse_norm_cdf`]: quantile function
//!
//! The density and the CDF are generic over `T: Float` so they can be
//! evaluated in `f32` for bulk work; the quantile is `f64` only.

use num_traits::Float;

/// 1 / sqrt(2 * pi)
const FRAC_1_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

#[inline]
fn lit<T: Float>(x: f64) -> T {
    T::from(x).unwrap_or_else(T::nan)
}

/// Complementary error function.
///
/// Chebyshev fit from Numerical Recipes (`erfcc`), fractional error below
/// 1.2e-7 everywhere, so deep tails keep their relative accuracy.
///
/// # Mathematical Definition
/// erfc(x) = 1 - erf(x) = (2/√π) ∫_x^∞ e^(-t²) dt
#[inline]
fn erfc<T: Float>(x: T) -> T {
    let one = T::one();
    let z = x.abs();
    let t = one / (one + lit::<T>(0.5) * z);

    let poly = lit::<T>(-1.265_512_23)
        + t * (lit::<T>(1.000_023_68)
            + t * (lit::<T>(0.374_091_96)
                + t * (lit::<T>(0.096_784_18)
                    + t * (lit::<T>(-0.186_288_06)
                        + t * (lit::<T>(0.278_868_07)
                            + t * (lit::<T>(-1.135_203_98)
                                + t * (lit::<T>(1.488_515_87)
                                    + t * (lit::<T>(-0.822_152_23)
                                        + t * lit::<T>(0.170_872_77)))))))));

    let ans = t * (-z * z + poly).exp();
    if x < T::zero() {
        lit::<T>(2.0) - ans
    } else {
        ans
    }
}

/// Standard normal cumulative distribution function.
///
/// Computes P(X <= x) where X ~ N(0, 1).
///
/// # Mathematical Definition
/// Φ(x) = (1/2) * erfc(-x / sqrt(2))
///
/// # Examples
/// ```
/// use pricer_models::analytical::distributions::norm_cdf;
///
/// let cdf_0 = norm_cdf(0.0_f64);
/// assert!((cdf_0 - 0.5).abs() < 1e-7);
///
/// assert!(norm_cdf(-3.0_f64) < 0.01);
/// assert!(norm_cdf(3.0_f64) > 0.99);
/// ```
#[inline]
pub fn norm_cdf<T: Float>(x: T) -> T {
    lit::<T>(0.5) * erfc(-x / lit::<T>(std::f64::consts::SQRT_2))
}

/// Standard normal probability density function.
///
/// # Mathematical Definition
/// φ(x) = (1 / sqrt(2π)) * exp(-x² / 2)
///
/// # Examples
/// ```
/// use pricer_models::analytical::distributions::norm_pdf;
///
/// // φ(0) = 1 / sqrt(2π) ≈ 0.3989
/// assert!((norm_pdf(0.0_f64) - 0.3989422804).abs() < 1e-7);
/// ```
#[inline]
pub fn norm_pdf<T: Float>(x: T) -> T {
    lit::<T>(FRAC_1_SQRT_2PI) * (-lit::<T>(0.5) * x * x).exp()
}

/// Standard normal quantile, Φ⁻¹(p).
///
/// Acklam's rational approximation, absolute error below 1.15e-9.
/// Returns `-∞` for `p <= 0`, `+∞` for `p >= 1` and NaN for NaN input.
///
/// # Examples
/// ```
/// use pricer_models::analytical::distributions::inverse_norm_cdf;
///
/// assert!(inverse_norm_cdf(0.5).abs() < 1e-9);
/// assert!((inverse_norm_cdf(0.975) - 1.959963985).abs() < 1e-8);
/// ```
pub fn inverse_norm_cdf(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_69e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];
    const P_LOW: f64 = 0.024_25;

    if p.is_nan() {
        return f64::NAN;
    }
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    }
}
