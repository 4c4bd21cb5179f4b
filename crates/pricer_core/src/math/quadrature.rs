//! Gauss–Legendre quadrature.
//!
//! Nodes and weights are computed once by Newton iteration on the Legendre
//! recurrence and reused for every integral, so a [`GaussLegendre`] rule
//! can be built at pricer construction time and shared across threads.

use std::f64::consts::PI;

/// An `n`-point Gauss–Legendre rule on `[-1, 1]`.
///
/// # Example
///
/// ```
/// use pricer_core::math::quadrature::GaussLegendre;
///
/// let rule = GaussLegendre::new(8);
/// let v = rule.integrate(|x| x.powi(5) + x * x, 0.0, 2.0);
/// assert!((v - (64.0 / 6.0 + 8.0 / 3.0)).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GaussLegendre {
    nodes: Vec<f64>,
    weights: Vec<f64>,
}

impl GaussLegendre {
    /// Build an `order`-point rule. `order` is raised to at least 1.
    pub fn new(order: usize) -> Self {
        let n = order.max(1);
        let mut nodes = vec![0.0; n];
        let mut weights = vec![0.0; n];
        let half = (n + 1) / 2;

        for i in 0..half {
            // Tricomi initial guess
            let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
            let mut dp = 1.0;
            for _ in 0..100 {
                let (p, d) = legendre_with_derivative(n, x);
                dp = d;
                let dx = p / d;
                x -= dx;
                if dx.abs() < 1e-15 {
                    break;
                }
            }
            let (_, d) = legendre_with_derivative(n, x);
            if d.is_finite() {
                dp = d;
            }
            let w = 2.0 / ((1.0 - x * x) * dp * dp);
            nodes[i] = -x;
            nodes[n - 1 - i] = x;
            weights[i] = w;
            weights[n - 1 - i] = w;
        }

        Self { nodes, weights }
    }

    /// Number of nodes.
    pub fn order(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes on `[-1, 1]`, ascending.
    pub fn nodes(&self) -> &[f64] {
        &self.nodes
    }

    /// Weights matching [`GaussLegendre::nodes`].
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Integrate `f` over `[a, b]`.
    pub fn integrate<F: Fn(f64) -> f64>(&self, f: F, a: f64, b: f64) -> f64 {
        let c = 0.5 * (b - a);
        let m = 0.5 * (b + a);
        self.nodes
            .iter()
            .zip(&self.weights)
            .map(|(x, w)| w * f(m + c * x))
            .sum::<f64>()
            * c
    }

    /// Integrate `f` over `[a, b]` split into `panels` equal sub-intervals.
    pub fn integrate_composite<F: Fn(f64) -> f64>(&self, f: F, a: f64, b: f64, panels: usize) -> f64 {
        let panels = panels.max(1);
        let width = (b - a) / panels as f64;
        (0..panels)
            .map(|k| {
                let lo = a + width * k as f64;
                self.integrate(&f, lo, lo + width)
            })
            .sum()
    }
}

/// `P_n(x)` and `P_n'(x)` via the three-term recurrence.
fn legendre_with_derivative(n: usize, x: f64) -> (f64, f64) {
    let mut p0 = 1.0;
    let mut p1 = x;
    if n == 0 {
        return (1.0, 0.0);
    }
    for k in 2..=n {
        let k = k as f64;
        let p2 = ((2.0 * k - 1.0) * x * p1 - (k - 1.0) * p0) / k;
        p0 = p1;
        p1 = p2;
    }
    let d = n as f64 * (x * p1 - p0) / (x * x - 1.0);
    (p1, d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_weights_sum_to_two() {
        for n in [1, 2, 5, 16, 32] {
            let rule = GaussLegendre::new(n);
            assert_abs_diff_eq!(rule.weights().iter().sum::<f64>(), 2.0, epsilon = 1e-13);
        }
    }

    #[test]
    fn test_known_two_point_rule() {
        let rule = GaussLegendre::new(2);
        assert_abs_diff_eq!(rule.nodes()[1], 1.0 / 3f64.sqrt(), epsilon = 1e-15);
        assert_abs_diff_eq!(rule.weights()[0], 1.0, epsilon = 1e-14);
    }

    #[test]
    fn test_exact_for_degree_2n_minus_1() {
        let rule = GaussLegendre::new(6);
        // ∫_{-1}^{1} x^10 dx = 2/11
        assert_abs_diff_eq!(rule.integrate(|x| x.powi(10), -1.0, 1.0), 2.0 / 11.0, epsilon = 1e-14);
    }

    #[test]
    fn test_composite_gaussian() {
        let rule = GaussLegendre::new(8);
        let v = rule.integrate_composite(|x| (-x * x).exp(), 0.0, 10.0, 20);
        assert_abs_diff_eq!(v, PI.sqrt() / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_odd_order_has_zero_node() {
        let rule = GaussLegendre::new(5);
        assert_abs_diff_eq!(rule.nodes()[2], 0.0, epsilon = 1e-15);
    }
}
