//! Simulated path storage.
//!
//! # Memory Layout
//!
//! Paths are stored in row-major order: `spot[path_idx * (n_steps + 1) + step_idx]`
//! where `step_idx = 0` contains the initial state. The variance buffer has
//! the same layout.

/// Paths produced by one simulation call.
#[derive(Clone, Debug, PartialEq)]
pub struct PathSet {
    n_paths: usize,
    n_steps: usize,
    times: Vec<f64>,
    spot: Vec<f64>,
    variance: Vec<f64>,
    seed: u64,
    antithetic: bool,
}

/// Borrowed view of one path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathView<'a> {
    /// Spot at each grid time.
    pub spot: &'a [f64],
    /// Variance at each grid time.
    pub variance: &'a [f64],
}

impl PathSet {
    pub(crate) fn new(
        n_steps: usize,
        times: Vec<f64>,
        spot: Vec<f64>,
        variance: Vec<f64>,
        seed: u64,
        antithetic: bool,
    ) -> Self {
        let row = n_steps + 1;
        Self {
            n_paths: spot.len() / row,
            n_steps,
            times,
            spot,
            variance,
            seed,
            antithetic,
        }
    }

    /// Number of paths.
    #[inline]
    pub fn n_paths(&self) -> usize {
        self.n_paths
    }

    /// Number of time steps; each path has `n_steps + 1` points.
    #[inline]
    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    /// Grid times `0, dt, ..., horizon`.
    #[inline]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Last grid time.
    #[inline]
    pub fn horizon(&self) -> f64 {
        self.times[self.n_steps]
    }

    /// Run seed; passing it back reproduces this set bit for bit.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Whether paths `2k` and `2k + 1` are antithetic twins.
    #[inline]
    pub fn is_antithetic(&self) -> bool {
        self.antithetic
    }

    /// Spot of `path` at `step`.
    ///
    /// # Panics
    ///
    /// When `path >= n_paths` or `step > n_steps`.
    #[inline]
    pub fn spot(&self, path: usize, step: usize) -> f64 {
        self.spot[self.index(path, step)]
    }

    /// Variance of `path` at `step`.
    ///
    /// # Panics
    ///
    /// When `path >= n_paths` or `step > n_steps`.
    #[inline]
    pub fn variance(&self, path: usize, step: usize) -> f64 {
        self.variance[self.index(path, step)]
    }

    /// Both series of path `i`.
    ///
    /// # Panics
    ///
    /// When `i >= n_paths`.
    pub fn path(&self, i: usize) -> PathView<'_> {
        let row = self.n_steps + 1;
        let range = i * row..(i + 1) * row;
        PathView {
            spot: &self.spot[range.clone()],
            variance: &self.variance[range],
        }
    }

    /// Raw row-major spot buffer.
    #[inline]
    pub fn spots(&self) -> &[f64] {
        &self.spot
    }

    /// Raw row-major variance buffer.
    #[inline]
    pub fn variances(&self) -> &[f64] {
        &self.variance
    }

    /// Spot at the horizon for each path.
    pub fn terminal_spots(&self) -> impl Iterator<Item = f64> + '_ {
        self.spot.chunks_exact(self.n_steps + 1).map(|row| row[row.len() - 1])
    }

    /// Variance at the horizon for each path.
    pub fn terminal_variances(&self) -> impl Iterator<Item = f64> + '_ {
        self.variance.chunks_exact(self.n_steps + 1).map(|row| row[row.len() - 1])
    }

    /// Sample mean of the terminal variance.
    pub fn mean_terminal_variance(&self) -> f64 {
        self.terminal_variances().sum::<f64>() / self.n_paths as f64
    }

    /// Sample mean of the terminal spot.
    pub fn mean_terminal_spot(&self) -> f64 {
        self.terminal_spots().sum::<f64>() / self.n_paths as f64
    }

    #[inline]
    fn index(&self, path: usize, step: usize) -> usize {
        assert!(path < self.n_paths && step <= self.n_steps, "path {} step {} out of range", path, step);
        path * (self.n_steps + 1) + step
    }
}
