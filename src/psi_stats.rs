//! # Running statistics of per-hit psi values
//!
//! [`PsiStatistics`] accumulates the psi contributions of the hits of one fitted track.
//! Sum, mean and standard deviation are maintained incrementally while the values themselves
//! are retained so that order statistics (median, spread) can be computed once all hits have
//! been entered.
//!
//! ## Definitions
//!
//! For `n` entered values `x_i`:
//!
//! ```text
//! mean   = Σx / n
//! sigma  = sqrt(max(0, Σx²/n − mean²))
//! median = middle value of the sorted values (average of the two middle ones for even n)
//! spread = Σ|median − x| / n
//! ```
//!
//! Every statistic is `0` for an empty sample; the spread is also `0` for a single value.

use itertools::Itertools;

/// Running sample statistics over psi values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PsiStatistics {
    values: Vec<f64>,
    sum: f64,
    sum_sq: f64,
}

/// Snapshot of the statistics of a [`PsiStatistics`] sample.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PsiSummary {
    pub n: usize,
    pub sum: f64,
    pub mean: f64,
    pub sigma: f64,
    pub median: f64,
    pub spread: f64,
}

impl PsiStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter one value.
    pub fn enter(&mut self, value: f64) {
        self.values.push(value);
        self.sum += value;
        self.sum_sq += value * value;
    }

    pub fn reset(&mut self) {
        self.values.clear();
        self.sum = 0.0;
        self.sum_sq = 0.0;
    }

    pub fn n(&self) -> usize {
        self.values.len()
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.sum / self.n() as f64
    }

    /// Population standard deviation.
    pub fn sigma(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        (self.sum_sq / self.n() as f64 - mean * mean).max(0.0).sqrt()
    }

    pub fn median(&self) -> f64 {
        let n = self.n();
        if n == 0 {
            return 0.0;
        }
        let sorted = self.values.iter().copied().sorted_by(f64::total_cmp).collect_vec();
        if n % 2 == 1 {
            sorted[n / 2]
        } else {
            0.5 * (sorted[n / 2 - 1] + sorted[n / 2])
        }
    }

    /// Mean absolute deviation from the median.
    pub fn spread(&self) -> f64 {
        let n = self.n();
        if n <= 1 {
            return 0.0;
        }
        let median = self.median();
        self.values.iter().map(|x| (median - x).abs()).sum::<f64>() / n as f64
    }

    pub fn summary(&self) -> PsiSummary {
        PsiSummary {
            n: self.n(),
            sum: self.sum(),
            mean: self.mean(),
            sigma: self.sigma(),
            median: self.median(),
            spread: self.spread(),
        }
    }
}

impl Extend<f64> for PsiStatistics {
    fn extend<T: IntoIterator<Item = f64>>(&mut self, iter: T) {
        for value in iter {
            self.enter(value);
        }
    }
}
