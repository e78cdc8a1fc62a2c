//! Small statistics helpers: moments, a rolling window and the bootstrap.

use std::collections::VecDeque;

use hw_core::RngHandle;
use serde::{Deserialize, Serialize};

/// Arithmetic mean, zero for an empty slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population variance.
pub fn variance(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let m = mean(data);
    data.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / data.len() as f64
}

/// Population standard deviation.
pub fn sdev(data: &[f64]) -> f64 {
    variance(data).sqrt()
}

/// Proposed and rejected Monte Carlo changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceStats {
    /// Proposed changes.
    pub tries: u64,
    /// Rejected (undone) changes.
    pub rejects: u64,
}

impl AcceptanceStats {
    /// Counts one proposal.
    pub fn record(&mut self, accepted: bool) {
        self.tries += 1;
        if !accepted {
            self.rejects += 1;
        }
    }

    /// Adds the counts of `other`.
    pub fn merge(&mut self, other: &AcceptanceStats) {
        self.tries += other.tries;
        self.rejects += other.rejects;
    }

    /// Fraction of accepted proposals, zero before the first one.
    pub fn acceptance(&self) -> f64 {
        if self.tries == 0 {
            0.0
        } else {
            (self.tries - self.rejects) as f64 / self.tries as f64
        }
    }
}

/// Mean over the last `n` values added.
#[derive(Debug, Clone)]
pub struct RollingMean {
    capacity: usize,
    window: VecDeque<f64>,
    sum: f64,
}

impl RollingMean {
    /// Window of `capacity` values (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            window: VecDeque::with_capacity(capacity),
            sum: 0.0,
        }
    }

    /// Adds a value, dropping the oldest if the window is full, and returns
    /// the new mean.
    pub fn add(&mut self, value: f64) -> f64 {
        if self.window.len() == self.capacity {
            if let Some(old) = self.window.pop_back() {
                self.sum -= old;
            }
        }
        self.window.push_front(value);
        self.sum += value;
        self.mean()
    }

    /// Number of values in the window.
    pub fn count(&self) -> usize {
        self.window.len()
    }

    /// Mean of the window.
    pub fn mean(&self) -> f64 {
        if self.window.is_empty() {
            0.0
        } else {
            self.sum / self.window.len() as f64
        }
    }

    /// Mean squared deviation of the newest `last` values from the window
    /// mean. `0` or anything larger than the window uses the whole window.
    pub fn var(&self, last: usize) -> f64 {
        let count = self.window.len();
        if count == 0 {
            return 0.0;
        }
        let last = if last == 0 { count } else { last.min(count) };
        let m = self.mean();
        self.window
            .iter()
            .take(last)
            .map(|x| (x - m) * (x - m))
            .sum::<f64>()
            / last as f64
    }
}

/// Bootstrap error estimate of an arbitrary estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bootstrap {
    /// Number of resampled data sets.
    pub n_resample: usize,
    /// Seed of the resampling stream.
    pub seed: u64,
}

impl Default for Bootstrap {
    fn default() -> Self {
        Self {
            n_resample: 100,
            seed: 0x243f_6a88,
        }
    }
}

impl Bootstrap {
    /// Mean and standard deviation of `estimator` over resampled data sets.
    pub fn estimate<F>(&self, data: &[f64], estimator: F) -> (f64, f64)
    where
        F: Fn(&[f64]) -> f64,
    {
        if data.is_empty() || self.n_resample == 0 {
            return (estimator(data), 0.0);
        }
        let mut rng = RngHandle::from_seed(self.seed);
        let mut sample = vec![0.0; data.len()];
        let estimates: Vec<f64> = (0..self.n_resample)
            .map(|_| {
                for slot in sample.iter_mut() {
                    *slot = data[rng.below(data.len())];
                }
                estimator(&sample)
            })
            .collect();
        (mean(&estimates), sdev(&estimates))
    }
}
