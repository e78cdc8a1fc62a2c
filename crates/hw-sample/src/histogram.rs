//! Binned counts: histograms, a d-dimensional grid and the density of states.

use std::fmt::Write as _;

use hw_core::{ErrorInfo, WalkError};
use serde::{Deserialize, Serialize};

fn equidistant_borders(bins: usize, lower: f64, upper: f64) -> Vec<f64> {
    let bins = bins.max(1);
    let width = (upper - lower) / bins as f64;
    let mut borders: Vec<f64> = (0..bins).map(|i| lower + i as f64 * width).collect();
    borders.push(upper);
    borders
}

fn centers_of(borders: &[f64]) -> Vec<f64> {
    borders.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
}

/// Bin of `value`, found like `upper_bound`: bins are closed below and open above.
fn bin_of(borders: &[f64], value: f64) -> Option<usize> {
    let (lower, upper) = (*borders.first()?, *borders.last()?);
    if !(value >= lower && value < upper) {
        return None;
    }
    Some(borders.partition_point(|b| *b <= value) - 1)
}

/// Histogram over arbitrary, sorted bin borders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    borders: Vec<f64>,
    data: Vec<f64>,
    below: u64,
    above: u64,
    count: u64,
    sum: f64,
}

impl Histogram {
    /// `bins` equidistant bins covering `[lower, upper)`.
    pub fn new(bins: usize, lower: f64, upper: f64) -> Self {
        Self::with_borders(equidistant_borders(bins, lower, upper))
    }

    /// Bins between consecutive `borders`.
    pub fn with_borders(borders: Vec<f64>) -> Self {
        let bins = borders.len().saturating_sub(1);
        Self {
            borders,
            data: vec![0.0; bins],
            below: 0,
            above: 0,
            count: 0,
            sum: 0.0,
        }
    }

    /// Counts `value` once.
    pub fn add(&mut self, value: f64) {
        self.add_weighted(value, 1.0);
    }

    /// Adds `weight` to the bin of `value`, or to an overflow counter.
    pub fn add_weighted(&mut self, value: f64, weight: f64) {
        match self.bin_index(value) {
            Some(i) => {
                self.data[i] += weight;
                self.count += 1;
                self.sum += weight;
            }
            None if value < self.lower() => self.below += 1,
            None => self.above += 1,
        }
    }

    /// Bin containing `value`, if any.
    pub fn bin_index(&self, value: f64) -> Option<usize> {
        bin_of(&self.borders, value)
    }

    /// Content of the bin containing `value`.
    pub fn get(&self, value: f64) -> Option<f64> {
        self.bin_index(value).map(|i| self.data[i])
    }

    /// Content of bin `i`.
    pub fn at(&self, i: usize) -> f64 {
        self.data[i]
    }

    /// Total in-range weight.
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Number of in-range insertions.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Values that fell below the first border.
    pub fn below(&self) -> u64 {
        self.below
    }

    /// Values at or above the last border.
    pub fn above(&self) -> u64 {
        self.above
    }

    /// Smallest bin content.
    pub fn min(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Average bin content.
    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            0.0
        } else {
            self.sum / self.data.len() as f64
        }
    }

    /// Empties every bin and counter.
    pub fn reset(&mut self) {
        self.data.iter_mut().for_each(|x| *x = 0.0);
        self.below = 0;
        self.above = 0;
        self.count = 0;
        self.sum = 0.0;
    }

    /// Drops empty bins at both ends.
    pub fn trim(&mut self) {
        let first = self.data.iter().position(|x| *x != 0.0);
        let last = self.data.iter().rposition(|x| *x != 0.0);
        match (first, last) {
            (Some(first), Some(last)) => {
                self.data = self.data[first..=last].to_vec();
                self.borders = self.borders[first..=last + 1].to_vec();
            }
            _ => {
                self.data.clear();
                self.borders.truncate(1);
            }
        }
    }

    /// Lowest border.
    pub fn lower(&self) -> f64 {
        self.borders.first().copied().unwrap_or(0.0)
    }

    /// Highest border.
    pub fn upper(&self) -> f64 {
        self.borders.last().copied().unwrap_or(0.0)
    }

    /// Bin centers.
    pub fn centers(&self) -> Vec<f64> {
        centers_of(&self.borders)
    }

    /// Bin borders, one more than bins.
    pub fn borders(&self) -> &[f64] {
        &self.borders
    }

    /// Bin contents.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Number of bins.
    pub fn num_bins(&self) -> usize {
        self.data.len()
    }

    /// Two column text table of centers and contents.
    pub fn ascii_table(&self) -> String {
        let mut out = String::from("# centers counts\n");
        for (center, value) in self.centers().iter().zip(&self.data) {
            let _ = writeln!(out, "{center} {value}");
        }
        out
    }
}

/// Isotropic histogram over a d-dimensional cube `[lower, upper]^d`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramNd {
    bins: usize,
    d: usize,
    lower: f64,
    upper: f64,
    width: f64,
    data: Vec<u64>,
}

impl HistogramNd {
    /// `bins` bins along each of `d` axes.
    pub fn new(bins: usize, d: usize, lower: f64, upper: f64) -> Self {
        let bins = bins.max(1);
        Self {
            bins,
            d,
            lower,
            upper,
            width: (upper - lower) / bins as f64,
            data: vec![0; bins.pow(d as u32)],
        }
    }

    /// Counts a point. Points outside the cube are ignored and points on the
    /// upper face go into the last bin.
    pub fn add(&mut self, point: &[f64]) -> Result<(), WalkError> {
        if point.len() != self.d {
            return Err(WalkError::Sampling(
                ErrorInfo::new("histogram-dimension", "dimensions do not agree")
                    .with_context("expected", self.d.to_string())
                    .with_context("actual", point.len().to_string()),
            ));
        }
        if point.iter().any(|x| !(*x >= self.lower && *x <= self.upper)) {
            return Ok(());
        }
        let mut index = 0;
        let mut stride = 1;
        for x in point {
            let i = (((x - self.lower) / self.width) as usize).min(self.bins - 1);
            index += stride * i;
            stride *= self.bins;
        }
        self.data[index] += 1;
        Ok(())
    }

    /// Total number of counted points.
    pub fn sum(&self) -> u64 {
        self.data.iter().sum()
    }

    /// Largest bin content.
    pub fn max(&self) -> u64 {
        self.data.iter().copied().max().unwrap_or(0)
    }

    /// Empties every bin.
    pub fn reset(&mut self) {
        self.data.iter_mut().for_each(|x| *x = 0);
    }

    /// Bin centers along one axis.
    pub fn centers(&self) -> Vec<f64> {
        (0..self.bins)
            .map(|i| self.lower + self.width * i as f64 + self.width / 2.0)
            .collect()
    }

    /// Bins along one axis.
    pub fn num_bins(&self) -> usize {
        self.bins
    }

    /// Flattened counts, the first axis varying fastest.
    pub fn data(&self) -> &[u64] {
        &self.data
    }
}

/// Logarithm of a density of states over fixed bins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityOfStates {
    borders: Vec<f64>,
    ln_g: Vec<f64>,
}

impl DensityOfStates {
    /// `bins` equidistant bins covering `[lower, upper)`.
    pub fn new(bins: usize, lower: f64, upper: f64) -> Self {
        Self::with_borders(equidistant_borders(bins, lower, upper))
    }

    /// Bins between consecutive `borders`, all starting at `ln g = 0`.
    pub fn with_borders(borders: Vec<f64>) -> Self {
        let bins = borders.len().saturating_sub(1);
        Self {
            borders,
            ln_g: vec![0.0; bins],
        }
    }

    /// Density with the given borders and `ln g` values.
    pub fn from_parts(borders: Vec<f64>, ln_g: Vec<f64>) -> Self {
        Self { borders, ln_g }
    }

    /// Bin containing `value`, if any.
    pub fn bin_index(&self, value: f64) -> Option<usize> {
        bin_of(&self.borders, value)
    }

    /// Adds `amount` to `ln g` at `value`. Values outside are ignored.
    pub fn add(&mut self, value: f64, amount: f64) {
        if let Some(i) = self.bin_index(value) {
            self.ln_g[i] += amount;
        }
    }

    /// `ln g` at `value`.
    pub fn get(&self, value: f64) -> Option<f64> {
        self.bin_index(value).map(|i| self.ln_g[i])
    }

    /// `ln g` of bin `i`.
    pub fn at(&self, i: usize) -> f64 {
        self.ln_g[i]
    }

    /// Adds `amount` to bin `i`.
    pub fn add_at(&mut self, i: usize, amount: f64) {
        self.ln_g[i] += amount;
    }

    /// Shifts every bin by `offset`.
    pub fn shift(&mut self, offset: f64) {
        self.ln_g.iter_mut().for_each(|g| *g += offset);
    }

    /// Shifts `ln g` such that the densities sum to one.
    pub fn normalize(&mut self) {
        let max = self.ln_g.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            return;
        }
        let log_sum = max + self.ln_g.iter().map(|g| (g - max).exp()).sum::<f64>().ln();
        self.shift(-log_sum);
    }

    /// Bin centers.
    pub fn centers(&self) -> Vec<f64> {
        centers_of(&self.borders)
    }

    /// Bin borders.
    pub fn borders(&self) -> &[f64] {
        &self.borders
    }

    /// `ln g` per bin.
    pub fn values(&self) -> &[f64] {
        &self.ln_g
    }

    /// Number of bins.
    pub fn num_bins(&self) -> usize {
        self.ln_g.len()
    }

    /// Bin centers and `ln g`.
    pub fn export(&self) -> (Vec<f64>, Vec<f64>) {
        (self.centers(), self.ln_g.clone())
    }
}
