use std::time::Instant;

use hw_core::{ErrorInfo, Observable, RngHandle, WalkError};
use hw_walk::{build_walker, Walker};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{RunConfig, WangLandauConfig};
use crate::data::DataWriter;
use crate::determinism::{range_seed, replica_seed};
use crate::histogram::{DensityOfStates, Histogram};
use crate::kernel::{ResolvedOutput, SamplerOutcome};
use crate::stat::{mean, AcceptanceStats};

/// Rounds without getting closer before `find_start` gives up.
pub const FIND_START_STAGNATION: usize = 1000;

/// Attempts per sweep between two flatness checks.
const FLATNESS_CHECK_SWEEPS: usize = 1000;

/// One window of the observable sampled independently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    /// Position among the ranges.
    pub index: usize,
    /// Lower border, extended downward by the overlap.
    pub lower: f64,
    /// Upper border.
    pub upper: f64,
    /// Number of equidistant bins.
    pub bins: usize,
}

impl Range {
    /// Bin borders of the range.
    pub fn borders(&self) -> Vec<f64> {
        let width = (self.upper - self.lower) / self.bins as f64;
        let mut borders: Vec<f64> = (0..self.bins)
            .map(|i| self.lower + i as f64 * width)
            .collect();
        borders.push(self.upper);
        borders
    }

    /// Bin centers of the range.
    pub fn centers(&self) -> Vec<f64> {
        self.borders()
            .windows(2)
            .map(|w| (w[0] + w[1]) / 2.0)
            .collect()
    }

    /// Whether `value` lies in `[lower, upper)`.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value < self.upper
    }
}

/// Splits the borders into ranges. Every range after the first reaches
/// `overlap` bins into its predecessor.
pub fn ranges(config: &WangLandauConfig) -> Vec<Range> {
    config
        .borders
        .windows(2)
        .enumerate()
        .map(|(index, w)| {
            let width = (w[1] - w[0]) / config.bins as f64;
            let overlap = if index == 0 { 0 } else { config.overlap };
            Range {
                index,
                lower: w[0] - overlap as f64 * width,
                upper: w[1],
                bins: config.bins + overlap,
            }
        })
        .collect()
}

/// Bin centers of every range.
pub fn only_centers(config: &WangLandauConfig) -> Vec<Vec<f64>> {
    ranges(config).iter().map(Range::centers).collect()
}

fn distance(range: &Range, value: f64) -> f64 {
    if value < range.lower {
        range.lower - value
    } else if value >= range.upper {
        value - range.upper
    } else {
        0.0
    }
}

/// Moves the walk into `range` greedily: changes that leave the walk farther
/// outside are undone.
///
/// Fails with `wl-range-unreachable` once [`FIND_START_STAGNATION`] rounds of
/// `attempts` changes did not bring the observable closer.
pub fn find_start(
    walker: &mut dyn Walker,
    observable: Observable,
    range: &Range,
    attempts: usize,
    rng: &mut RngHandle,
) -> Result<(), WalkError> {
    let mut best = distance(range, walker.observable(observable));
    let mut stagnant = 0;
    while !range.contains(walker.observable(observable)) {
        for _ in 0..attempts {
            let old = walker.observable(observable);
            walker.change(rng, true)?;
            let new = walker.observable(observable);
            if (new < range.lower && new < old) || (new >= range.upper && new > old) {
                walker.undo_change()?;
            } else if range.contains(new) {
                break;
            }
        }
        let now = distance(range, walker.observable(observable));
        if now < best {
            best = now;
            stagnant = 0;
        } else {
            stagnant += 1;
            if stagnant >= FIND_START_STAGNATION {
                return Err(WalkError::Sampling(
                    ErrorInfo::new("wl-range-unreachable", "no configuration inside the range")
                        .with_context("lower", range.lower.to_string())
                        .with_context("upper", range.upper.to_string())
                        .with_context("S", walker.observable(observable).to_string())
                        .with_hint("check the borders against `hw-sim bounds`"),
                ));
            }
        }
    }
    Ok(())
}

/// One change biased by `1/g`. Afterwards `lnf` is added to `g` and the
/// histogram counts the current value.
pub(crate) fn biased_attempt(
    walker: &mut dyn Walker,
    observable: Observable,
    g: &mut DensityOfStates,
    histogram: Option<&mut Histogram>,
    lnf: f64,
    rng: &mut RngHandle,
    stats: &mut AcceptanceStats,
) -> Result<(), WalkError> {
    let old = walker.observable(observable);
    walker.change(rng, true)?;
    let new = walker.observable(observable);
    let accepted = match (g.get(old), g.get(new)) {
        (_, None) => false,
        (None, Some(_)) => true,
        (Some(g_old), Some(g_new)) => (g_old - g_new).exp() >= rng.uniform(),
    };
    if !accepted {
        walker.undo_change()?;
    }
    stats.record(accepted);

    let current = walker.observable(observable);
    if lnf > 0.0 {
        g.add(current, lnf);
    }
    if let Some(histogram) = histogram {
        histogram.add(current);
    }
    Ok(())
}

fn is_flat(histogram: &Histogram, flatness: f64) -> bool {
    let min = histogram.min();
    min > 0.0 && min >= flatness * histogram.mean()
}

/// Classic Wang-Landau estimate of `ln g` in one range.
pub fn estimate_range(
    config: &RunConfig,
    range: &Range,
    walker: &mut dyn Walker,
    rng: &mut RngHandle,
    stats: &mut AcceptanceStats,
) -> Result<DensityOfStates, WalkError> {
    let wl = &config.wang_landau;
    let check = FLATNESS_CHECK_SWEEPS * config.resolved_sweep();
    let mut g = DensityOfStates::with_borders(range.borders());
    let mut histogram = Histogram::with_borders(range.borders());

    let mut lnf = 1.0;
    while lnf >= wl.lnf_min {
        loop {
            for _ in 0..check {
                biased_attempt(
                    walker,
                    config.observable,
                    &mut g,
                    Some(&mut histogram),
                    lnf,
                    rng,
                    stats,
                )?;
            }
            if is_flat(&histogram, wl.flatness) {
                break;
            }
        }
        debug!(range = range.index, lnf, "histogram flat");
        histogram.reset();
        lnf /= 2.0;
    }
    Ok(g)
}

/// Joins the per-range densities into one normalized density.
///
/// Each range is shifted onto the combined result at the overlap bin where
/// the slopes of both agree best, and continues from there. Ranges without
/// overlap are shifted to continue the last value.
pub fn glue(parts: &[DensityOfStates]) -> DensityOfStates {
    let mut parts = parts.iter();
    let mut result = match parts.next() {
        Some(first) => first.clone(),
        None => return DensityOfStates::from_parts(Vec::new(), Vec::new()),
    };
    for part in parts {
        let rv = result.values();
        let pv = part.values();
        let mut best: Option<(usize, usize, f64)> = None;
        for (j, center) in part.centers().into_iter().enumerate() {
            if j + 1 >= pv.len() {
                break;
            }
            let Some(i) = result.bin_index(center) else {
                continue;
            };
            if i + 1 >= rv.len() {
                continue;
            }
            let diff = ((rv[i + 1] - rv[i]) - (pv[j + 1] - pv[j])).abs();
            if best.map_or(true, |(_, _, d)| diff < d) {
                best = Some((i, j, diff));
            }
        }

        let (borders, values) = match best {
            Some((i, j, _)) => {
                let offset = rv[i] - pv[j];
                let mut borders = result.borders()[..=i].to_vec();
                borders.extend_from_slice(&part.borders()[j + 1..]);
                let mut values = rv[..i].to_vec();
                values.extend(pv[j..].iter().map(|v| v + offset));
                (borders, values)
            }
            None => {
                // bins already covered by the result are dropped
                let upper = result.borders().last().copied().unwrap_or(f64::NEG_INFINITY);
                let skip = part
                    .borders()
                    .get(1..)
                    .unwrap_or_default()
                    .iter()
                    .take_while(|b| **b <= upper)
                    .count()
                    .min(pv.len());
                let offset = match (rv.last(), pv.get(skip)) {
                    (Some(last), Some(first)) => last - first,
                    _ => 0.0,
                };
                let mut borders = result.borders().to_vec();
                borders.extend_from_slice(part.borders().get(skip + 1..).unwrap_or_default());
                let mut values = rv.to_vec();
                values.extend(pv[skip..].iter().map(|v| v + offset));
                (borders, values)
            }
        };
        result = DensityOfStates::from_parts(borders, values);
    }
    result.normalize();
    result
}

/// Mean of the observable under a normalized density.
pub fn density_mean(density: &DensityOfStates) -> f64 {
    density
        .centers()
        .iter()
        .zip(density.values())
        .map(|(c, g)| c * g.exp())
        .sum()
}

fn join(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Per-range estimator shared by the flat histogram samplers.
pub(crate) type RangeEstimator = fn(
    &RunConfig,
    &Range,
    &mut dyn Walker,
    &mut RngHandle,
    &mut AcceptanceStats,
) -> Result<DensityOfStates, WalkError>;

struct RangeOutcome {
    density: DensityOfStates,
    stats: AcceptanceStats,
    state: Vec<f64>,
}

/// Runs `estimator` on every range for every iteration and writes the
/// densities.
pub(crate) fn run_ranges(
    config: &RunConfig,
    layout: &ResolvedOutput,
    invocation: &str,
    estimator: RangeEstimator,
) -> Result<SamplerOutcome, WalkError> {
    let wl = &config.wang_landau;
    let ranges = ranges(wl);
    let seeds = &config.seed_policy;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(wl.parallel)
        .build()
        .map_err(|err| WalkError::Sampling(ErrorInfo::new("thread-pool", err.to_string())))?;

    let mut data = layout
        .data_file
        .as_deref()
        .map(DataWriter::create)
        .transpose()?;
    if let Some(data) = data.as_mut() {
        data.comment(invocation)?;
        data.comment("two lines belong together: bin centers, then unnormalized ln g")?;
        data.comment(&format!("ranges: {}", join(&wl.borders)))?;
        data.comment(&format!("bins: {} overlap: {}", wl.bins, wl.overlap))?;
    }

    let clock = Instant::now();
    let mut stats = vec![AcceptanceStats::default(); ranges.len()];
    let mut means = Vec::with_capacity(config.iterations);
    let mut density = None;
    let mut final_states = Vec::new();
    for iteration in 0..config.iterations {
        let outcomes: Vec<RangeOutcome> = pool.install(|| {
            ranges
                .par_iter()
                .map(|range| -> Result<RangeOutcome, WalkError> {
                    let mut init = RngHandle::from_seed(replica_seed(
                        seeds.realization_seed,
                        range.index,
                    ));
                    let mut walker = build_walker(&config.walker_params(), &mut init)?;
                    let mut rng =
                        RngHandle::from_seed(range_seed(seeds.mc_seed, iteration, range.index));
                    find_start(
                        walker.as_mut(),
                        config.observable,
                        range,
                        config.resolved_sweep(),
                        &mut rng,
                    )?;
                    debug!(range = range.index, lower = range.lower, upper = range.upper, "start found");
                    let mut stats = AcceptanceStats::default();
                    let density = estimator(config, range, walker.as_mut(), &mut rng, &mut stats)?;
                    Ok(RangeOutcome {
                        density,
                        stats,
                        state: walker.random_numbers(),
                    })
                })
                .collect::<Result<Vec<_>, WalkError>>()
        })?;

        if let Some(data) = data.as_mut() {
            data.comment(&format!("iteration {iteration}"))?;
            for (range, outcome) in ranges.iter().zip(&outcomes) {
                data.comment(&format!("range {} [{}, {})", range.index, range.lower, range.upper))?;
                data.row(&join(&outcome.density.centers()))?;
                data.row(&join(outcome.density.values()))?;
            }
        }
        for (total, outcome) in stats.iter_mut().zip(&outcomes) {
            total.merge(&outcome.stats);
        }

        let parts: Vec<DensityOfStates> = outcomes.iter().map(|o| o.density.clone()).collect();
        let glued = glue(&parts);
        if let Some(data) = data.as_mut() {
            data.comment("glued and normalized")?;
            data.row(&join(&glued.centers()))?;
            data.row(&join(glued.values()))?;
        }
        means.push(density_mean(&glued));
        info!(iteration, mean = density_mean(&glued), "flat histogram iteration done");
        final_states = outcomes.into_iter().map(|o| o.state).collect();
        density = Some(glued.export());
    }

    let mut total = AcceptanceStats::default();
    for s in &stats {
        total.merge(s);
    }
    let seconds = clock.elapsed().as_secs_f64() / config.iterations.max(1) as f64;
    let mut data_files = Vec::new();
    if let Some(mut data) = data {
        data.footer(total.tries, total.rejects, seconds)?;
        data_files.push(data.finish()?);
    }

    Ok(SamplerOutcome {
        acceptance_rates: stats
            .iter()
            .enumerate()
            .map(|(k, s)| (format!("range {k}"), s.acceptance()))
            .collect(),
        equilibrated: true,
        checksum: mean(&means),
        final_states,
        density,
        data_files,
        ..SamplerOutcome::default()
    })
}

pub(crate) fn run_wang_landau(
    config: &RunConfig,
    layout: &ResolvedOutput,
    invocation: &str,
) -> Result<SamplerOutcome, WalkError> {
    run_ranges(config, layout, invocation, estimate_range)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(borders: Vec<f64>, bins: usize, overlap: usize) -> WangLandauConfig {
        WangLandauConfig {
            borders,
            bins,
            overlap,
            ..WangLandauConfig::default()
        }
    }

    #[test]
    fn later_ranges_reach_into_their_predecessor() {
        let r = ranges(&config(vec![0.0, 10.0, 30.0], 10, 2));
        assert_eq!(r.len(), 2);
        assert_eq!((r[0].lower, r[0].upper, r[0].bins), (0.0, 10.0, 10));
        assert_eq!((r[1].lower, r[1].upper, r[1].bins), (6.0, 30.0, 12));
        assert_eq!(r[1].borders().len(), 13);
        assert_eq!(only_centers(&config(vec![0.0, 4.0], 2, 0)), vec![vec![1.0, 3.0]]);
    }

    #[test]
    fn gluing_recovers_a_linear_density() {
        // ln g = x sampled in two overlapping ranges with arbitrary offsets
        let left = DensityOfStates::from_parts(
            vec![0.0, 1.0, 2.0, 3.0, 4.0],
            vec![0.5, 1.5, 2.5, 3.5],
        );
        let right = DensityOfStates::from_parts(
            vec![2.0, 3.0, 4.0, 5.0, 6.0],
            vec![-7.5, -6.5, -5.5, -4.5],
        );
        let glued = glue(&[left, right]);
        assert_eq!(glued.num_bins(), 6);
        assert_eq!(glued.borders().first(), Some(&0.0));
        assert_eq!(glued.borders().last(), Some(&6.0));
        let v = glued.values();
        for w in v.windows(2) {
            assert!((w[1] - w[0] - 1.0).abs() < 1e-9);
        }
        let total: f64 = v.iter().map(|g| g.exp()).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn ranges_without_overlap_continue_the_last_value() {
        let left = DensityOfStates::from_parts(vec![0.0, 1.0, 2.0], vec![0.0, 1.0]);
        let right = DensityOfStates::from_parts(vec![2.0, 3.0, 4.0], vec![5.0, 5.0]);
        let glued = glue(&[left, right]);
        assert_eq!(glued.borders(), &[0.0, 1.0, 2.0, 3.0, 4.0]);
        let v = glued.values();
        assert!((v[2] - v[1]).abs() < 1e-12);
        assert!((v[3] - v[1]).abs() < 1e-12);
    }

    #[test]
    fn covered_bins_are_not_repeated() {
        let left = DensityOfStates::from_parts(vec![0.0, 1.0, 2.0], vec![0.0, 1.0]);
        let right = DensityOfStates::from_parts(vec![1.0, 2.0, 3.0], vec![4.0, 7.0]);
        let glued = glue(&[left, right]);
        assert_eq!(glued.borders(), &[0.0, 1.0, 2.0, 3.0]);
        let v = glued.values();
        assert!((v[2] - v[1]).abs() < 1e-12);
    }

    #[test]
    fn density_mean_weights_centers() {
        let d = DensityOfStates::from_parts(
            vec![0.0, 2.0, 4.0],
            vec![0.25_f64.ln(), 0.75_f64.ln()],
        );
        assert!((density_mean(&d) - 2.5).abs() < 1e-12);
    }
}
