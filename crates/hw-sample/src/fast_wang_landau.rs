//! The 1/t variant of Wang-Landau, finished by an entropic sampling run.

use hw_core::{RngHandle, WalkError};
use hw_walk::Walker;
use tracing::{debug, warn};

use crate::config::RunConfig;
use crate::histogram::{DensityOfStates, Histogram};
use crate::kernel::{ResolvedOutput, SamplerOutcome};
use crate::stat::AcceptanceStats;
use crate::wang_landau::{biased_attempt, run_ranges, Range};

/// Sweeps between two checks of the histogram in the first phase.
const INITIAL_SWEEPS: usize = 200;

/// Estimates `ln g` in one range.
///
/// Phase one halves `ln f` whenever every bin was visited, until
/// `ln f <= 1/t` with `t` counted in sweeps. Phase two follows `ln f = 1/t`
/// down to `lnf_min`. Phase three samples with the fixed estimate for twice
/// as many sweeps as were done before and corrects `g` by the remaining
/// histogram.
pub fn estimate_range(
    config: &RunConfig,
    range: &Range,
    walker: &mut dyn Walker,
    rng: &mut RngHandle,
    stats: &mut AcceptanceStats,
) -> Result<DensityOfStates, WalkError> {
    let lnf_min = config.wang_landau.lnf_min;
    let observable = config.observable;
    let attempts = config.resolved_sweep();
    let mut g = DensityOfStates::with_borders(range.borders());
    let mut histogram = Histogram::with_borders(range.borders());

    let mut t = 0usize;
    let mut lnf = 1.0;
    while t < 10 || lnf > 1.0 / t as f64 {
        if lnf < lnf_min {
            warn!(range = range.index, t, lnf, "refinement finished before reaching 1/t");
            break;
        }
        loop {
            for _ in 0..INITIAL_SWEEPS {
                for _ in 0..attempts {
                    biased_attempt(walker, observable, &mut g, Some(&mut histogram), lnf, rng, stats)?;
                }
                t += 1;
            }
            if histogram.min() > 0.0 {
                break;
            }
        }
        histogram.reset();
        lnf /= 2.0;
    }
    debug!(range = range.index, t, "power law phase");

    while lnf > lnf_min {
        lnf = 1.0 / t as f64;
        for _ in 0..attempts {
            biased_attempt(walker, observable, &mut g, None, lnf, rng, stats)?;
        }
        t += 1;
    }
    debug!(range = range.index, t, "entropic phase");

    histogram.reset();
    for _ in 0..2 * t {
        for _ in 0..attempts {
            biased_attempt(walker, observable, &mut g, Some(&mut histogram), 0.0, rng, stats)?;
        }
    }
    let mean = histogram.mean();
    for j in 0..histogram.num_bins() {
        let h = histogram.at(j);
        if h > 0.0 {
            g.add_at(j, (h / mean).ln());
        }
    }
    Ok(g)
}

pub(crate) fn run_fast_wang_landau(
    config: &RunConfig,
    layout: &ResolvedOutput,
    invocation: &str,
) -> Result<SamplerOutcome, WalkError> {
    run_ranges(config, layout, invocation, estimate_range)
}
