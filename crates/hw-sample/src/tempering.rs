use std::time::Instant;

use hw_core::{RngHandle, WalkError};
use hw_walk::{build_walker, Walker};
use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::RunConfig;
use crate::configurations::ConfigurationStore;
use crate::data::{indexed_path, DataWriter, Measurement};
use crate::determinism::{exchange_seed, replica_seed, sweep_seed};
use crate::kernel::{ResolvedOutput, SamplerOutcome};
use crate::metropolis::sweep;
use crate::stat::{mean, AcceptanceStats, Bootstrap};

/// Metropolis probability of swapping the temperatures of two replicas.
///
/// `s_a` is sampled at `theta_a` and `s_b` at the next temperature
/// `theta_b`. With `delta = s_b - s_a` the result is
/// `exp(-(1/theta_a - 1/theta_b) delta)` for `delta > 0` and `1` otherwise.
pub fn exchange_acceptance(s_a: f64, theta_a: f64, s_b: f64, theta_b: f64) -> f64 {
    let delta = s_b - s_a;
    if delta > 0.0 {
        (-(1.0 / theta_a - 1.0 / theta_b) * delta).exp()
    } else {
        1.0
    }
}

/// Attempts a replica exchange using the provided RNG handle.
pub fn attempt_exchange(
    s_a: f64,
    theta_a: f64,
    s_b: f64,
    theta_b: f64,
    rng: &mut RngHandle,
) -> (bool, f64) {
    let acceptance = exchange_acceptance(s_a, theta_a, s_b, theta_b);
    (rng.uniform() < acceptance, acceptance)
}

struct Replica {
    walker: Box<dyn Walker>,
    stats: AcceptanceStats,
    s: f64,
    pending: Vec<(usize, Measurement)>,
}

#[derive(Debug, Default, Clone, Copy)]
struct PairStats {
    accepted: usize,
    trials: usize,
}

impl PairStats {
    fn rate(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.accepted as f64 / self.trials as f64
        }
    }
}

/// Metropolis at several temperatures with periodic exchanges between
/// replicas at neighbouring temperatures.
pub(crate) fn run_tempering(
    config: &RunConfig,
    layout: &ResolvedOutput,
    invocation: &str,
) -> Result<SamplerOutcome, WalkError> {
    let temperatures = &config.temperatures;
    let count = temperatures.len();
    let attempts = config.resolved_sweep();
    let seeds = &config.seed_policy;

    let mut replicas = Vec::with_capacity(count);
    for n in 0..count {
        let mut rng = RngHandle::from_seed(replica_seed(seeds.realization_seed, n));
        let walker = build_walker(&config.walker_params(), &mut rng)?;
        let s = walker.observable(config.observable);
        replicas.push(Replica {
            walker,
            stats: AcceptanceStats::default(),
            s,
            pending: Vec::new(),
        });
    }
    // theta_map[replica] is the temperature index, holder[temperature] the replica
    let mut theta_map: Vec<usize> = (0..count).collect();
    let mut holder: Vec<usize> = (0..count).collect();
    let mut pairs = vec![PairStats::default(); count.saturating_sub(1)];

    let mut columns = Measurement::columns(&config.passage_time_starts);
    columns.push("theta".to_string());
    let mut files = Vec::new();
    if let Some(base) = &layout.data_file {
        for (k, theta) in temperatures.iter().enumerate() {
            let mut writer = DataWriter::create(&indexed_path(base, k))?;
            writer.header(invocation, &columns)?;
            writer.comment(&format!("theta: {theta} sweep: {attempts}"))?;
            files.push(writer);
        }
    }
    let mut confs = layout
        .conf_file
        .as_deref()
        .map(ConfigurationStore::create)
        .transpose()?;

    let clock = Instant::now();
    let mut cold_series = Vec::new();
    let mut samples = Vec::new();
    let mut round = 0;
    let mut i = 0;
    while i < config.iterations {
        let block = config.estimated_correlation.min(config.iterations - i);
        replicas
            .par_iter_mut()
            .enumerate()
            .map(|(n, replica)| -> Result<(), WalkError> {
                let k = theta_map[n];
                let theta = temperatures[k];
                for j in 0..block {
                    let mut rng = RngHandle::from_seed(sweep_seed(seeds.mc_seed, n, i + j));
                    replica.s = sweep(
                        replica.walker.as_mut(),
                        config.observable,
                        theta,
                        attempts,
                        &mut rng,
                        &mut replica.stats,
                    )?;
                    let m = Measurement::take(
                        i + j,
                        replica.walker.as_ref(),
                        config.observable,
                        &config.passage_time_starts,
                    );
                    replica.pending.push((k, m));
                }
                Ok(())
            })
            .collect::<Result<Vec<_>, WalkError>>()?;

        for replica in replicas.iter_mut() {
            for (k, m) in replica.pending.drain(..) {
                if let Some(file) = files.get_mut(k) {
                    file.row(&format!("{} {}", m.to_row(), temperatures[k]))?;
                }
                if k == 0 {
                    cold_series.push(m.s);
                    samples.push(m);
                }
            }
        }
        if let Some(confs) = confs.as_mut() {
            confs.append((i + block - 1) as u64, replicas[holder[0]].walker.as_ref())?;
        }
        i += block;

        for k in 0..count.saturating_sub(1) {
            let (lo, hi) = (holder[k], holder[k + 1]);
            let mut rng = RngHandle::from_seed(exchange_seed(seeds.mc_seed, round, k));
            let (accepted, p) = attempt_exchange(
                replicas[lo].s,
                temperatures[k],
                replicas[hi].s,
                temperatures[k + 1],
                &mut rng,
            );
            pairs[k].trials += 1;
            if accepted {
                debug!(round, k, p, "exchange accepted");
                theta_map.swap(lo, hi);
                holder.swap(k, k + 1);
                pairs[k].accepted += 1;
            }
        }
        round += 1;
    }

    let seconds = clock.elapsed().as_secs_f64() / config.iterations.max(1) as f64;
    let mut data_files = Vec::new();
    for (k, mut file) in files.into_iter().enumerate() {
        let replica = &replicas[holder[k]];
        file.footer(replica.stats.tries, replica.stats.rejects, seconds)?;
        for (pair, stats) in pairs.iter().enumerate() {
            file.comment(&format!(
                "swap {} <-> {}: {:.1}%",
                temperatures[pair],
                temperatures[pair + 1],
                stats.rate() * 100.0
            ))?;
        }
        data_files.push(file.finish()?);
    }
    let conf_file = confs.map(ConfigurationStore::finish).transpose()?;

    let exchange_pairs: IndexMap<String, f64> = pairs
        .iter()
        .enumerate()
        .map(|(k, stats)| {
            (
                format!("{} <-> {}", temperatures[k], temperatures[k + 1]),
                stats.rate(),
            )
        })
        .collect();
    info!(rounds = round, ?exchange_pairs, "parallel tempering finished");

    let (_, checksum_error) = Bootstrap::default().estimate(&cold_series, mean);
    Ok(SamplerOutcome {
        acceptance_rates: replicas
            .iter()
            .enumerate()
            .map(|(n, r)| (format!("replica {n}"), r.stats.acceptance()))
            .collect(),
        replica_temperatures: temperatures.clone(),
        exchange_pairs,
        equilibrated: true,
        checksum: mean(&cold_series),
        checksum_error,
        final_states: holder
            .iter()
            .map(|n| replicas[*n].walker.random_numbers())
            .collect(),
        data_files,
        conf_file,
        samples,
        ..SamplerOutcome::default()
    })
}
