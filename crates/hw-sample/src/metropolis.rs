use std::path::{Path, PathBuf};
use std::time::Instant;

use hw_core::{ErrorInfo, Observable, RngHandle, WalkError};
use hw_walk::{build_walker, restore_walker, Degenerate, Walker};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::checkpoint::{
    checkpoint_path, enforce_checkpoint_retention, CheckpointPayload, ReplicaCheckpoint,
    SamplerProgress,
};
use crate::config::RunConfig;
use crate::configurations::ConfigurationStore;
use crate::data::{read_rows, DataWriter, Measurement};
use crate::determinism::{auxiliary_seed, replica_seed, sweep_seed};
use crate::kernel::{ResolvedOutput, SamplerOutcome};
use crate::stat::{mean, AcceptanceStats, Bootstrap, RollingMean};

/// Window of the rolling means watched during equilibration.
const EQUILIBRATION_WINDOW: usize = 100;

/// Performs `attempts` Metropolis changes at temperature `theta` and returns
/// the observable afterwards.
///
/// A change from `S_old` to `S_new` is kept when
/// `exp((S_old - S_new) / theta)` is at least a uniform draw, so negative
/// temperatures favour large values and an infinite one accepts everything.
pub fn sweep(
    walker: &mut dyn Walker,
    observable: Observable,
    theta: f64,
    attempts: usize,
    rng: &mut RngHandle,
    stats: &mut AcceptanceStats,
) -> Result<f64, WalkError> {
    let mut current = walker.observable(observable);
    for _ in 0..attempts {
        walker.change(rng, true)?;
        let proposed = walker.observable(observable);
        let accepted = ((current - proposed) / theta).exp() >= rng.uniform();
        if accepted {
            current = proposed;
        } else {
            walker.undo_change()?;
        }
        stats.record(accepted);
    }
    Ok(current)
}

/// Extreme starting configurations bracketing the observable.
pub fn degenerate_pair(observable: Observable) -> (Degenerate, Degenerate) {
    match observable {
        Observable::Volume => (Degenerate::MaxVolume, Degenerate::MinVolume),
        Observable::Surface | Observable::Passage => {
            (Degenerate::MaxSurface, Degenerate::MinSurface)
        }
    }
}

/// Smallest and largest reachable value of the configured observable.
///
/// The walk is moved into both degenerate configurations; off-lattice walks
/// are refined by greedy descent, so their bounds are estimates.
pub fn only_bounds(config: &RunConfig) -> Result<(f64, f64), WalkError> {
    let seeds = &config.seed_policy;
    let (high, low) = degenerate_pair(config.observable);
    let mut values = [0.0; 2];
    for (slot, (purpose, kind)) in [(2u64, low), (1, high)].into_iter().enumerate() {
        let mut rng = RngHandle::from_seed(replica_seed(seeds.realization_seed, 0));
        let mut walker = build_walker(&config.walker_params(), &mut rng)?;
        let mut aux = RngHandle::from_seed(auxiliary_seed(seeds.mc_seed, purpose));
        walker.degenerate(kind, &mut aux)?;
        values[slot] = walker.observable(config.observable);
    }
    info!(min = values[0], max = values[1], observable = %config.observable, "bounds");
    Ok((values[0], values[1]))
}

/// Estimates the equilibration time of `walker`.
///
/// Two more walkers start from the degenerate maximum and minimum and all
/// three are swept at the same temperature. Once the rolling variance of the
/// main walker is stable, the run is equilibrated when both extreme means lie
/// within one standard deviation of the main mean. Returns the number of
/// sweeps done and whether convergence was reached before `t_eq_max`.
pub fn equilibrate(
    config: &RunConfig,
    walker: &mut dyn Walker,
    mut log: Option<&mut DataWriter>,
) -> Result<(usize, bool), WalkError> {
    let theta = config.effective_theta();
    let attempts = config.resolved_sweep();
    let seeds = &config.seed_policy;
    let (high, low) = degenerate_pair(config.observable);

    let mut extremes = Vec::with_capacity(2);
    for (purpose, kind) in [(1u64, high), (2, low)] {
        let mut rng = RngHandle::from_seed(replica_seed(seeds.realization_seed, 0));
        let mut extreme = build_walker(&config.walker_params(), &mut rng)?;
        let mut aux = RngHandle::from_seed(auxiliary_seed(seeds.mc_seed, purpose));
        extreme.degenerate(kind, &mut aux)?;
        extremes.push(extreme);
    }

    let mut means = [
        RollingMean::new(EQUILIBRATION_WINDOW),
        RollingMean::new(EQUILIBRATION_WINDOW),
        RollingMean::new(EQUILIBRATION_WINDOW),
    ];
    let mut scratch = AcceptanceStats::default();
    let mut started = false;

    for t in 0..config.t_eq_max {
        let mut rng = RngHandle::from_seed(sweep_seed(seeds.mc_seed, 0, t));
        let s = sweep(walker, config.observable, theta, attempts, &mut rng, &mut scratch)?;
        means[0].add(s);
        let mut row = format!("{t} {} {}", walker.surface(), walker.volume());
        for (idx, extreme) in extremes.iter_mut().enumerate() {
            let mut rng = RngHandle::from_seed(sweep_seed(seeds.mc_seed, idx + 1, t));
            let s = sweep(
                extreme.as_mut(),
                config.observable,
                theta,
                attempts,
                &mut rng,
                &mut scratch,
            )?;
            means[idx + 1].add(s);
            row.push_str(&format!(" {} {}", extreme.surface(), extreme.volume()));
        }
        if let Some(log) = log.as_deref_mut() {
            log.row(&row)?;
        }

        if !started && t >= EQUILIBRATION_WINDOW {
            started = (means[0].var(0) / means[0].var(EQUILIBRATION_WINDOW / 2) - 1.0).abs() < 0.05;
        }
        if started {
            let sdev = means[0].var(0).sqrt();
            let m = means[0].mean();
            if (m - means[1].mean()).abs() < sdev && (m - means[2].mean()).abs() < sdev {
                info!(t_eq = t + 1, "equilibrated");
                return Ok((t + 1, true));
            }
        }
    }
    warn!(
        t_eq_max = config.t_eq_max,
        "equilibration did not converge, measuring anyway"
    );
    Ok((config.t_eq_max, false))
}

struct Outputs {
    data: Option<DataWriter>,
    confs: Option<ConfigurationStore>,
}

impl Outputs {
    fn flush(&mut self) -> Result<(), WalkError> {
        if let Some(data) = self.data.as_mut() {
            data.flush()?;
        }
        if let Some(confs) = self.confs.as_mut() {
            confs.flush()?;
        }
        Ok(())
    }
}

fn row_sweep(line: &str) -> Option<usize> {
    line.split_whitespace().next()?.parse().ok()
}

/// Opens the data file and the configuration store. When `resumed_at` is set,
/// rows and configurations of earlier sweeps are carried over.
fn open_outputs(
    config: &RunConfig,
    layout: &ResolvedOutput,
    invocation: &str,
    progress: &SamplerProgress,
    resumed_at: Option<usize>,
) -> Result<Outputs, WalkError> {
    let data = match &layout.data_file {
        Some(path) => {
            let carried = match resumed_at {
                Some(sweep) if path.exists() => read_rows(path)?
                    .into_iter()
                    .filter(|line| row_sweep(line).map_or(false, |s| s < sweep))
                    .collect(),
                _ => Vec::new(),
            };
            let mut writer = DataWriter::create(path)?;
            writer.header(invocation, &Measurement::columns(&config.passage_time_starts))?;
            writer.comment(&format!(
                "theta: {} sweep: {} t_eq: {}",
                config.effective_theta(),
                config.resolved_sweep(),
                progress.t_eq
            ))?;
            if !progress.equilibrated {
                writer.comment("equilibration did not converge within t_eq_max sweeps")?;
            }
            if let Some(sweep) = resumed_at {
                writer.comment(&format!("resumed from checkpoint at sweep {sweep}"))?;
            }
            for line in &carried {
                writer.row(line)?;
            }
            Some(writer)
        }
        None => None,
    };

    let confs = match &layout.conf_file {
        Some(path) => {
            let carried = match resumed_at {
                Some(sweep) if path.exists() => ConfigurationStore::read_all(path)?
                    .into_iter()
                    .filter(|record| (record.sweep as usize) < sweep)
                    .collect(),
                _ => Vec::new(),
            };
            let mut store = ConfigurationStore::create(path)?;
            for record in &carried {
                store.append_record(record)?;
            }
            Some(store)
        }
        None => None,
    };

    Ok(Outputs { data, confs })
}

fn existing_checkpoints(dir: &Path, up_to: usize) -> Vec<PathBuf> {
    let mut found: Vec<(usize, PathBuf)> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?;
            let sweep: usize = name.strip_prefix("ckpt_")?.strip_suffix(".json")?.parse().ok()?;
            Some((sweep, entry.into_path()))
        })
        .filter(|(sweep, _)| *sweep <= up_to)
        .collect();
    found.sort();
    found.into_iter().map(|(_, path)| path).collect()
}

pub(crate) fn run_metropolis(
    config: &RunConfig,
    layout: &ResolvedOutput,
    invocation: &str,
) -> Result<SamplerOutcome, WalkError> {
    let mut rng = RngHandle::from_seed(replica_seed(config.seed_policy.realization_seed, 0));
    let mut walker = build_walker(&config.walker_params(), &mut rng)?;

    let (t_eq, equilibrated) = match config.t_eq {
        Some(t_eq) => (t_eq, true),
        None => {
            let mut log = match &layout.equilibration_file {
                Some(path) => {
                    let mut log = DataWriter::create(path)?;
                    log.header(
                        invocation,
                        &["t", "L", "A", "L_max", "A_max", "L_min", "A_min"]
                            .iter()
                            .map(|c| c.to_string())
                            .collect::<Vec<_>>(),
                    )?;
                    Some(log)
                }
                None => None,
            };
            let result = equilibrate(config, walker.as_mut(), log.as_mut())?;
            if let Some(log) = log {
                log.finish()?;
            }
            result
        }
    };

    let progress = SamplerProgress {
        t_eq,
        equilibrated,
        ..SamplerProgress::default()
    };
    let outputs = open_outputs(config, layout, invocation, &progress, None)?;
    measure(config, layout, walker, t_eq, progress, outputs, Vec::new())
}

pub(crate) fn resume_metropolis(
    payload: CheckpointPayload,
    layout: &ResolvedOutput,
    invocation: &str,
) -> Result<SamplerOutcome, WalkError> {
    let CheckpointPayload {
        sweep,
        mut config,
        seed,
        progress,
        replicas,
    } = payload;
    let replica = replicas.into_iter().next().ok_or_else(|| {
        WalkError::Serde(ErrorInfo::new(
            "empty-checkpoint",
            "checkpoint contained no replicas",
        ))
    })?;
    config.seed_policy.mc_seed = seed;
    let walker = restore_walker(&config.walker_params(), &replica.random_numbers)?;
    let outputs = open_outputs(&config, layout, invocation, &progress, Some(sweep))?;
    let checkpoints = layout
        .checkpoint_dir
        .as_deref()
        .map(|dir| existing_checkpoints(dir, sweep))
        .unwrap_or_default();
    measure(&config, layout, walker, sweep, progress, outputs, checkpoints)
}

fn measure(
    config: &RunConfig,
    layout: &ResolvedOutput,
    mut walker: Box<dyn Walker>,
    start: usize,
    mut progress: SamplerProgress,
    mut outputs: Outputs,
    mut checkpoints: Vec<PathBuf>,
) -> Result<SamplerOutcome, WalkError> {
    let theta = config.effective_theta();
    let attempts = config.resolved_sweep();
    let mc_seed = config.seed_policy.mc_seed;
    let end = config.iterations + 2 * progress.t_eq;
    let mut samples = Vec::new();
    let clock = Instant::now();
    debug!(start, end, theta, "metropolis sweeps");

    for i in start..end {
        let mut rng = RngHandle::from_seed(sweep_seed(mc_seed, 0, i));
        sweep(
            walker.as_mut(),
            config.observable,
            theta,
            attempts,
            &mut rng,
            &mut progress.stats,
        )?;

        if i >= 2 * progress.t_eq {
            let m = Measurement::take(
                i,
                walker.as_ref(),
                config.observable,
                &config.passage_time_starts,
            );
            progress.sum_s += m.s;
            progress.measured += 1;
            progress.series.push(m.s);
            if let Some(data) = outputs.data.as_mut() {
                data.row(&m.to_row())?;
            }
            if let Some(confs) = outputs.confs.as_mut() {
                confs.append(i as u64, walker.as_ref())?;
            }
            samples.push(m);
        }

        if config.checkpoint.interval > 0 && (i + 1) % config.checkpoint.interval == 0 {
            if let Some(dir) = &layout.checkpoint_dir {
                outputs.flush()?;
                let path = checkpoint_path(dir, i + 1);
                CheckpointPayload {
                    sweep: i + 1,
                    config: config.clone(),
                    seed: mc_seed,
                    progress: progress.clone(),
                    replicas: vec![ReplicaCheckpoint {
                        theta,
                        random_numbers: walker.random_numbers(),
                    }],
                }
                .store(&path)?;
                if !checkpoints.contains(&path) {
                    checkpoints.push(path);
                }
                enforce_checkpoint_retention(&mut checkpoints, config.checkpoint.max_to_keep)?;
            }
        }
    }

    let swept = end.saturating_sub(start).max(1);
    let seconds_per_sweep = clock.elapsed().as_secs_f64() / swept as f64;
    let stats = progress.stats;
    let mut data_files = Vec::new();
    if let Some(mut data) = outputs.data {
        data.footer(stats.tries, stats.rejects, seconds_per_sweep)?;
        data_files.push(data.finish()?);
    }
    let conf_file = outputs.confs.map(ConfigurationStore::finish).transpose()?;

    let checksum = if progress.measured == 0 {
        0.0
    } else {
        progress.sum_s / progress.measured as f64
    };
    let (_, checksum_error) = Bootstrap::default().estimate(&progress.series, mean);
    info!(
        acceptance = stats.acceptance(),
        measured = progress.measured,
        "metropolis finished"
    );

    Ok(SamplerOutcome {
        acceptance_rates: [(format!("theta={theta}"), stats.acceptance())]
            .into_iter()
            .collect(),
        replica_temperatures: vec![theta],
        t_eq: Some(progress.t_eq),
        equilibrated: progress.equilibrated,
        checksum,
        checksum_error,
        final_states: vec![walker.random_numbers()],
        data_files,
        conf_file,
        checkpoints,
        samples,
        ..SamplerOutcome::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hw_walk::WalkerParams;

    fn walker(steps: usize) -> Box<dyn Walker> {
        let params = WalkerParams {
            steps,
            ..WalkerParams::default()
        };
        build_walker(&params, &mut RngHandle::from_seed(3)).unwrap()
    }

    #[test]
    fn lattice_bounds_are_exact() {
        let config = RunConfig {
            walk: WalkerParams {
                steps: 10,
                hull_algorithm: hw_core::HullAlgorithm::Andrew,
                ..WalkerParams::default()
            },
            ..RunConfig::default()
        };
        // a single step back and forth against a straight line of N steps
        let (min, max) = only_bounds(&config).unwrap();
        assert_eq!(min, 2.0);
        assert_eq!(max, 20.0);
    }

    #[test]
    fn infinite_temperature_accepts_everything() {
        let mut w = walker(20);
        let mut stats = AcceptanceStats::default();
        let mut rng = RngHandle::from_seed(1);
        sweep(w.as_mut(), Observable::Surface, f64::INFINITY, 50, &mut rng, &mut stats).unwrap();
        assert_eq!(stats.tries, 50);
        assert_eq!(stats.rejects, 0);
    }

    #[test]
    fn low_negative_temperature_grows_the_hull() {
        let mut w = walker(40);
        let before = w.surface();
        let mut stats = AcceptanceStats::default();
        let mut rng = RngHandle::from_seed(2);
        for _ in 0..20 {
            sweep(w.as_mut(), Observable::Surface, -0.01, 40, &mut rng, &mut stats).unwrap();
        }
        assert!(w.surface() > before);
        assert!(stats.rejects > 0);
    }

    #[test]
    fn sweep_reports_the_current_observable() {
        let mut w = walker(15);
        let mut stats = AcceptanceStats::default();
        let mut rng = RngHandle::from_seed(4);
        let s = sweep(w.as_mut(), Observable::Volume, 5.0, 15, &mut rng, &mut stats).unwrap();
        assert_eq!(s, w.volume());
    }

    #[test]
    fn degenerate_pairs_follow_the_observable() {
        assert_eq!(
            degenerate_pair(Observable::Volume),
            (Degenerate::MaxVolume, Degenerate::MinVolume)
        );
        assert_eq!(
            degenerate_pair(Observable::Passage),
            (Degenerate::MaxSurface, Degenerate::MinSurface)
        );
    }

    #[test]
    fn rows_are_keyed_by_their_sweep() {
        assert_eq!(row_sweep("17 1.5 2.5"), Some(17));
        assert_eq!(row_sweep(""), None);
    }
}
