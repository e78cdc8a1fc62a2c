use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use hw_core::{ErrorInfo, Observable, SamplingMethod, WalkError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::checkpoint::CheckpointPayload;
use crate::config::{OutputConfig, RunConfig};
use crate::data::Measurement;
use crate::manifest::{self, RunManifest};
use crate::{fast_wang_landau, metropolis, simple, tempering, wang_landau};

/// Summary returned to callers after a run completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Sampler that produced the run.
    pub sampling: SamplingMethod,
    /// Observable the sampler biased.
    pub observable: Observable,
    /// Acceptance rates per replica, temperature or range.
    pub acceptance_rates: BTreeMap<String, f64>,
    /// Temperatures of the replicas.
    pub replica_temperatures: Vec<f64>,
    /// Acceptance rate of exchanges between neighbouring temperatures.
    pub exchange_acceptance: Vec<f64>,
    /// The same rates keyed by `lower <-> upper` in ladder order.
    pub exchange_pairs: IndexMap<String, f64>,
    /// Equilibration time in sweeps, where one applies.
    pub t_eq: Option<usize>,
    /// False if the automatic equilibration timed out.
    pub equilibrated: bool,
    /// Mean of `S` over the measurements, or under the estimated density.
    pub checksum: f64,
    /// Bootstrap error of the checksum, zero where not estimated.
    pub checksum_error: f64,
    /// SHA-256 of the final random numbers.
    pub state_hash: String,
    /// Bin centers and normalized `ln g` of the last flat histogram run.
    pub density: Option<(Vec<f64>, Vec<f64>)>,
    /// Data files written during the run.
    pub data_files: Vec<PathBuf>,
    /// Stored configurations, if enabled.
    pub conf_path: Option<PathBuf>,
    /// Manifest path, if emitted.
    pub manifest_path: Option<PathBuf>,
    /// Summary path, if emitted.
    pub summary_path: Option<PathBuf>,
    /// Checkpoint files still on disk.
    pub checkpoints: Vec<PathBuf>,
    /// Measurements taken during this invocation.
    pub samples: Vec<Measurement>,
}

/// What a sampler hands back to [`run`].
#[derive(Debug, Default)]
pub(crate) struct SamplerOutcome {
    pub acceptance_rates: BTreeMap<String, f64>,
    pub replica_temperatures: Vec<f64>,
    pub exchange_pairs: IndexMap<String, f64>,
    pub t_eq: Option<usize>,
    pub equilibrated: bool,
    pub checksum: f64,
    pub checksum_error: f64,
    pub final_states: Vec<Vec<f64>>,
    pub density: Option<(Vec<f64>, Vec<f64>)>,
    pub data_files: Vec<PathBuf>,
    pub conf_file: Option<PathBuf>,
    pub checkpoints: Vec<PathBuf>,
    pub samples: Vec<Measurement>,
}

/// Absolute artefact paths, all `None` without a run directory.
#[derive(Debug, Clone, Default)]
pub(crate) struct ResolvedOutput {
    pub run_directory: Option<PathBuf>,
    pub data_file: Option<PathBuf>,
    pub conf_file: Option<PathBuf>,
    pub equilibration_file: Option<PathBuf>,
    pub manifest_file: Option<PathBuf>,
    pub checkpoint_dir: Option<PathBuf>,
    pub summary_file: Option<PathBuf>,
}

pub(crate) fn resolve_output_paths(config: &OutputConfig) -> ResolvedOutput {
    match &config.run_directory {
        None => ResolvedOutput::default(),
        Some(dir) => ResolvedOutput {
            run_directory: Some(dir.clone()),
            data_file: Some(dir.join(&config.data_file)),
            conf_file: config.conf_file.as_ref().map(|conf| dir.join(conf)),
            equilibration_file: Some(dir.join("equilibration.dat")),
            manifest_file: Some(dir.join(&config.manifest_file)),
            checkpoint_dir: Some(dir.join(&config.checkpoint_dir)),
            summary_file: Some(dir.join(&config.summary_file)),
        },
    }
}

/// Runs the configured sampler from scratch.
///
/// `invocation` is recorded in the header of every data file.
pub fn run(config: &RunConfig, invocation: &str) -> Result<RunSummary, WalkError> {
    let mut config = config.clone();
    config.validate()?;
    let layout = resolve_output_paths(&config.output);
    info!(
        sampling = %config.sampling,
        walk = %config.walk.walk_type,
        d = config.walk.dimension,
        n = config.walk.steps,
        observable = %config.observable,
        "starting run"
    );
    let outcome = match config.sampling {
        SamplingMethod::Simple => simple::run_simple(&config, &layout, invocation)?,
        SamplingMethod::Metropolis => metropolis::run_metropolis(&config, &layout, invocation)?,
        SamplingMethod::ParallelTempering => {
            tempering::run_tempering(&config, &layout, invocation)?
        }
        SamplingMethod::WangLandau => wang_landau::run_wang_landau(&config, &layout, invocation)?,
        SamplingMethod::FastWangLandau => {
            fast_wang_landau::run_fast_wang_landau(&config, &layout, invocation)?
        }
    };
    finish(&config, &layout, outcome)
}

/// Resumes a Metropolis run from a checkpoint file.
pub fn resume(path: &Path, invocation: &str) -> Result<RunSummary, WalkError> {
    let payload = CheckpointPayload::load(path)?;
    if payload.replicas.is_empty() {
        return Err(WalkError::Serde(
            ErrorInfo::new("empty-checkpoint", "checkpoint contained no replicas")
                .with_context("path", path.display().to_string()),
        ));
    }
    if payload.config.sampling != SamplingMethod::Metropolis {
        return Err(WalkError::Config(
            ErrorInfo::new("resume-unsupported", "only metropolis runs can be resumed")
                .with_context("sampling", payload.config.sampling.as_str()),
        ));
    }
    let config = payload.config.clone();
    let layout = resolve_output_paths(&config.output);
    info!(sweep = payload.sweep, path = %path.display(), "resuming run");
    let outcome = metropolis::resume_metropolis(payload, &layout, invocation)?;
    finish(&config, &layout, outcome)
}

fn finish(
    config: &RunConfig,
    layout: &ResolvedOutput,
    outcome: SamplerOutcome,
) -> Result<RunSummary, WalkError> {
    let state_hash = manifest::state_hash(outcome.final_states.iter().map(Vec::as_slice));
    let relative = |path: &PathBuf| -> PathBuf {
        layout
            .run_directory
            .as_ref()
            .and_then(|dir| path.strip_prefix(dir).ok())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| path.clone())
    };

    let manifest_path = match &layout.manifest_file {
        Some(path) => {
            let manifest = RunManifest {
                config: config.clone(),
                realization_seed: config.seed_policy.realization_seed,
                mc_seed: config.seed_policy.mc_seed,
                seed_label: config.seed_policy.label.clone(),
                state_hash: state_hash.clone(),
                data_files: outcome.data_files.iter().map(relative).collect(),
                conf_file: outcome.conf_file.as_ref().map(relative),
                checkpoints: outcome.checkpoints.iter().map(relative).collect(),
                created_at: manifest::timestamp(),
            };
            manifest.write(path)?;
            Some(path.clone())
        }
        None => None,
    };

    let summary = RunSummary {
        sampling: config.sampling,
        observable: config.observable,
        acceptance_rates: outcome.acceptance_rates,
        replica_temperatures: outcome.replica_temperatures,
        exchange_acceptance: outcome.exchange_pairs.values().copied().collect(),
        exchange_pairs: outcome.exchange_pairs,
        t_eq: outcome.t_eq,
        equilibrated: outcome.equilibrated,
        checksum: outcome.checksum,
        checksum_error: outcome.checksum_error,
        state_hash,
        density: outcome.density,
        data_files: outcome.data_files,
        conf_path: outcome.conf_file,
        manifest_path,
        summary_path: layout.summary_file.clone(),
        checkpoints: outcome.checkpoints,
        samples: outcome.samples,
    };

    if let Some(path) = &layout.summary_file {
        write_summary(&summary, path)?;
    }
    info!(checksum = summary.checksum, "run finished");
    Ok(summary)
}

fn write_summary(summary: &RunSummary, path: &Path) -> Result<(), WalkError> {
    let json = serde_json::to_string_pretty(summary).map_err(|err| {
        WalkError::Serde(
            ErrorInfo::new("summary-serialize", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })?;
    std::fs::write(path, json).map_err(|err| {
        WalkError::Serde(
            ErrorInfo::new("summary-write", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })
}

/// Loads a summary written by [`run`].
pub fn load_summary(path: &Path) -> Result<RunSummary, WalkError> {
    let contents = std::fs::read_to_string(path).map_err(|err| {
        WalkError::Serde(
            ErrorInfo::new("summary-read", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })?;
    serde_json::from_str(&contents).map_err(|err| {
        WalkError::Serde(
            ErrorInfo::new("summary-parse", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })
}
