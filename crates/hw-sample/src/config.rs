use std::path::{Path, PathBuf};

use hw_core::{ErrorInfo, Observable, SamplingMethod, WalkError};
use hw_walk::WalkerParams;
use serde::{Deserialize, Serialize};

/// YAML-configurable parameters governing a sampling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Walk model to sample.
    #[serde(default)]
    pub walk: WalkerParams,
    /// Monte Carlo scheme.
    #[serde(default)]
    pub sampling: SamplingMethod,
    /// Observable `S` the sampler biases.
    #[serde(default)]
    pub observable: Observable,
    /// Number of measured sweeps (simple and Metropolis), sweeps per replica
    /// (parallel tempering) or repetitions (Wang-Landau).
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// Change attempts per sweep, defaults to the number of steps.
    #[serde(default)]
    pub sweep: Option<usize>,
    /// Equilibration time in sweeps, estimated automatically when absent.
    #[serde(default)]
    pub t_eq: Option<usize>,
    /// Longest automatic equilibration before measuring anyway.
    #[serde(default = "default_t_eq_max")]
    pub t_eq_max: usize,
    /// Large deviation temperature.
    #[serde(default = "default_theta")]
    pub theta: f64,
    /// Accept every change, i.e. sample at infinite temperature.
    #[serde(default)]
    pub simple_sampling: bool,
    /// Temperatures of the parallel tempering replicas.
    #[serde(default)]
    pub temperatures: Vec<f64>,
    /// Sweeps between two rounds of replica exchanges.
    #[serde(default = "default_estimated_correlation")]
    pub estimated_correlation: usize,
    /// Flat histogram settings.
    #[serde(default)]
    pub wang_landau: WangLandauConfig,
    /// Start times of the recorded passage times.
    #[serde(default = "default_passage_time_starts")]
    pub passage_time_starts: Vec<usize>,
    /// Seeds of the run.
    #[serde(default)]
    pub seed_policy: SeedPolicy,
    /// Checkpointing behaviour.
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
    /// Output directory configuration.
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_iterations() -> usize {
    100
}

fn default_t_eq_max() -> usize {
    100_000
}

fn default_theta() -> f64 {
    10_000.0
}

fn default_estimated_correlation() -> usize {
    100
}

fn default_passage_time_starts() -> Vec<usize> {
    vec![0]
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            walk: WalkerParams::default(),
            sampling: SamplingMethod::default(),
            observable: Observable::default(),
            iterations: default_iterations(),
            sweep: None,
            t_eq: None,
            t_eq_max: default_t_eq_max(),
            theta: default_theta(),
            simple_sampling: false,
            temperatures: Vec::new(),
            estimated_correlation: default_estimated_correlation(),
            wang_landau: WangLandauConfig::default(),
            passage_time_starts: default_passage_time_starts(),
            seed_policy: SeedPolicy::default(),
            checkpoint: CheckpointConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Wang-Landau energy ranges and convergence parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WangLandauConfig {
    /// Borders of the observable ranges, at least two.
    #[serde(default)]
    pub borders: Vec<f64>,
    /// Bins per range.
    #[serde(default = "default_bins")]
    pub bins: usize,
    /// Bins shared by neighbouring ranges.
    #[serde(default = "default_overlap")]
    pub overlap: usize,
    /// Final modification factor.
    #[serde(default = "default_lnf_min")]
    pub lnf_min: f64,
    /// Flatness criterion `H.min() >= flatness * H.mean()`.
    #[serde(default = "default_flatness")]
    pub flatness: f64,
    /// Threads working on ranges, zero uses every core.
    #[serde(default = "default_parallel")]
    pub parallel: usize,
}

fn default_bins() -> usize {
    100
}

fn default_overlap() -> usize {
    10
}

fn default_lnf_min() -> f64 {
    1e-8
}

fn default_flatness() -> f64 {
    0.8
}

fn default_parallel() -> usize {
    1
}

impl Default for WangLandauConfig {
    fn default() -> Self {
        Self {
            borders: Vec::new(),
            bins: default_bins(),
            overlap: default_overlap(),
            lnf_min: default_lnf_min(),
            flatness: default_flatness(),
            parallel: default_parallel(),
        }
    }
}

/// Deterministic seeding configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPolicy {
    /// Seed of the initial walks.
    #[serde(default)]
    pub realization_seed: u64,
    /// Seed of the Monte Carlo moves.
    #[serde(default)]
    pub mc_seed: u64,
    /// Optional label recorded in manifests.
    #[serde(default)]
    pub label: Option<String>,
}

/// Checkpointing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// Interval in sweeps between checkpoint writes (0 disables checkpoints).
    #[serde(default)]
    pub interval: usize,
    /// Maximum number of checkpoints to retain.
    #[serde(default = "default_checkpoint_retention")]
    pub max_to_keep: usize,
}

fn default_checkpoint_retention() -> usize {
    4
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            interval: 0,
            max_to_keep: default_checkpoint_retention(),
        }
    }
}

/// Output directory layout configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory for run artefacts. Nothing is written without one.
    #[serde(default)]
    pub run_directory: Option<PathBuf>,
    /// Measurement file, gzip compressed if it ends in `.gz`.
    #[serde(default = "default_data_filename")]
    pub data_file: PathBuf,
    /// Stored configurations, disabled when absent.
    #[serde(default)]
    pub conf_file: Option<PathBuf>,
    /// Manifest filename relative to `run_directory`.
    #[serde(default = "default_manifest_filename")]
    pub manifest_file: PathBuf,
    /// Subdirectory used for checkpoint files.
    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: PathBuf,
    /// Summary filename relative to `run_directory`.
    #[serde(default = "default_summary_filename")]
    pub summary_file: PathBuf,
}

fn default_data_filename() -> PathBuf {
    PathBuf::from("data.dat")
}

fn default_manifest_filename() -> PathBuf {
    PathBuf::from("manifest.json")
}

fn default_checkpoint_dir() -> PathBuf {
    PathBuf::from("checkpoints")
}

fn default_summary_filename() -> PathBuf {
    PathBuf::from("summary.json")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            run_directory: None,
            data_file: default_data_filename(),
            conf_file: None,
            manifest_file: default_manifest_filename(),
            checkpoint_dir: default_checkpoint_dir(),
            summary_file: default_summary_filename(),
        }
    }
}

fn invalid(code: &str, message: impl Into<String>) -> WalkError {
    WalkError::Config(ErrorInfo::new(code, message))
}

impl RunConfig {
    /// Parses a YAML document.
    pub fn from_yaml(text: &str) -> Result<Self, WalkError> {
        serde_yaml::from_str(text)
            .map_err(|err| WalkError::Config(ErrorInfo::new("config-parse", err.to_string())))
    }

    /// Reads and parses a YAML file.
    pub fn load(path: &Path) -> Result<Self, WalkError> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            WalkError::Config(
                ErrorInfo::new("config-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Self::from_yaml(&text)
    }

    /// Serializes the configuration back to YAML.
    pub fn to_yaml(&self) -> Result<String, WalkError> {
        serde_yaml::to_string(self)
            .map_err(|err| WalkError::Serde(ErrorInfo::new("config-serialize", err.to_string())))
    }

    /// Change attempts per sweep.
    pub fn resolved_sweep(&self) -> usize {
        self.sweep.unwrap_or(self.walk.steps)
    }

    /// Walk parameters with the sampled passage time starting at the first
    /// of `passage_time_starts`.
    pub fn walker_params(&self) -> WalkerParams {
        WalkerParams {
            passage_start: self.passage_time_starts.first().copied().unwrap_or(0),
            ..self.walk.clone()
        }
    }

    /// Temperature used by the Metropolis sampler.
    pub fn effective_theta(&self) -> f64 {
        if self.simple_sampling {
            f64::INFINITY
        } else {
            self.theta
        }
    }

    /// Checks the configuration and sorts the Wang-Landau borders.
    pub fn validate(&mut self) -> Result<(), WalkError> {
        self.walk.validate()?;
        if self.resolved_sweep() == 0 {
            return Err(invalid("invalid-sweep", "a sweep needs at least one attempt"));
        }
        match self.sampling {
            SamplingMethod::Simple => {}
            SamplingMethod::Metropolis => {
                if self.theta == 0.0 || self.theta.is_nan() {
                    return Err(WalkError::Config(
                        ErrorInfo::new("invalid-theta", "theta must be non-zero")
                            .with_context("theta", self.theta.to_string()),
                    ));
                }
                if self.temperatures.len() > 1 {
                    return Err(WalkError::Config(
                        ErrorInfo::new("too-many-temperatures", "metropolis runs at one theta")
                            .with_context("count", self.temperatures.len().to_string())
                            .with_hint("use `theta` or switch to parallel-tempering"),
                    ));
                }
                if let Some(theta) = self.temperatures.first() {
                    self.theta = *theta;
                }
            }
            SamplingMethod::ParallelTempering => {
                if self.temperatures.is_empty() {
                    return Err(invalid(
                        "missing-temperatures",
                        "parallel tempering needs at least one temperature",
                    ));
                }
                if self.temperatures.iter().any(|t| *t == 0.0 || t.is_nan()) {
                    return Err(invalid("invalid-theta", "temperatures must be non-zero"));
                }
                if self.estimated_correlation == 0 {
                    return Err(invalid(
                        "invalid-estimated-correlation",
                        "at least one sweep between exchanges is needed",
                    ));
                }
            }
            SamplingMethod::WangLandau | SamplingMethod::FastWangLandau => {
                let wl = &mut self.wang_landau;
                if wl.borders.len() < 2 {
                    return Err(WalkError::Config(
                        ErrorInfo::new("missing-borders", "wang-landau needs at least two borders")
                            .with_context("count", wl.borders.len().to_string()),
                    ));
                }
                if wl.borders.iter().any(|b| !b.is_finite()) {
                    return Err(invalid("invalid-borders", "borders must be finite"));
                }
                wl.borders.sort_by(|a, b| a.total_cmp(b));
                if wl.borders.windows(2).any(|w| w[0] == w[1]) {
                    return Err(invalid("invalid-borders", "borders must be distinct"));
                }
                if wl.bins == 0 {
                    return Err(invalid("invalid-bins", "every range needs at least one bin"));
                }
                if !(wl.flatness > 0.0 && wl.flatness <= 1.0) {
                    return Err(WalkError::Config(
                        ErrorInfo::new("invalid-flatness", "flatness must lie in (0, 1]")
                            .with_context("flatness", wl.flatness.to_string()),
                    ));
                }
                if !(wl.lnf_min > 0.0) {
                    return Err(invalid("invalid-lnf-min", "lnf_min must be positive"));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_gives_defaults() {
        let config = RunConfig::from_yaml("{}").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.resolved_sweep(), 100);
        assert_eq!(config.passage_time_starts, vec![0]);
        assert_eq!(config.wang_landau.flatness, 0.8);
    }

    #[test]
    fn sweep_defaults_to_steps() {
        let config = RunConfig::from_yaml("walk:\n  steps: 30\n").unwrap();
        assert_eq!(config.resolved_sweep(), 30);
        let config = RunConfig::from_yaml("walk:\n  steps: 30\nsweep: 7\n").unwrap();
        assert_eq!(config.resolved_sweep(), 7);
    }

    #[test]
    fn wang_landau_borders_are_sorted() {
        let mut config =
            RunConfig::from_yaml("sampling: wang-landau\nwang_landau:\n  borders: [9, 3, 6]\n")
                .unwrap();
        config.validate().unwrap();
        assert_eq!(config.wang_landau.borders, vec![3.0, 6.0, 9.0]);
    }

    #[test]
    fn walker_params_take_the_first_passage_start() {
        let config = RunConfig::from_yaml("passage_time_starts: [7, 2]\n").unwrap();
        assert_eq!(config.walker_params().passage_start, 7);
        let config = RunConfig::from_yaml("passage_time_starts: []\n").unwrap();
        assert_eq!(config.walker_params().passage_start, 0);
        assert_eq!(config.walker_params().steps, config.walk.steps);
    }

    #[test]
    fn infinite_theta_for_simple_sampling() {
        let config = RunConfig {
            simple_sampling: true,
            ..RunConfig::default()
        };
        assert!(config.effective_theta().is_infinite());
    }
}
