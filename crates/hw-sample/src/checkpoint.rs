use std::fs;
use std::path::{Path, PathBuf};

use hw_core::{ErrorInfo, WalkError};
use serde::{Deserialize, Serialize};

use crate::config::RunConfig;
use crate::stat::AcceptanceStats;

/// Serializable state of one replica.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicaCheckpoint {
    /// Temperature the replica samples at.
    pub theta: f64,
    /// Random numbers of the walk.
    pub random_numbers: Vec<f64>,
}

/// Sampler bookkeeping needed to continue a run exactly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplerProgress {
    /// Equilibration time in use.
    pub t_eq: usize,
    /// False if the automatic equilibration timed out.
    pub equilibrated: bool,
    /// Change statistics of the measured sweeps.
    pub stats: AcceptanceStats,
    /// Sum of `S` over the measured rows.
    pub sum_s: f64,
    /// Measured rows so far.
    pub measured: usize,
    /// `S` of every measured row, for the error estimate.
    #[serde(default)]
    pub series: Vec<f64>,
}

/// Aggregated checkpoint payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointPayload {
    /// First sweep still to run.
    pub sweep: usize,
    /// Configuration of the run.
    pub config: RunConfig,
    /// Monte Carlo seed the sweep streams derive from.
    pub seed: u64,
    /// Sampler bookkeeping.
    pub progress: SamplerProgress,
    /// Replica states stored in the checkpoint.
    pub replicas: Vec<ReplicaCheckpoint>,
}

impl CheckpointPayload {
    /// Restores the payload from disk.
    pub fn load(path: &Path) -> Result<Self, WalkError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            WalkError::Serde(
                ErrorInfo::new("checkpoint-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        serde_json::from_str(&contents).map_err(|err| {
            WalkError::Serde(
                ErrorInfo::new("checkpoint-parse", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }

    /// Writes the payload to disk.
    pub fn store(&self, path: &Path) -> Result<(), WalkError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                WalkError::Serde(
                    ErrorInfo::new("checkpoint-mkdir", err.to_string())
                        .with_context("path", parent.display().to_string()),
                )
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|err| {
            WalkError::Serde(
                ErrorInfo::new("checkpoint-serialize", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        fs::write(path, json).map_err(|err| {
            WalkError::Serde(
                ErrorInfo::new("checkpoint-write", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }
}

/// Determines the checkpoint file path using a deterministic numbering scheme.
pub fn checkpoint_path(root: &Path, sweep: usize) -> PathBuf {
    root.join(format!("ckpt_{sweep:05}.json"))
}

/// Deletes the oldest checkpoints until at most `max_to_keep` remain.
pub fn enforce_checkpoint_retention(
    paths: &mut Vec<PathBuf>,
    max_to_keep: usize,
) -> Result<(), WalkError> {
    if paths.len() <= max_to_keep {
        return Ok(());
    }
    let removed: Vec<PathBuf> = paths.drain(..paths.len() - max_to_keep).collect();
    for path in removed {
        fs::remove_file(&path).map_err(|err| {
            WalkError::Serde(
                ErrorInfo::new("checkpoint-remove", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_zero_padded() {
        assert_eq!(
            checkpoint_path(Path::new("ck"), 42),
            PathBuf::from("ck/ckpt_00042.json")
        );
    }

    #[test]
    fn retention_removes_oldest_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = Vec::new();
        for sweep in 1..=4 {
            let path = checkpoint_path(dir.path(), sweep);
            fs::write(&path, "{}").unwrap();
            paths.push(path);
        }
        enforce_checkpoint_retention(&mut paths, 2).unwrap();
        assert_eq!(paths.len(), 2);
        assert!(!checkpoint_path(dir.path(), 1).exists());
        assert!(!checkpoint_path(dir.path(), 2).exists());
        assert!(checkpoint_path(dir.path(), 4).exists());
    }
}
