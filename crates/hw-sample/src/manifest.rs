use std::fs;
use std::path::{Path, PathBuf};

use hw_core::{ErrorInfo, WalkError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::RunConfig;

/// Structured manifest describing a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    /// Configuration used for the run.
    pub config: RunConfig,
    /// Seed of the initial walks.
    pub realization_seed: u64,
    /// Seed of the Monte Carlo moves.
    pub mc_seed: u64,
    /// Optional seed label captured from the configuration.
    pub seed_label: Option<String>,
    /// SHA-256 of the final random numbers of every replica.
    pub state_hash: String,
    /// Data files produced (relative to the run directory).
    pub data_files: Vec<PathBuf>,
    /// Stored configurations, if enabled.
    pub conf_file: Option<PathBuf>,
    /// Checkpoint files still on disk (relative order preserved).
    pub checkpoints: Vec<PathBuf>,
    /// RFC 3339 completion time.
    pub created_at: String,
}

impl RunManifest {
    /// Writes the manifest to a JSON file.
    pub fn write(&self, path: &Path) -> Result<(), WalkError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                WalkError::Serde(
                    ErrorInfo::new("manifest-mkdir", err.to_string())
                        .with_context("path", parent.display().to_string()),
                )
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|err| {
            WalkError::Serde(
                ErrorInfo::new("manifest-serialize", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        fs::write(path, json).map_err(|err| {
            WalkError::Serde(
                ErrorInfo::new("manifest-write", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }

    /// Loads a manifest from disk.
    pub fn load(path: &Path) -> Result<Self, WalkError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            WalkError::Serde(
                ErrorInfo::new("manifest-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        serde_json::from_str(&contents).map_err(|err| {
            WalkError::Serde(
                ErrorInfo::new("manifest-parse", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }
}

/// Hex SHA-256 over the little-endian bytes of every state in order.
pub fn state_hash<'a>(states: impl IntoIterator<Item = &'a [f64]>) -> String {
    let mut hasher = Sha256::new();
    for state in states {
        hasher.update((state.len() as u64).to_le_bytes());
        for x in state {
            hasher.update(x.to_le_bytes());
        }
    }
    format!("{:x}", hasher.finalize())
}

/// Current time for manifests.
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
