#![deny(missing_docs)]

//! Large deviation sampling of convex hulls of random walks.
//!
//! A run is described by a YAML [`RunConfig`] and dispatched by [`run`] to
//! simple sampling, biased Metropolis, parallel tempering or one of the two
//! Wang-Landau flavours. Every random draw derives from the configured seeds,
//! so runs and checkpoint resumes are reproducible.

/// Checkpoint payloads and retention.
pub mod checkpoint;
/// YAML configuration schema and defaults.
pub mod config;
/// Append-only store of sampled walks.
pub mod configurations;
/// Measurement files and rows.
pub mod data;
/// Deterministic seed derivation helpers.
pub mod determinism;
/// 1/t Wang-Landau with entropic sampling.
pub mod fast_wang_landau;
/// Histograms and the density of states.
pub mod histogram;
/// Sampler dispatch and the public `run`/`resume` entry points.
pub mod kernel;
/// Run manifest serialization helpers.
pub mod manifest;
/// Metropolis sweeps and equilibration.
pub mod metropolis;
mod simple;
/// Moments, rolling means and the bootstrap.
pub mod stat;
/// Replica exchange between temperatures.
pub mod tempering;
/// Wang-Landau over overlapping ranges.
pub mod wang_landau;

pub use checkpoint::{CheckpointPayload, ReplicaCheckpoint, SamplerProgress};
pub use config::{CheckpointConfig, OutputConfig, RunConfig, SeedPolicy, WangLandauConfig};
pub use configurations::{ConfigurationStore, StoredConfiguration};
pub use data::{DataWriter, Measurement};
pub use histogram::{DensityOfStates, Histogram, HistogramNd};
pub use kernel::{load_summary, resume, run, RunSummary};
pub use manifest::RunManifest;
pub use metropolis::only_bounds;
pub use stat::{AcceptanceStats, Bootstrap, RollingMean};
pub use wang_landau::{only_centers, Range};
