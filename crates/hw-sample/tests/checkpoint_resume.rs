use std::path::Path;

use hw_sample::checkpoint::checkpoint_path;
use hw_sample::data::read_rows;
use hw_sample::{resume, run, CheckpointPayload, ConfigurationStore, RunConfig, SamplerProgress};
use tempfile::tempdir;

fn checkpoint_config(root: &Path) -> RunConfig {
    walk_checkpoint_config(root, "real")
}

fn walk_checkpoint_config(root: &Path, walk_type: &str) -> RunConfig {
    let mut config = RunConfig::from_yaml(&format!(
        "walk:\n  type: {walk_type}\n  dimension: 2\n  steps: 12\n\
         sampling: metropolis\nobservable: volume\ntheta: -2.0\n\
         iterations: 40\nt_eq: 5\n\
         checkpoint:\n  interval: 10\n  max_to_keep: 10\n\
         seed_policy:\n  realization_seed: 3\n  mc_seed: 4\n"
    ))
    .unwrap();
    config.output.run_directory = Some(root.join("run"));
    config.output.conf_file = Some("confs.bin".into());
    config
}

#[test]
fn checkpoints_are_written_on_the_interval() {
    let dir = tempdir().unwrap();
    let config = checkpoint_config(dir.path());
    let summary = run(&config, "test").unwrap();
    // sweeps 5..50 run, so checkpoints follow sweeps 10, 20, 30, 40 and 50
    assert_eq!(summary.checkpoints.len(), 5);
    let payload = CheckpointPayload::load(&summary.checkpoints[1]).unwrap();
    assert_eq!(payload.sweep, 20);
    assert_eq!(payload.seed, 4);
    assert_eq!(payload.replicas.len(), 1);
    assert_eq!(payload.progress.t_eq, 5);
    assert_eq!(payload.progress.measured, 10);
}

#[test]
fn retention_keeps_newest_checkpoints() {
    let dir = tempdir().unwrap();
    let mut config = checkpoint_config(dir.path());
    config.checkpoint.max_to_keep = 2;
    let summary = run(&config, "test").unwrap();
    let root = dir.path().join("run/checkpoints");
    assert_eq!(
        summary.checkpoints,
        vec![checkpoint_path(&root, 40), checkpoint_path(&root, 50)]
    );
    assert!(!checkpoint_path(&root, 30).exists());
}

fn assert_resume_matches_uninterrupted_run(walk_type: &str) {
    let dir = tempdir().unwrap();
    let config = walk_checkpoint_config(dir.path(), walk_type);
    let full = run(&config, "test").unwrap();
    let data = dir.path().join("run/data.dat");
    let full_rows = read_rows(&data).unwrap();
    let full_confs = ConfigurationStore::read_all(&dir.path().join("run/confs.bin")).unwrap();

    let checkpoint = checkpoint_path(&dir.path().join("run/checkpoints"), 20);
    let resumed = resume(&checkpoint, "test").unwrap();

    assert_eq!(resumed.state_hash, full.state_hash, "{walk_type}");
    assert_eq!(resumed.checksum, full.checksum, "{walk_type}");
    assert_eq!(resumed.checksum_error, full.checksum_error, "{walk_type}");
    assert_eq!(resumed.acceptance_rates, full.acceptance_rates, "{walk_type}");
    assert_eq!(resumed.samples.as_slice(), &full.samples[10..], "{walk_type}");
    assert_eq!(read_rows(&data).unwrap(), full_rows, "{walk_type}");
    let confs = ConfigurationStore::read_all(&dir.path().join("run/confs.bin")).unwrap();
    assert_eq!(confs, full_confs, "{walk_type}");
}

#[test]
fn resume_matches_uninterrupted_run() {
    assert_resume_matches_uninterrupted_run("real");
}

#[test]
fn lattice_resume_matches_uninterrupted_run() {
    assert_resume_matches_uninterrupted_run("lattice");
}

#[test]
fn loop_erased_resume_matches_uninterrupted_run() {
    assert_resume_matches_uninterrupted_run("loop-erased");
}

#[test]
fn self_avoiding_resume_matches_uninterrupted_run() {
    assert_resume_matches_uninterrupted_run("self-avoiding");
}

#[test]
fn true_self_avoiding_resume_matches_uninterrupted_run() {
    assert_resume_matches_uninterrupted_run("true-self-avoiding");
}

#[test]
fn only_metropolis_runs_resume() {
    let dir = tempdir().unwrap();
    let mut config = checkpoint_config(dir.path());
    config.sampling = hw_core::SamplingMethod::Simple;
    let path = dir.path().join("ckpt.json");
    CheckpointPayload {
        sweep: 1,
        config,
        seed: 0,
        progress: SamplerProgress::default(),
        replicas: vec![hw_sample::ReplicaCheckpoint {
            theta: 1.0,
            random_numbers: vec![0.5; 24],
        }],
    }
    .store(&path)
    .unwrap();
    let err = resume(&path, "test").unwrap_err();
    assert_eq!(err.code(), "resume-unsupported");
}
