use std::path::Path;

use hw_sample::data::{read_lines, read_rows};
use hw_sample::{run, RunConfig};
use tempfile::tempdir;

fn metropolis_config(run_directory: Option<&Path>) -> RunConfig {
    let mut config = RunConfig::from_yaml(
        "walk:\n  type: lattice\n  dimension: 2\n  steps: 16\n\
         sampling: metropolis\nobservable: surface\ntheta: -5.0\n\
         iterations: 30\nt_eq: 5\n\
         seed_policy:\n  realization_seed: 11\n  mc_seed: 12\n",
    )
    .unwrap();
    config.output.run_directory = run_directory.map(Path::to_path_buf);
    config
}

#[test]
fn repeated_runs_with_same_seed_match() {
    let config = metropolis_config(None);
    let a = run(&config, "test").unwrap();
    let b = run(&config, "test").unwrap();
    assert_eq!(a, b);
    assert_eq!(a.samples.len(), 30);
    assert_eq!(a.t_eq, Some(5));
    assert!(a.data_files.is_empty());
}

#[test]
fn different_mc_seeds_give_different_chains() {
    let config = metropolis_config(None);
    let mut other = config.clone();
    other.seed_policy.mc_seed = 13;
    let a = run(&config, "test").unwrap();
    let b = run(&other, "test").unwrap();
    assert_ne!(a.state_hash, b.state_hash);
}

#[test]
fn measured_rows_start_after_twice_the_equilibration_time() {
    let dir = tempdir().unwrap();
    let config = metropolis_config(Some(dir.path()));
    let summary = run(&config, "hw-sim run --config test.yml").unwrap();

    let data = dir.path().join("data.dat");
    assert_eq!(summary.data_files, vec![data.clone()]);
    let rows = read_rows(&data).unwrap();
    assert_eq!(rows.len(), 30);
    assert!(rows[0].starts_with("10 "));
    assert!(rows[29].starts_with("39 "));

    let lines = read_lines(&data).unwrap();
    assert_eq!(lines[0], "# hw-sim run --config test.yml");
    assert!(lines[1].starts_with("# sweep L A r r2"));
    assert!(lines.iter().any(|l| l.starts_with("# acceptance: ")));
    assert!(dir.path().join("manifest.json").exists());
    assert!(dir.path().join("summary.json").exists());

    let mean_s = summary.samples.iter().map(|m| m.s).sum::<f64>() / 30.0;
    assert!((summary.checksum - mean_s).abs() < 1e-9);
}

#[test]
fn infinite_temperature_accepts_every_change() {
    let mut config = metropolis_config(None);
    config.simple_sampling = true;
    let summary = run(&config, "test").unwrap();
    assert_eq!(summary.acceptance_rates.values().next(), Some(&1.0));
}

#[test]
fn automatic_equilibration_logs_every_sweep() {
    let dir = tempdir().unwrap();
    let mut config = metropolis_config(Some(dir.path()));
    config.t_eq = None;
    config.t_eq_max = 150;
    config.iterations = 10;
    let summary = run(&config, "test").unwrap();

    let t_eq = summary.t_eq.unwrap();
    assert!(t_eq <= 150);
    if !summary.equilibrated {
        assert_eq!(t_eq, 150);
    }
    let log = read_rows(&dir.path().join("equilibration.dat")).unwrap();
    assert_eq!(log.len(), t_eq);
    assert_eq!(log[0].split_whitespace().count(), 7);
    assert_eq!(summary.samples.len(), 10);
    assert_eq!(summary.samples[0].sweep, 2 * t_eq);
}

#[test]
fn gzip_data_files_are_supported() {
    let dir = tempdir().unwrap();
    let mut config = metropolis_config(Some(dir.path()));
    config.output.data_file = "data.dat.gz".into();
    run(&config, "test").unwrap();
    assert_eq!(read_rows(&dir.path().join("data.dat.gz")).unwrap().len(), 30);
}
