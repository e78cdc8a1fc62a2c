use hw_core::RngHandle;
use hw_sample::data::{indexed_path, read_rows};
use hw_sample::tempering::{attempt_exchange, exchange_acceptance};
use hw_sample::{run, RunConfig};
use tempfile::tempdir;

fn tempering_config() -> RunConfig {
    RunConfig::from_yaml(
        "walk:\n  type: lattice\n  steps: 12\n\
         sampling: parallel-tempering\nobservable: surface\n\
         temperatures: [-1.0, -5.0, 20.0]\n\
         iterations: 20\nestimated_correlation: 5\n\
         seed_policy:\n  realization_seed: 8\n  mc_seed: 9\n",
    )
    .unwrap()
}

#[test]
fn one_data_file_per_temperature() {
    let dir = tempdir().unwrap();
    let mut config = tempering_config();
    config.output.run_directory = Some(dir.path().to_path_buf());
    let summary = run(&config, "test").unwrap();

    assert_eq!(summary.data_files.len(), 3);
    for (k, theta) in [-1.0, -5.0, 20.0].iter().enumerate() {
        let path = indexed_path(&dir.path().join("data.dat"), k);
        assert_eq!(summary.data_files[k], path);
        let rows = read_rows(&path).unwrap();
        assert_eq!(rows.len(), 20);
        let last: f64 = rows[0].split_whitespace().last().unwrap().parse().unwrap();
        assert_eq!(last, *theta);
    }
    assert_eq!(summary.samples.len(), 20);
}

#[test]
fn exchange_statistics_cover_neighbouring_pairs() {
    let summary = run(&tempering_config(), "test").unwrap();
    assert_eq!(summary.replica_temperatures, vec![-1.0, -5.0, 20.0]);
    let keys: Vec<&String> = summary.exchange_pairs.keys().collect();
    assert_eq!(keys, vec!["-1 <-> -5", "-5 <-> 20"]);
    assert_eq!(summary.exchange_acceptance.len(), 2);
    assert!(summary
        .exchange_acceptance
        .iter()
        .all(|rate| (0.0..=1.0).contains(rate)));
    assert_eq!(summary.state_hash.len(), 64);
}

#[test]
fn tempering_is_deterministic() {
    let config = tempering_config();
    assert_eq!(run(&config, "test").unwrap(), run(&config, "test").unwrap());
}

#[test]
fn exchange_probability_matches_the_metropolis_rule() {
    let p = exchange_acceptance(10.0, 2.0, 12.0, 4.0);
    assert!((p - (-(0.5 - 0.25) * 2.0_f64).exp()).abs() < 1e-12);
    assert_eq!(exchange_acceptance(12.0, 2.0, 10.0, 4.0), 1.0);
    assert_eq!(exchange_acceptance(12.0, -2.0, 10.0, -4.0), 1.0);
    let p_negative = exchange_acceptance(10.0, -2.0, 12.0, -4.0);
    assert!((p_negative - 0.5_f64.exp()).abs() < 1e-12);

    let mut rng = RngHandle::from_seed(1);
    let accepted = (0..10_000)
        .filter(|_| attempt_exchange(10.0, 2.0, 12.0, 4.0, &mut rng).0)
        .count() as f64
        / 10_000.0;
    assert!((accepted - p).abs() < 0.02);
}
