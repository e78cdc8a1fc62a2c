use hw_sample::data::read_rows;
use hw_sample::{run, ConfigurationStore, RunConfig};
use tempfile::tempdir;

fn simple_config() -> RunConfig {
    RunConfig::from_yaml(
        "walk:\n  type: gaussian\n  dimension: 2\n  steps: 20\n\
         sampling: simple\niterations: 25\npassage_time_starts: [0, 5]\n",
    )
    .unwrap()
}

#[test]
fn every_sample_gets_a_row_and_a_configuration() {
    let dir = tempdir().unwrap();
    let mut config = simple_config();
    config.output.run_directory = Some(dir.path().to_path_buf());
    config.output.conf_file = Some("confs.bin".into());
    let summary = run(&config, "test").unwrap();

    let rows = read_rows(&dir.path().join("data.dat")).unwrap();
    assert_eq!(rows.len(), 25);
    // 15 observables plus two passage times
    assert_eq!(rows[0].split_whitespace().count(), 17);

    let confs = ConfigurationStore::read_all(&dir.path().join("confs.bin")).unwrap();
    assert_eq!(confs.len(), 25);
    for (record, sample) in confs.iter().zip(&summary.samples) {
        let walker = record.restore(&config.walk).unwrap();
        assert_eq!(walker.surface(), sample.l);
        assert_eq!(walker.volume(), sample.a);
    }
}

#[test]
fn samples_are_independent_draws() {
    let summary = run(&simple_config(), "test").unwrap();
    assert_eq!(summary.samples.len(), 25);
    assert!(summary
        .samples
        .windows(2)
        .any(|w| w[0].a != w[1].a));
    assert!(summary.checksum > 0.0);
    assert!(summary.checksum_error > 0.0);
    assert_eq!(summary.t_eq, None);
}

#[test]
fn sampled_passage_uses_the_first_start_time() {
    let config = RunConfig::from_yaml(
        "walk:\n  type: lattice\n  dimension: 2\n  steps: 30\n\
         sampling: simple\niterations: 20\nobservable: passage\n\
         passage_time_starts: [6, 0]\n",
    )
    .unwrap();
    let summary = run(&config, "test").unwrap();
    for sample in &summary.samples {
        assert_eq!(sample.s, sample.passages[0].map_or(-1.0, |t| t as f64));
    }
    assert!(summary.samples.iter().any(|m| m.passages[0] != m.passages[1]));
}
