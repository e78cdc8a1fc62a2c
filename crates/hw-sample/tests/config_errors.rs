use hw_sample::{run, RunConfig};

fn error_code(yaml: &str) -> String {
    let config = RunConfig::from_yaml(yaml).unwrap();
    run(&config, "test").unwrap_err().code().to_string()
}

#[test]
fn invalid_configurations_are_rejected_with_codes() {
    assert_eq!(error_code("sweep: 0\n"), "invalid-sweep");
    assert_eq!(error_code("theta: 0\n"), "invalid-theta");
    assert_eq!(
        error_code("temperatures: [1.0, 2.0]\n"),
        "too-many-temperatures"
    );
    assert_eq!(
        error_code("sampling: parallel-tempering\n"),
        "missing-temperatures"
    );
    assert_eq!(
        error_code("sampling: parallel-tempering\ntemperatures: [1]\nestimated_correlation: 0\n"),
        "invalid-estimated-correlation"
    );
    assert_eq!(error_code("sampling: wang-landau\n"), "missing-borders");
    assert_eq!(
        error_code("sampling: wang-landau\nwang_landau:\n  borders: [1, 1]\n"),
        "invalid-borders"
    );
    assert_eq!(
        error_code("sampling: fast-wang-landau\nwang_landau:\n  borders: [1, 2]\n  flatness: 1.5\n"),
        "invalid-flatness"
    );
    assert_eq!(error_code("walk:\n  steps: 0\n"), "invalid-steps");
}

#[test]
fn unknown_labels_fail_to_parse() {
    let err = RunConfig::from_yaml("sampling: annealing\n").unwrap_err();
    assert_eq!(err.code(), "config-parse");
}

#[test]
fn configuration_survives_yaml_round_trip() {
    let config = RunConfig::from_yaml(
        "sampling: wang-landau\nwang_landau:\n  borders: [2, 4, 8]\n  bins: 7\n",
    )
    .unwrap();
    let back = RunConfig::from_yaml(&config.to_yaml().unwrap()).unwrap();
    assert_eq!(back, config);
}

#[test]
fn single_temperature_sets_metropolis_theta() {
    let mut config = RunConfig::from_yaml("temperatures: [-3.5]\n").unwrap();
    config.validate().unwrap();
    assert_eq!(config.theta, -3.5);
}
