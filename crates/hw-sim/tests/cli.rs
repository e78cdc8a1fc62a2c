use std::fs;
use std::path::Path;

use clap::Parser;
use hw_sample::load_summary;
use hw_sim::cli::{dispatch, Cli};
use tempfile::tempdir;

const METROPOLIS: &str = "walk:\n  type: lattice\n  dimension: 2\n  steps: 12\n\
sampling: metropolis\nobservable: surface\ntheta: -5.0\niterations: 20\nt_eq: 3\n\
checkpoint:\n  interval: 8\n\
output:\n  conf_file: confs.bin\n\
seed_policy:\n  realization_seed: 4\n  mc_seed: 5\n";

const WANG_LANDAU: &str = "walk:\n  type: real\n  steps: 10\nsampling: wang-landau\n\
wang_landau:\n  borders: [12, 6, 9]\n  bins: 4\n  overlap: 1\n";

fn write_config(dir: &Path, name: &str, text: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path.display().to_string()
}

fn invoke(args: &[&str]) -> String {
    let cli = Cli::try_parse_from(args).unwrap();
    let mut out = Vec::new();
    dispatch(cli.command, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn run_writes_artefacts_and_config_copy() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "run.yml", METROPOLIS);
    let out = dir.path().join("out");
    let report = invoke(&[
        "hw-sim",
        "run",
        "--config",
        &config,
        "--out",
        out.to_str().unwrap(),
        "--seed-mc",
        "77",
    ]);
    assert!(report.contains("state hash: "));
    assert!(out.join("data.dat").exists());
    assert!(out.join("confs.bin").exists());

    let copy = fs::read_to_string(out.join("config.yaml")).unwrap();
    assert!(copy.contains("mc_seed: 77"));

    let summary = load_summary(&out.join("summary.json")).unwrap();
    assert_eq!(summary.samples.len(), 20);
    assert_eq!(summary.t_eq, Some(3));
}

#[test]
fn resume_and_inspect_use_run_outputs() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "run.yml", METROPOLIS);
    let out = dir.path().join("out");
    invoke(&["hw-sim", "run", "--config", &config, "--out", out.to_str().unwrap()]);
    let summary = load_summary(&out.join("summary.json")).unwrap();
    let checkpoint = summary.checkpoints.first().unwrap().clone();

    let report = invoke(&["hw-sim", "resume", "--checkpoint", checkpoint.to_str().unwrap()]);
    assert!(report.contains(&summary.state_hash));

    let conf = out.join("confs.bin");
    let listing = invoke(&["hw-sim", "inspect", "--conf", conf.to_str().unwrap()]);
    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(lines[0], "# sweep type d N A L");
    assert_eq!(lines.len(), 21);
    assert!(lines[1].starts_with("6 lattice 2 12 "));

    let json = invoke(&["hw-sim", "inspect", "--conf", conf.to_str().unwrap(), "--json"]);
    let first: serde_json::Value = serde_json::from_str(json.lines().next().unwrap()).unwrap();
    assert_eq!(first["type"], "lattice");
}

#[test]
fn centers_follow_sorted_borders() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "wl.yml", WANG_LANDAU);
    let printed = invoke(&["hw-sim", "centers", "--config", &config]);
    let ranges: Vec<Vec<f64>> = printed
        .lines()
        .map(|l| l.split(' ').map(|v| v.parse().unwrap()).collect())
        .collect();
    assert_eq!(ranges.len(), 2);
    assert_eq!(ranges[0], vec![6.375, 7.125, 7.875, 8.625]);
    assert_eq!(ranges[1].len(), 5);
    assert_eq!(ranges[1][0], 8.625);
}

#[test]
fn bounds_print_min_and_max() {
    let dir = tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "bounds.yml",
        "walk:\n  steps: 10\n  hull_algorithm: andrew\nobservable: surface\n",
    );
    let printed = invoke(&["hw-sim", "bounds", "--config", &config]);
    assert_eq!(printed.trim(), "2 20");
}

#[test]
fn render_accepts_every_format() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "walk.yml", "walk:\n  dimension: 3\n  steps: 30\n");
    for format in ["svg", "gnuplot", "povray", "threejs"] {
        let target = dir.path().join(format!("walk.{format}"));
        let report = invoke(&[
            "hw-sim",
            "render",
            "--config",
            &config,
            "--format",
            format,
            "--out",
            target.to_str().unwrap(),
        ]);
        assert!(report.starts_with(format));
        assert!(fs::read_to_string(&target).unwrap().len() > 100);
    }
}

#[test]
fn unknown_format_is_rejected_by_the_parser() {
    let parsed = Cli::try_parse_from([
        "hw-sim", "render", "--config", "a.yml", "--format", "png", "--out", "a.png",
    ]);
    assert!(parsed.is_err());
}

#[test]
fn global_flags_are_accepted_after_the_subcommand() {
    let cli = Cli::try_parse_from(["hw-sim", "centers", "--config", "a.yml", "-vv"]).unwrap();
    assert_eq!(cli.verbose, 2);
    assert!(!cli.quiet);
    assert!(Cli::try_parse_from(["hw-sim", "-q", "-v", "centers", "--config", "a.yml"]).is_err());
}
