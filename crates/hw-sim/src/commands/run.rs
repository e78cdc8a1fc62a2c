use std::error::Error;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use hw_sample::{run, RunConfig, RunSummary};
use tracing::info;

use crate::invocation;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// YAML configuration describing the run.
    #[arg(long)]
    pub config: PathBuf,
    /// Output directory for data, summary, manifest and checkpoints.
    #[arg(long)]
    pub out: PathBuf,
    /// Overrides the seed of the Markov chain.
    #[arg(long)]
    pub seed_mc: Option<u64>,
    /// Overrides the seed of the initial walks.
    #[arg(long)]
    pub seed_realization: Option<u64>,
}

/// Prints the headline numbers of a finished run.
pub fn report(summary: &RunSummary, out: &mut dyn Write) -> Result<(), Box<dyn Error>> {
    writeln!(
        out,
        "{} {}: {} +- {}",
        summary.sampling, summary.observable, summary.checksum, summary.checksum_error
    )?;
    if let Some(t_eq) = summary.t_eq {
        writeln!(out, "t_eq: {t_eq} (equilibrated: {})", summary.equilibrated)?;
    }
    for (pair, rate) in &summary.exchange_pairs {
        writeln!(out, "swap {pair}: {:.1}%", rate * 100.0)?;
    }
    writeln!(out, "state hash: {}", summary.state_hash)?;
    if let Some(path) = &summary.summary_path {
        writeln!(out, "summary: {}", path.display())?;
    }
    Ok(())
}

pub fn execute(args: &RunArgs, out: &mut dyn Write) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(&args.out)?;
    let mut config = RunConfig::load(&args.config)?;
    if let Some(seed) = args.seed_mc {
        config.seed_policy.mc_seed = seed;
    }
    if let Some(seed) = args.seed_realization {
        config.seed_policy.realization_seed = seed;
    }
    config.output.run_directory = Some(args.out.clone());

    // the stored copy includes the seed overrides
    fs::write(args.out.join("config.yaml"), config.to_yaml()?)?;

    let summary = run(&config, &invocation())?;
    info!(out = %args.out.display(), "run finished");
    report(&summary, out)
}
