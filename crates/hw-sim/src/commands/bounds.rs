use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use hw_sample::{only_bounds, RunConfig};

#[derive(Args, Debug)]
pub struct BoundsArgs {
    /// YAML configuration naming the walk and observable.
    #[arg(long)]
    pub config: PathBuf,
}

/// Prints `min max` of the configured observable on one line.
pub fn execute(args: &BoundsArgs, out: &mut dyn Write) -> Result<(), Box<dyn Error>> {
    let config = RunConfig::load(&args.config)?;
    config.walk.validate()?;
    let (min, max) = only_bounds(&config)?;
    writeln!(out, "{min} {max}")?;
    Ok(())
}
