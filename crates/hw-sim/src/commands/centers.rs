use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use hw_sample::{only_centers, RunConfig};

#[derive(Args, Debug)]
pub struct CentersArgs {
    /// YAML configuration with a `wang_landau` section.
    #[arg(long)]
    pub config: PathBuf,
}

/// Prints the bin centers of each range on its own line.
pub fn execute(args: &CentersArgs, out: &mut dyn Write) -> Result<(), Box<dyn Error>> {
    let mut config = RunConfig::load(&args.config)?;
    config.validate()?;
    for centers in only_centers(&config.wang_landau) {
        let line: Vec<String> = centers.iter().map(f64::to_string).collect();
        writeln!(out, "{}", line.join(" "))?;
    }
    Ok(())
}
