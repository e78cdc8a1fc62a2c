use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use hw_sample::{ConfigurationStore, RunConfig};
use hw_walk::WalkerParams;
use serde_json::json;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Configuration file written by a run.
    #[arg(long)]
    pub conf: PathBuf,
    /// Run configuration supplying model parameters the records do not store.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// One JSON object per line instead of columns.
    #[arg(long)]
    pub json: bool,
}

/// Lists every stored walk with its volume `A` and surface `L`.
pub fn execute(args: &InspectArgs, out: &mut dyn Write) -> Result<(), Box<dyn Error>> {
    let base = match &args.config {
        Some(path) => RunConfig::load(path)?.walk,
        None => WalkerParams::default(),
    };
    let records = ConfigurationStore::read_all(&args.conf)?;
    if !args.json {
        writeln!(out, "# sweep type d N A L")?;
    }
    for record in &records {
        let walker = record.restore(&base)?;
        let (a, l) = (walker.volume(), walker.surface());
        if args.json {
            let line = json!({
                "sweep": record.sweep,
                "type": record.walk_type,
                "d": record.dimension,
                "N": record.num_steps,
                "A": a,
                "L": l,
            });
            writeln!(out, "{line}")?;
        } else {
            writeln!(
                out,
                "{} {} {} {} {a} {l}",
                record.sweep, record.walk_type, record.dimension, record.num_steps
            )?;
        }
    }
    Ok(())
}
