use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use hw_core::{ErrorInfo, RngHandle, WalkError};
use hw_sample::determinism::replica_seed;
use hw_sample::{ConfigurationStore, RunConfig};
use hw_vis::{render, RenderFormat};
use hw_walk::{build_walker, Walker};

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// YAML configuration naming the walk.
    #[arg(long)]
    pub config: PathBuf,
    /// Output format: svg, gnuplot, povray or threejs.
    #[arg(long, default_value = "svg")]
    pub format: RenderFormat,
    /// File to write.
    #[arg(long)]
    pub out: PathBuf,
    /// Render a stored walk from this configuration file instead of a fresh one.
    #[arg(long)]
    pub conf: Option<PathBuf>,
    /// Position of the stored walk in `--conf`.
    #[arg(long, default_value_t = 0, requires = "conf")]
    pub index: usize,
}

fn stored_walker(
    config: &RunConfig,
    conf: &Path,
    index: usize,
) -> Result<Box<dyn Walker>, WalkError> {
    let records = ConfigurationStore::read_all(conf)?;
    let count = records.len();
    let record = records.into_iter().nth(index).ok_or_else(|| {
        WalkError::Config(
            ErrorInfo::new("conf-index", "no stored walk at this position")
                .with_context("index", index.to_string())
                .with_context("stored", count.to_string()),
        )
    })?;
    record.restore(&config.walker_params())
}

pub fn execute(args: &RenderArgs, out: &mut dyn Write) -> Result<(), Box<dyn Error>> {
    let config = RunConfig::load(&args.config)?;
    let walker = match &args.conf {
        Some(conf) => stored_walker(&config, conf, args.index)?,
        None => {
            let seed = replica_seed(config.seed_policy.realization_seed, 0);
            build_walker(&config.walker_params(), &mut RngHandle::from_seed(seed))?
        }
    };
    render(args.format, walker.as_ref(), &args.out)?;
    writeln!(
        out,
        "{} walk with {} hull vertices written to {}",
        args.format,
        walker.hull().num_vertices(),
        args.out.display()
    )?;
    Ok(())
}
