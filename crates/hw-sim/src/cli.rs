use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::commands::{
    bounds::{self, BoundsArgs},
    centers::{self, CentersArgs},
    inspect::{self, InspectArgs},
    render::{self, RenderArgs},
    resume::{self, ResumeArgs},
    run::{self, RunArgs},
};

#[derive(Parser, Debug)]
#[command(
    name = "hw-sim",
    version,
    about = "Large deviations of convex hulls of random walks"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
    /// More log output; repeat for trace level. `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
    /// Also append log lines to this file.
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the sampler described by a YAML configuration.
    Run(RunArgs),
    /// Continue a Metropolis run from a checkpoint.
    Resume(ResumeArgs),
    /// Print the smallest and largest reachable value of the observable.
    Bounds(BoundsArgs),
    /// Print the Wang-Landau bin centers of every range.
    Centers(CentersArgs),
    /// Build one walk and render it with its hull.
    Render(RenderArgs),
    /// List the walks of a configuration file.
    Inspect(InspectArgs),
}

/// Runs a parsed subcommand, writing its report to `out`.
pub fn dispatch(command: Command, out: &mut dyn Write) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Run(args) => run::execute(&args, out),
        Command::Resume(args) => resume::execute(&args, out),
        Command::Bounds(args) => bounds::execute(&args, out),
        Command::Centers(args) => centers::execute(&args, out),
        Command::Render(args) => render::execute(&args, out),
        Command::Inspect(args) => inspect::execute(&args, out),
    }
}
