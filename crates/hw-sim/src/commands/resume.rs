use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use hw_sample::resume;

use crate::commands::run::report;
use crate::invocation;

#[derive(Args, Debug)]
pub struct ResumeArgs {
    /// Checkpoint written by an earlier Metropolis run.
    #[arg(long)]
    pub checkpoint: PathBuf,
}

pub fn execute(args: &ResumeArgs, out: &mut dyn Write) -> Result<(), Box<dyn Error>> {
    let summary = resume(&args.checkpoint, &invocation())?;
    report(&summary, out)
}
