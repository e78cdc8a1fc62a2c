use std::error::Error;
use std::io;

use clap::Parser;
use hw_sim::cli::{dispatch, Cli};
use hw_sim::logging;

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet, cli.log_file.as_deref())?;
    dispatch(cli.command, &mut io::stdout().lock())
}
