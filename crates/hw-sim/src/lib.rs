//! Command line front end of the hullwalk samplers.
//!
//! The binary only parses arguments, installs logging and hands over to
//! [`cli::dispatch`]; every subcommand lives in [`commands`] and writes its
//! report to the given writer.

pub mod cli;
pub mod commands;
pub mod logging;

/// The command line as typed, recorded in the headers of data files.
pub fn invocation() -> String {
    std::env::args().collect::<Vec<_>>().join(" ")
}
