//! reviewpress CLI: turn a review article document into static HTML.
//!
//! Renders one article page per run and optionally folds it into a
//! cumulative, date-ordered site index.

mod commands;

use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);

    match commands::run(cli) {
        Ok(code) => Ok(code),
        Err(report) => {
            eprintln!("error: {report:#}");
            Ok(ExitCode::FAILURE)
        }
    }
}
