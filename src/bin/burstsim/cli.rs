use std::path::PathBuf;

use structopt::StructOpt;

use burstsim::utils::prelude::*;

use crate::commands::{self, Cmd};

/// Tick-by-tick CPU scheduling simulator
#[derive(StructOpt)]
#[structopt(name = "burstsim")]
pub struct Cli {
    /// Set a custom config file
    #[structopt(short, long, value_name = "FILE", parse(from_os_str))]
    config: Option<PathBuf>,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt)]
pub enum Command {
    /// Show the resolved configuration
    Config(commands::Config),
    /// Run a workload to completion
    Run(commands::Run),
}

/// Match commands
pub fn execute() -> Result<()> {
    let cli = Cli::from_args();

    // Merge config file if the value is set
    if let Some(path) = &cli.config {
        config_mut().use_file(path)?;
    }

    match cli.command {
        Command::Config(cmd) => cmd.run(),
        Command::Run(cmd) => cmd.run(),
    }
}
