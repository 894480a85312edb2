use burstsim::utils;
use burstsim::utils::prelude::*;

mod cli;
mod commands;

fn main() -> Result<()> {
    // panic setup should be done early
    utils::panic::setup();

    // initialize Configuration
    utils::app_config::setup()?;

    // logging reads its settings from the configuration
    let _guard = utils::logging::setup()?;

    trace!("Start cli execution");

    // Match Commands
    cli::execute()
}
