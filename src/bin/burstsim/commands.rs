use std::path::PathBuf;

use structopt::StructOpt;

use burstsim::utils::prelude::*;
use burstsim::SimConfig;

/// Should be implemented by individual subcommand
pub trait Cmd {
    fn run(self) -> Result<()>;
}

/// Show the resolved configuration
#[derive(StructOpt)]
pub struct Config {}

impl Cmd for Config {
    fn run(self) -> Result<()> {
        let cfg: SimConfig = config().fetch()?;
        println!("{}", serde_yaml::to_string(&cfg)?);

        Ok(())
    }
}

/// Run a workload to completion
#[derive(StructOpt)]
pub struct Run {
    /// Workload description file
    #[structopt(parse(from_os_str))]
    input: PathBuf,

    /// Write the text report here instead of stdout
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
}

impl Cmd for Run {
    fn run(self) -> Result<()> {
        config_mut().set("input", self.input.to_string_lossy().into_owned())?;
        if let Some(output) = &self.output {
            config_mut().set("outputs.text", output.to_string_lossy().into_owned())?;
        }

        burstsim::run_sim()
    }
}
