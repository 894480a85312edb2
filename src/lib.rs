use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::anyhow;

use crate::config::AppConfigExt;
use crate::utils::prelude::*;

mod config;
mod lanes;
mod output;
mod policies;
mod simulator;
mod trace;
mod types;
pub mod utils;
mod workload;

/// Top level simulation config, fetched from the application config
#[derive(Debug, serde::Deserialize, serde::Serialize)]
pub struct SimConfig {
    /// workload description file
    #[serde(default)]
    input: Option<PathBuf>,
    #[serde(default)]
    outputs: output::OutputConfig,
}

pub fn run_sim() -> Result<()> {
    let _g = info_span!("sim").entered();

    let cfg: SimConfig = config().fetch()?;
    let input = cfg
        .input
        .as_ref()
        .ok_or_else(|| anyhow!("no workload input configured"))?;

    let report = {
        let _g = info_span!("run").entered();

        let workload = workload::parse(&fs::read_to_string(input)?)?;
        info!(
            processes = workload.processes.len(),
            policy = %workload.policy,
            lanes = ?workload.lane_labels,
            "workload loaded"
        );

        simulator::simulate(workload)
    };

    // outputs
    {
        let _g = info_span!("output").entered();
        match &cfg.outputs.text {
            Some(name) => {
                let path = config().output_dir()?.file(name)?;
                let file = io::BufWriter::new(fs::File::create(path)?);
                output::render_text(&report, file)?;
            }
            None => output::render_text(&report, io::stdout().lock())?,
        }
        if let Some(name) = &cfg.outputs.stats_csv {
            let path = config().output_dir()?.file(name)?;
            output::render_stats_csv(&report, &path)?;
        }
        if let Some(name) = &cfg.outputs.chrome_trace {
            let path = config().output_dir()?.file(name)?;
            output::render_chrome_trace(&report, &path)?;
        }
    }

    Ok(())
}
