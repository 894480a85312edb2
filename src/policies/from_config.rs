use parse_display::Display;
use serde::{Deserialize, Serialize};

use super::*;

pub fn from_config(cfg: &PolicyConfig) -> Box<dyn Policy + 'static> {
    info!(policy = %cfg, "using");
    match *cfg {
        PolicyConfig::Fcfs => Box::new(Fcfs),
        PolicyConfig::RoundRobin { quantum } => Box::new(RoundRobin::new(quantum)),
        PolicyConfig::Sjf => Box::new(Sjf),
        PolicyConfig::Srtn => Box::new(Srtn),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Display)]
#[display("{}")]
pub enum PolicyConfig {
    Fcfs,
    RoundRobin {
        /// Maximum number of consecutive ticks a process may hold the CPU
        quantum: u64,
    },
    Sjf,
    Srtn,
}
