//! Timeline recording and the statistics derived from it.

use std::fmt;

use crate::types::{Pid, Process, Tick, LANE_COUNT};

/// One tick's occupancy of a server (the CPU or a resource lane)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Idle,
    Busy(Pid),
}

impl Slot {
    pub fn pid(&self) -> Option<Pid> {
        match *self {
            Slot::Idle => None,
            Slot::Busy(pid) => Some(pid),
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Slot::Idle => write!(f, "_"),
            Slot::Busy(pid) => write!(f, "{}", pid),
        }
    }
}

/// Per-tick occupancy of the CPU and both resource lanes, one entry per tick
#[derive(Debug, Clone, Default)]
pub struct Trace {
    pub cpu: Vec<Slot>,
    pub lanes: [Vec<Slot>; LANE_COUNT],
}

impl Trace {
    /// Number of recorded ticks
    pub fn len(&self) -> usize {
        self.cpu.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cpu.is_empty()
    }

    /// CPU timeline with trailing idle ticks dropped.
    /// Resource timelines are always reported in full length.
    pub fn cpu_trimmed(&self) -> &[Slot] {
        let end = self
            .cpu
            .iter()
            .rposition(|s| matches!(s, Slot::Busy(_)))
            .map_or(0, |i| i + 1);
        &self.cpu[..end]
    }
}

/// Final per-process figures
#[derive(Debug, Clone, Copy)]
pub struct ProcStats {
    pub id: Pid,
    pub arrival: Tick,
    /// sum of the process's own burst lengths
    pub service: u64,
    pub finish: Tick,
    pub turnaround: u64,
    pub waiting: u64,
}

/// Everything the simulation produced, queried once after the loop ends
#[derive(Debug, Clone)]
pub struct Report {
    pub trace: Trace,
    /// in process order
    pub stats: Vec<ProcStats>,
}

impl Report {
    pub fn new(trace: Trace, procs: &[Process]) -> Self {
        let stats = procs
            .iter()
            .map(|p| {
                // the loop only terminates once every process is finished
                let finish = p.finish.unwrap_or(p.arrival);
                ProcStats {
                    id: p.id,
                    arrival: p.arrival,
                    service: p.service_total(),
                    finish,
                    turnaround: finish - p.arrival,
                    waiting: p.waiting,
                }
            })
            .collect();
        Report { trace, stats }
    }
}
