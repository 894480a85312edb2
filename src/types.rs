use std::fmt;
use std::ops::{Add, AddAssign, Sub};

use parse_display::Display;
use serde::{Deserialize, Serialize};

/// A time point in simulation, measured in whole ticks since start
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize,
)]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);
}

impl Add<u64> for Tick {
    type Output = Tick;

    fn add(self, rhs: u64) -> Self::Output {
        Tick(self.0 + rhs)
    }
}

impl AddAssign<u64> for Tick {
    fn add_assign(&mut self, rhs: u64) {
        self.0 += rhs;
    }
}

impl Sub for Tick {
    type Output = u64;

    fn sub(self, rhs: Self) -> Self::Output {
        self.0 - rhs.0
    }
}

/// Process identifier, 1-based in workload order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
pub struct Pid(pub u32);

impl Pid {
    /// Position of this process in the workload-ordered process table
    pub fn index(self) -> usize {
        self.0 as usize - 1
    }
}

/// Index of a resource lane. Lanes are displayed 1-based (`R1`, `R2`)
/// but stored 0-based so they can index the lane array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LaneId(pub usize);

/// Number of resource lanes in the system
pub const LANE_COUNT: usize = 2;

impl fmt::Display for LaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0 + 1)
    }
}

/// One uninterrupted unit of required service time within a process's lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Burst {
    /// Needs the CPU for `len` ticks
    Cpu { len: u64 },
    /// Needs exclusive use of one resource lane for `len` ticks
    Resource { len: u64, lane: LaneId },
}

impl Burst {
    pub fn len(&self) -> u64 {
        match *self {
            Burst::Cpu { len } => len,
            Burst::Resource { len, .. } => len,
        }
    }

    pub fn is_cpu(&self) -> bool {
        matches!(self, Burst::Cpu { .. })
    }

    pub fn lane(&self) -> Option<LaneId> {
        match *self {
            Burst::Cpu { .. } => None,
            Burst::Resource { lane, .. } => Some(lane),
        }
    }
}

impl fmt::Display for Burst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Burst::Cpu { len } => write!(f, "{}", len),
            Burst::Resource { len, lane } => write!(f, "{}({})", len, lane),
        }
    }
}

/// Lifecycle state of a process.
///
/// `Finished` is terminal and entered exactly once, when the last burst
/// completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ProcState {
    NotArrived,
    ReadyForCpu,
    RunningOnCpu,
    ReadyForResource,
    RunningOnResource,
    Finished,
}

/// A single process: its immutable burst plan plus mutable runtime state.
///
/// All runtime fields are owned and mutated by the simulation loop only;
/// policies and lanes observe them through shared references.
#[derive(Debug, Clone)]
pub struct Process {
    pub id: Pid,
    pub arrival: Tick,
    pub bursts: Vec<Burst>,

    /// index into `bursts`, only ever increases
    pub cur_burst: usize,
    /// ticks left in the active burst
    pub remaining: u64,
    pub state: ProcState,
    /// total ticks spent neither on the CPU nor on a resource lane
    pub waiting: u64,
    /// tick at which the process most recently became ready for the CPU
    pub ready_since: Tick,
    /// set once, when the last burst completes
    pub finish: Option<Tick>,
}

impl Process {
    pub fn new(id: Pid, arrival: Tick, bursts: Vec<Burst>) -> Self {
        let remaining = bursts.first().map(Burst::len).unwrap_or(0);
        Process {
            id,
            arrival,
            bursts,
            cur_burst: 0,
            remaining,
            state: ProcState::NotArrived,
            waiting: 0,
            ready_since: arrival,
            finish: None,
        }
    }

    /// The burst the process is currently working towards, if any remain
    pub fn current(&self) -> Option<&Burst> {
        self.bursts.get(self.cur_burst)
    }

    /// Sum of all burst lengths, i.e. the pure service demand
    pub fn service_total(&self) -> u64 {
        self.bursts.iter().map(Burst::len).sum()
    }
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}(@{}, {}/{} bursts)", self.id, self.arrival, self.cur_burst, self.bursts.len())
    }
}
