//! Single-server resource lanes.
//!
//! The two lanes are structurally identical; each owns a FIFO waiting queue
//! and tracks at most one in-service process. A lane that was idle at the
//! start of a tick only dispatches the queue head during that tick; service
//! begins on the following tick, which models the queue-entry latency.
//!
//! Lanes handle service bookkeeping (dispatch and remaining-time countdown)
//! and signal burst completion back to the simulation loop, which owns all
//! other state transitions.

use std::collections::VecDeque;

use crate::types::{Burst, LaneId, Pid, ProcState, Process};
use crate::utils::prelude::*;

/// What a lane did in one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    /// Nobody was served; the lane may have dispatched a new head
    Idle,
    /// One tick of service went to this process
    Served(Pid),
    /// The final tick of this process's resource burst was served
    Completed(Pid),
}

/// One single-server resource lane
#[derive(Debug, Clone)]
pub struct Lane {
    id: LaneId,
    queue: VecDeque<Pid>,
    serving: Option<Pid>,
}

impl Lane {
    pub fn new(id: LaneId) -> Self {
        Lane {
            id,
            queue: VecDeque::new(),
            serving: None,
        }
    }

    /// No process is in service or waiting
    pub fn drained(&self) -> bool {
        self.serving.is_none() && self.queue.is_empty()
    }

    /// Append a process to the waiting queue
    pub fn admit(&mut self, pid: Pid, procs: &mut [Process]) {
        procs[pid.index()].state = ProcState::ReadyForResource;
        self.queue.push_back(pid);
    }

    /// Run one tick of service for this lane
    pub fn service(&mut self, procs: &mut [Process]) -> Service {
        match self.serving {
            Some(pid) => {
                let p = &mut procs[pid.index()];
                p.remaining -= 1;
                if p.remaining == 0 {
                    self.serving = None;
                    Service::Completed(pid)
                } else {
                    Service::Served(pid)
                }
            }
            None => {
                if let Some(pid) = self.queue.pop_front() {
                    let p = &mut procs[pid.index()];
                    match p.current().map(Burst::len) {
                        Some(len) if len > 0 => {
                            p.state = ProcState::RunningOnResource;
                            p.remaining = len;
                            self.serving = Some(pid);
                        }
                        // every parsed burst has a positive length, so this
                        // only fires on a corrupted process table
                        _ => warn!(lane = %self.id, %pid, "dropping process with no active burst"),
                    }
                }
                Service::Idle
            }
        }
    }
}
