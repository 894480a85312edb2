//! CPU dispatch policies.
//!
//! A policy is consulted exactly once per tick, before the CPU executes.
//! It only reads process fields; all state transitions are applied by the
//! simulation loop. The round robin quantum counter is the sole piece of
//! policy state that persists across ticks.

use std::collections::VecDeque;

use crate::types::{Pid, Process, Tick};
use crate::utils::prelude::*;

mod from_config;
pub use from_config::{from_config, PolicyConfig};

/// Decides which ready process, if any, holds the CPU for the coming tick.
pub trait Policy {
    /// `running` is the occupant carried over from the previous tick; the
    /// return value is the occupant for this tick. Implementations remove
    /// the chosen pid from `ready` and push any evicted process to the back
    /// of `ready` themselves.
    fn dispatch(&mut self, running: Option<Pid>, ready: &mut VecDeque<Pid>, procs: &[Process])
        -> Option<Pid>;
}

impl Policy for Box<dyn Policy> {
    #[inline]
    fn dispatch(
        &mut self,
        running: Option<Pid>,
        ready: &mut VecDeque<Pid>,
        procs: &[Process],
    ) -> Option<Pid> {
        (**self).dispatch(running, ready, procs)
    }
}

fn lookup(procs: &[Process], pid: Pid) -> &Process {
    &procs[pid.index()]
}

/// Position in `ready` of the process with the smallest remaining time.
/// Ties go to the later arrival.
fn shortest(ready: &VecDeque<Pid>, procs: &[Process]) -> Option<usize> {
    let mut best: Option<(usize, u64, Tick)> = None;
    for (idx, &pid) in ready.iter().enumerate() {
        let p = lookup(procs, pid);
        let beats = match best {
            None => true,
            Some((_, rem, arr)) => p.remaining < rem || (p.remaining == rem && p.arrival > arr),
        };
        if beats {
            best = Some((idx, p.remaining, p.arrival));
        }
    }
    best.map(|(idx, ..)| idx)
}

/// First-come-first-served, non-preemptive
#[derive(Debug, Default)]
pub struct Fcfs;

impl Policy for Fcfs {
    fn dispatch(
        &mut self,
        running: Option<Pid>,
        ready: &mut VecDeque<Pid>,
        _procs: &[Process],
    ) -> Option<Pid> {
        running.or_else(|| ready.pop_front())
    }
}

/// FIFO dispatch with forced eviction after a fixed quantum of ticks
#[derive(Debug)]
pub struct RoundRobin {
    quantum: u64,
    left: u64,
}

impl RoundRobin {
    pub fn new(quantum: u64) -> Self {
        RoundRobin { quantum, left: 0 }
    }
}

impl Policy for RoundRobin {
    fn dispatch(
        &mut self,
        running: Option<Pid>,
        ready: &mut VecDeque<Pid>,
        _procs: &[Process],
    ) -> Option<Pid> {
        if let Some(pid) = running {
            self.left -= 1;
            if self.left > 0 {
                return Some(pid);
            }
            debug!(%pid, "quantum expired");
            ready.push_back(pid);
        }
        let next = ready.pop_front();
        if next.is_some() {
            self.left = self.quantum;
        }
        next
    }
}

/// Shortest-job-first, non-preemptive
#[derive(Debug, Default)]
pub struct Sjf;

impl Policy for Sjf {
    fn dispatch(
        &mut self,
        running: Option<Pid>,
        ready: &mut VecDeque<Pid>,
        procs: &[Process],
    ) -> Option<Pid> {
        running.or_else(|| shortest(ready, procs).and_then(|idx| ready.remove(idx)))
    }
}

/// Shortest-remaining-time-next, the preemptive variant of SJF
#[derive(Debug, Default)]
pub struct Srtn;

impl Policy for Srtn {
    fn dispatch(
        &mut self,
        running: Option<Pid>,
        ready: &mut VecDeque<Pid>,
        procs: &[Process],
    ) -> Option<Pid> {
        let cur = match running {
            Some(cur) => cur,
            None => return shortest(ready, procs).and_then(|idx| ready.remove(idx)),
        };
        if let Some(idx) = shortest(ready, procs) {
            let cand = lookup(procs, ready[idx]);
            let run = lookup(procs, cur);
            if cand.remaining < run.remaining
                || (cand.remaining == run.remaining && cand.arrival > run.arrival)
            {
                debug!(preempted = %cur, by = %cand.id, "SRTN preemption");
                let cand = ready.remove(idx);
                ready.push_back(cur);
                return cand;
            }
        }
        Some(cur)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Burst;

    fn cpu_proc(id: u32, arrival: u64, len: u64) -> Process {
        let mut p = Process::new(Pid(id), Tick(arrival), vec![Burst::Cpu { len }]);
        p.state = crate::types::ProcState::ReadyForCpu;
        p
    }

    fn ready_of(pids: &[u32]) -> VecDeque<Pid> {
        pids.iter().map(|&id| Pid(id)).collect()
    }

    #[test]
    fn fcfs_keeps_admission_order() {
        let procs = vec![cpu_proc(1, 0, 9), cpu_proc(2, 0, 1)];
        let mut ready = ready_of(&[1, 2]);
        let mut fcfs = Fcfs;
        assert_eq!(fcfs.dispatch(None, &mut ready, &procs), Some(Pid(1)));
        // non-preemptive: the shorter job in the queue never takes over
        assert_eq!(fcfs.dispatch(Some(Pid(1)), &mut ready, &procs), Some(Pid(1)));
        assert_eq!(ready, ready_of(&[2]));
    }

    #[test]
    fn round_robin_evicts_on_quantum_expiry() {
        let procs = vec![cpu_proc(1, 0, 4), cpu_proc(2, 0, 4)];
        let mut ready = ready_of(&[1, 2]);
        let mut rr = RoundRobin::new(2);

        let mut occupant = None;
        let mut order = vec![];
        for _ in 0..8 {
            occupant = rr.dispatch(occupant, &mut ready, &procs);
            order.push(occupant.unwrap().0);
        }
        assert_eq!(order, vec![1, 1, 2, 2, 1, 1, 2, 2]);
    }

    #[test]
    fn sjf_picks_smallest_remaining() {
        let procs = vec![cpu_proc(1, 0, 4), cpu_proc(2, 0, 2), cpu_proc(3, 0, 7)];
        let mut ready = ready_of(&[1, 2, 3]);
        let mut sjf = Sjf;
        assert_eq!(sjf.dispatch(None, &mut ready, &procs), Some(Pid(2)));
        assert_eq!(ready, ready_of(&[1, 3]));
    }

    #[test]
    fn sjf_tie_goes_to_later_arrival() {
        let procs = vec![cpu_proc(1, 0, 3), cpu_proc(2, 5, 3)];
        let mut ready = ready_of(&[1, 2]);
        let mut sjf = Sjf;
        assert_eq!(sjf.dispatch(None, &mut ready, &procs), Some(Pid(2)));
    }

    #[test]
    fn srtn_preempts_strictly_shorter_candidate() {
        let mut procs = vec![cpu_proc(1, 0, 8), cpu_proc(2, 1, 3)];
        procs[0].remaining = 7; // one tick already executed
        let mut ready = ready_of(&[2]);
        let mut srtn = Srtn;
        assert_eq!(srtn.dispatch(Some(Pid(1)), &mut ready, &procs), Some(Pid(2)));
        // the evicted process goes to the back of the queue
        assert_eq!(ready, ready_of(&[1]));
    }

    #[test]
    fn srtn_keeps_runner_on_tie_with_earlier_arrival() {
        let procs = vec![cpu_proc(1, 3, 5), cpu_proc(2, 1, 5)];
        let mut ready = ready_of(&[2]);
        let mut srtn = Srtn;
        // candidate ties on remaining but arrived earlier: no preemption
        assert_eq!(srtn.dispatch(Some(Pid(1)), &mut ready, &procs), Some(Pid(1)));
        assert_eq!(ready, ready_of(&[2]));
    }

    #[test]
    fn srtn_preempts_on_tie_with_later_arrival() {
        let procs = vec![cpu_proc(1, 1, 5), cpu_proc(2, 3, 5)];
        let mut ready = ready_of(&[2]);
        let mut srtn = Srtn;
        assert_eq!(srtn.dispatch(Some(Pid(1)), &mut ready, &procs), Some(Pid(2)));
    }
}
