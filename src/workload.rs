//! Parsing of the textual workload description into typed processes.
//!
//! The format is line oriented: a header line selecting the algorithm
//! (and quantum for round robin) plus the process count, then one line per
//! process holding its arrival tick followed by burst tokens. A bare
//! integer is a CPU burst; `N(label)` is a resource burst on the named
//! resource. Labels are mapped to lanes in first-seen order.

use std::collections::HashMap;

use thiserror::Error;

use crate::policies::PolicyConfig;
use crate::types::{Burst, LaneId, Pid, Process, Tick, LANE_COUNT};

#[derive(Error, Debug)]
pub enum WorkloadError {
    #[error("workload is empty")]
    Empty,
    #[error("malformed header line `{0}`")]
    BadHeader(String),
    #[error("unknown algorithm number {0}, expected 1 (FCFS), 2 (RR), 3 (SJF) or 4 (SRTN)")]
    UnknownAlgorithm(u64),
    #[error("round robin quantum must be positive")]
    ZeroQuantum,
    #[error("expected {expected} process lines, found {found}")]
    MissingProcesses { expected: usize, found: usize },
    #[error("process {pid}: malformed token `{token}`")]
    BadToken { pid: Pid, token: String },
    #[error("process {pid}: missing closing parenthesis in `{token}`")]
    UnclosedResource { pid: Pid, token: String },
    #[error("process {pid}: burst duration must be positive in `{token}`")]
    ZeroBurst { pid: Pid, token: String },
    #[error("too many distinct resource labels (`{label}`), at most {} supported", LANE_COUNT)]
    TooManyResources { label: String },
    #[error("process {pid} has no bursts")]
    NoBursts { pid: Pid },
    #[error("process {pid}: first burst must be a CPU burst")]
    FirstBurstNotCpu { pid: Pid },
}

/// A fully validated simulation input
#[derive(Debug, Clone)]
pub struct Workload {
    pub policy: PolicyConfig,
    pub processes: Vec<Process>,
    /// resource labels in lane order, as first seen in the input
    pub lane_labels: Vec<String>,
}

pub fn parse(text: &str) -> Result<Workload, WorkloadError> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());

    let header = lines.next().ok_or(WorkloadError::Empty)?;
    let (policy, count) = parse_header(header)?;

    let mut lanes = LaneMap::default();
    let mut processes = Vec::with_capacity(count);
    for (i, line) in lines.take(count).enumerate() {
        let pid = Pid(i as u32 + 1);
        processes.push(parse_process(pid, line, &mut lanes)?);
    }
    if processes.len() < count {
        return Err(WorkloadError::MissingProcesses {
            expected: count,
            found: processes.len(),
        });
    }

    Ok(Workload {
        policy,
        processes,
        lane_labels: lanes.labels,
    })
}

fn parse_header(line: &str) -> Result<(PolicyConfig, usize), WorkloadError> {
    let mut fields = line.split_whitespace();
    let mut next_num = || -> Result<u64, WorkloadError> {
        fields
            .next()
            .and_then(|f| f.parse().ok())
            .ok_or_else(|| WorkloadError::BadHeader(line.to_owned()))
    };

    let algorithm = next_num()?;
    let policy = match algorithm {
        1 => PolicyConfig::Fcfs,
        2 => {
            let quantum = next_num()?;
            if quantum == 0 {
                return Err(WorkloadError::ZeroQuantum);
            }
            PolicyConfig::RoundRobin { quantum }
        }
        3 => PolicyConfig::Sjf,
        4 => PolicyConfig::Srtn,
        other => return Err(WorkloadError::UnknownAlgorithm(other)),
    };
    let count = next_num()? as usize;
    if fields.next().is_some() {
        return Err(WorkloadError::BadHeader(line.to_owned()));
    }

    Ok((policy, count))
}

fn parse_process(pid: Pid, line: &str, lanes: &mut LaneMap) -> Result<Process, WorkloadError> {
    let mut fields = line.split_whitespace();

    let arrival: u64 = fields
        .next()
        .and_then(|f| f.parse().ok())
        .ok_or_else(|| WorkloadError::BadToken {
            pid,
            token: line.trim().to_owned(),
        })?;

    let mut bursts = Vec::new();
    for token in fields {
        bursts.push(parse_burst(pid, token, lanes)?);
    }
    if bursts.is_empty() {
        return Err(WorkloadError::NoBursts { pid });
    }
    if !bursts[0].is_cpu() {
        return Err(WorkloadError::FirstBurstNotCpu { pid });
    }

    Ok(Process::new(pid, Tick(arrival), bursts))
}

fn parse_burst(pid: Pid, token: &str, lanes: &mut LaneMap) -> Result<Burst, WorkloadError> {
    let burst = match token.find('(') {
        Some(open) => {
            let close = token.find(')').ok_or_else(|| WorkloadError::UnclosedResource {
                pid,
                token: token.to_owned(),
            })?;
            if close <= open + 1 || !token[close + 1..].is_empty() {
                return Err(WorkloadError::BadToken {
                    pid,
                    token: token.to_owned(),
                });
            }
            let label = &token[open + 1..close];
            let len = parse_len(pid, token, &token[..open])?;
            Burst::Resource {
                len,
                lane: lanes.resolve(label)?,
            }
        }
        None => Burst::Cpu {
            len: parse_len(pid, token, token)?,
        },
    };
    Ok(burst)
}

fn parse_len(pid: Pid, token: &str, digits: &str) -> Result<u64, WorkloadError> {
    let len: u64 = digits.parse().map_err(|_| WorkloadError::BadToken {
        pid,
        token: token.to_owned(),
    })?;
    if len == 0 {
        return Err(WorkloadError::ZeroBurst {
            pid,
            token: token.to_owned(),
        });
    }
    Ok(len)
}

/// Assigns resource labels to lanes in first-seen order
#[derive(Debug, Default)]
struct LaneMap {
    by_label: HashMap<String, LaneId>,
    labels: Vec<String>,
}

impl LaneMap {
    fn resolve(&mut self, label: &str) -> Result<LaneId, WorkloadError> {
        if let Some(&lane) = self.by_label.get(label) {
            return Ok(lane);
        }
        if self.labels.len() == LANE_COUNT {
            return Err(WorkloadError::TooManyResources {
                label: label.to_owned(),
            });
        }
        let lane = LaneId(self.labels.len());
        self.by_label.insert(label.to_owned(), lane);
        self.labels.push(label.to_owned());
        Ok(lane)
    }
}
