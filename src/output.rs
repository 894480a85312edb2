//! Report rendering: the canonical text form, a per-process CSV, and a
//! chrome trace of the three server timelines.

use std::io;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use serde_json::json;

use crate::trace::{Report, Slot};
use crate::types::Pid;
use crate::utils::prelude::*;

/// Which artifacts a run produces. File names are resolved under the
/// configured `output_dir`.
#[derive(Debug, Default, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// text report destination; stdout when absent
    pub text: Option<PathBuf>,
    /// per-process statistics table
    pub stats_csv: Option<PathBuf>,
    /// timeline trace viewable in chrome://tracing
    pub chrome_trace: Option<PathBuf>,
}

fn slots_line(slots: &[Slot]) -> String {
    slots.iter().map(ToString::to_string).join(" ")
}

/// The four-line text report: CPU timeline truncated after the last busy
/// tick, both resource timelines in full length, then turnaround and
/// waiting times in process order.
pub fn render_text(report: &Report, mut w: impl io::Write) -> Result<()> {
    writeln!(w, "{}", slots_line(report.trace.cpu_trimmed()))?;
    for lane in &report.trace.lanes {
        writeln!(w, "{}", slots_line(lane))?;
    }
    writeln!(w, "{}", report.stats.iter().map(|s| s.turnaround).join(" "))?;
    writeln!(w, "{}", report.stats.iter().map(|s| s.waiting).join(" "))?;
    Ok(())
}

pub fn render_stats_csv(report: &Report, path: &Path) -> Result<()> {
    let mut w = csv::Writer::from_path(path)?;
    w.write_record(&["pid", "arrival", "service", "finish", "turnaround", "waiting"])?;
    for s in &report.stats {
        w.write_record(&[
            s.id.to_string(),
            s.arrival.to_string(),
            s.service.to_string(),
            s.finish.to_string(),
            s.turnaround.to_string(),
            s.waiting.to_string(),
        ])?;
    }
    w.flush()?;
    info!(path = %path.display(), "wrote stats csv");
    Ok(())
}

/// One `X` duration event per contiguous occupancy run, on one trace
/// thread per server (CPU plus each lane)
pub fn render_chrome_trace(report: &Report, path: &Path) -> Result<()> {
    let mut events = Vec::new();
    push_server(&mut events, 0, "CPU", &report.trace.cpu);
    for (i, lane) in report.trace.lanes.iter().enumerate() {
        push_server(&mut events, i + 1, &format!("R{}", i + 1), lane);
    }

    let file = io::BufWriter::new(std::fs::File::create(path)?);
    serde_json::to_writer(file, &json!({ "traceEvents": events }))?;
    info!(path = %path.display(), "wrote chrome trace");
    Ok(())
}

fn push_server(events: &mut Vec<serde_json::Value>, tid: usize, name: &str, slots: &[Slot]) {
    events.push(json!({
        "name": "thread_name",
        "ph": "M",
        "pid": 0,
        "tid": tid,
        "args": { "name": name },
    }));

    // run-length encode the timeline; the trailing sentinel flushes the
    // final run
    let mut run: Option<(Pid, usize)> = None;
    for (t, slot) in slots.iter().chain(std::iter::once(&Slot::Idle)).enumerate() {
        let cur = slot.pid();
        if let Some((pid, start)) = run {
            if cur == Some(pid) {
                continue;
            }
            events.push(json!({
                "name": format!("P{}", pid),
                "ph": "X",
                "cat": "exec",
                "ts": start,
                "dur": t - start,
                "pid": 0,
                "tid": tid,
                "args": { "process": pid.0 },
            }));
        }
        run = cur.map(|pid| (pid, t));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{ProcStats, Trace};
    use crate::types::Tick;

    fn sample_report() -> Report {
        let trace = Trace {
            cpu: vec![Slot::Busy(Pid(1)), Slot::Busy(Pid(1)), Slot::Idle, Slot::Busy(Pid(2)), Slot::Idle],
            lanes: [
                vec![Slot::Idle, Slot::Idle, Slot::Busy(Pid(1)), Slot::Idle, Slot::Idle],
                vec![Slot::Idle; 5],
            ],
        };
        Report {
            trace,
            stats: vec![
                ProcStats {
                    id: Pid(1),
                    arrival: Tick(0),
                    service: 3,
                    finish: Tick(3),
                    turnaround: 3,
                    waiting: 0,
                },
                ProcStats {
                    id: Pid(2),
                    arrival: Tick(0),
                    service: 1,
                    finish: Tick(4),
                    turnaround: 4,
                    waiting: 3,
                },
            ],
        }
    }

    #[test]
    fn text_report_shape() {
        let mut buf = Vec::new();
        render_text(&sample_report(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "1 1 _ 2\n_ _ 1 _ _\n_ _ _ _ _\n3 4\n0 3\n");
    }

    #[test]
    fn chrome_trace_groups_runs() {
        let mut events = Vec::new();
        push_server(&mut events, 0, "CPU", &sample_report().trace.cpu);
        // one metadata record plus one X event per occupancy run
        let durations: Vec<_> = events
            .iter()
            .filter(|e| e["ph"] == "X")
            .map(|e| (e["ts"].as_u64().unwrap(), e["dur"].as_u64().unwrap()))
            .collect();
        assert_eq!(durations, vec![(0, 2), (3, 1)]);
    }
}
