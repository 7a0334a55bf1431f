// Copyright 2026 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Flush steps become complete (`X`) slices on the flush track, lifecycle and
//! flush-state changes and mass reveals become instants, and the pending
//! store depth is plotted as a counter.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use trickle_core::time::Timebase;

use crate::recorder::{RecordedEvent, decode};

const TID_SESSION: u32 = 0;
const TID_FLUSH: u32 = 1;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Timestamps are converted to microseconds using the provided [`Timebase`].
pub fn export(bytes: &[u8], timebase: Timebase, writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::Lifecycle(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.lifecycle),
                    "cat": "Lifecycle",
                    "ts": ticks_to_us(e.at.ticks(), timebase),
                    "pid": 0,
                    "tid": TID_SESSION,
                    "s": "p",
                }));
            }
            RecordedEvent::Intake(e) => {
                let ts = ticks_to_us(e.at.ticks(), timebase);
                events.push(json!({
                    "ph": "i",
                    "name": "Intake",
                    "cat": "Intake",
                    "ts": ts,
                    "pid": 0,
                    "tid": TID_SESSION,
                    "s": "t",
                    "args": {
                        "batch_len": e.batch_len,
                        "accepted": e.counts.accepted,
                        "skipped": e.counts.skipped,
                        "rejected": e.counts.rejected,
                    }
                }));
                events.push(pending_counter(ts, e.pending));
            }
            RecordedEvent::FlushState(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.to),
                    "cat": "FlushState",
                    "ts": ticks_to_us(e.at.ticks(), timebase),
                    "pid": 0,
                    "tid": TID_FLUSH,
                    "s": "t",
                    "args": {
                        "from": format!("{:?}", e.from),
                    }
                }));
            }
            RecordedEvent::FlushSummary(s) => {
                let start = ticks_to_us(s.started_at.ticks(), timebase);
                let dur = ticks_to_us(s.elapsed.ticks(), timebase);
                events.push(json!({
                    "ph": "X",
                    "name": "Flush",
                    "cat": "Flush",
                    "ts": start,
                    "dur": dur,
                    "pid": 0,
                    "tid": TID_FLUSH,
                    "args": {
                        "frame_index": s.frame_index,
                        "revealed": s.revealed,
                        "remaining": s.remaining,
                        "stop": format!("{:?}", s.stop),
                    }
                }));
                events.push(pending_counter(start + dur, s.remaining));
            }
            RecordedEvent::MassReveal(e) => {
                let ts = ticks_to_us(e.at.ticks(), timebase);
                events.push(json!({
                    "ph": "i",
                    "name": "MassReveal",
                    "cat": "Flush",
                    "ts": ts,
                    "pid": 0,
                    "tid": TID_FLUSH,
                    "s": "p",
                    "args": {
                        "revealed": e.revealed,
                        "cause": format!("{:?}", e.cause),
                    }
                }));
                events.push(pending_counter(ts, 0));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn pending_counter(ts: f64, pending: u32) -> Value {
    json!({
        "ph": "C",
        "name": "Pending",
        "ts": ts,
        "pid": 0,
        "args": {
            "nodes": pending,
        }
    })
}

fn ticks_to_us(ticks: u64, timebase: Timebase) -> f64 {
    timebase.ticks_to_nanos(ticks) as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::recorder::RecorderSink;
    use trickle_core::config::ThrottleConfig;
    use trickle_core::session::Session;
    use trickle_core::time::{Duration, HostTime};
    use trickle_core::trace::{FlushStop, FlushSummary, TraceSink};
    use trickle_harness::{ManualHost, MemoryTree, run_until_idle};

    #[test]
    fn flush_summary_becomes_complete_slice() {
        let mut rec = RecorderSink::new();
        rec.on_flush_summary(&FlushSummary {
            frame_index: 1,
            started_at: HostTime(2_000_000),
            elapsed: Duration(500_000),
            revealed: 40,
            remaining: 60,
            stop: FlushStop::OpLimit,
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), Timebase::NANOS, &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["ph"], "X");
        assert_eq!(parsed[0]["ts"], 2000.0);
        assert_eq!(parsed[0]["dur"], 500.0);
        assert_eq!(parsed[0]["args"]["stop"], "OpLimit");
        assert_eq!(parsed[1]["ph"], "C");
        assert_eq!(parsed[1]["ts"], 2500.0);
        assert_eq!(parsed[1]["args"]["nodes"], 60);
    }

    #[test]
    fn export_session_recording() {
        let (mut tree, root) = MemoryTree::with_root();
        let rows: Vec<_> = (0..5).map(|_| tree.element(root, "li")).collect();
        let config = ThrottleConfig::DEFAULT.with_max_ops_per_frame(2);
        let mut session = Session::new(tree, ManualHost::new(), config).unwrap();
        let recorder = Rc::new(RefCell::new(RecorderSink::new()));
        session.set_trace_sink(Box::new(Rc::clone(&recorder)));
        session.start();
        session.on_mutations(rows);
        run_until_idle(&mut session, 10);
        drop(session);

        let mut out = Vec::new();
        export(recorder.borrow().as_bytes(), Timebase::NANOS, &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();

        let slices: Vec<_> = parsed.iter().filter(|e| e["ph"] == "X").collect();
        assert_eq!(slices.len(), 3, "one slice per flush step");
        assert_eq!(slices[0]["args"]["remaining"], 3);
        assert_eq!(slices[2]["args"]["stop"], "Drained");

        let last_pending = parsed
            .iter()
            .rev()
            .find(|e| e["ph"] == "C")
            .expect("pending counter present");
        assert_eq!(last_pending["args"]["nodes"], 0);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], Timebase::NANOS, &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
