// Copyright 2026 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are converted to microseconds using a [`Timebase`].

use std::io::Write;

use trickle_core::session::{FlushState, Lifecycle};
use trickle_core::time::{HostTime, Timebase};
use trickle_core::trace::{
    FlushStateEvent, FlushStop, FlushSummary, IntakeEvent, LifecycleEvent, MassRevealCause,
    MassRevealEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    timebase: Timebase,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("timebase", &self.timebase)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr(timebase: Timebase) -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
            timebase,
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>, timebase: Timebase) -> Self {
        Self { writer, timebase }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W, timebase: Timebase) -> Self {
        Self { writer, timebase }
    }

    /// Consumes the sink and returns the destination.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn ticks_to_us(&self, ticks: u64) -> f64 {
        self.timebase.ticks_to_nanos(ticks) as f64 / 1000.0
    }

    fn host_us(&self, t: HostTime) -> f64 {
        self.ticks_to_us(t.ticks())
    }
}

fn lifecycle_name(lifecycle: Lifecycle) -> &'static str {
    match lifecycle {
        Lifecycle::Stopped => "stopped",
        Lifecycle::Delayed => "delayed",
        Lifecycle::Observing => "observing",
        Lifecycle::Paused => "paused",
    }
}

fn flush_name(state: FlushState) -> &'static str {
    match state {
        FlushState::Idle => "idle",
        FlushState::Scheduled => "scheduled",
        FlushState::Running => "running",
    }
}

fn stop_name(stop: FlushStop) -> &'static str {
    match stop {
        FlushStop::Drained => "drained",
        FlushStop::OpLimit => "op-limit",
        FlushStop::TimeBudget => "time-budget",
        FlushStop::Inactive => "inactive",
    }
}

fn cause_name(cause: MassRevealCause) -> &'static str {
    match cause {
        MassRevealCause::Overflow => "overflow",
        MassRevealCause::Disabled => "disabled",
        MassRevealCause::Stopped => "stopped",
        MassRevealCause::Explicit => "explicit",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_lifecycle(&mut self, e: &LifecycleEvent) {
        let _ = writeln!(
            self.writer,
            "[lifecycle] {} at {:.1}µs",
            lifecycle_name(e.lifecycle),
            self.host_us(e.at),
        );
    }

    fn on_intake(&mut self, e: &IntakeEvent) {
        let _ = writeln!(
            self.writer,
            "[intake] batch={} accepted={} skipped={} rejected={} pending={} at {:.1}µs",
            e.batch_len,
            e.counts.accepted,
            e.counts.skipped,
            e.counts.rejected,
            e.pending,
            self.host_us(e.at),
        );
    }

    fn on_flush_state(&mut self, e: &FlushStateEvent) {
        let _ = writeln!(
            self.writer,
            "[flush] {} -> {} at {:.1}µs",
            flush_name(e.from),
            flush_name(e.to),
            self.host_us(e.at),
        );
    }

    fn on_flush_summary(&mut self, s: &FlushSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] frame={} revealed={} remaining={} elapsed={:.1}µs stop={}",
            s.frame_index,
            s.revealed,
            s.remaining,
            self.ticks_to_us(s.elapsed.ticks()),
            stop_name(s.stop),
        );
    }

    fn on_mass_reveal(&mut self, e: &MassRevealEvent) {
        let _ = writeln!(
            self.writer,
            "[mass-reveal] revealed={} cause={} at {:.1}µs",
            e.revealed,
            cause_name(e.cause),
            self.host_us(e.at),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trickle_core::time::Duration;

    #[test]
    fn pretty_print_summary() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::NANOS);
        sink.on_flush_summary(&FlushSummary {
            frame_index: 4,
            started_at: HostTime(1_000_000),
            elapsed: Duration(2_500),
            revealed: 200,
            remaining: 17,
            stop: FlushStop::OpLimit,
        });
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert!(output.contains("[summary]"), "got: {output}");
        assert!(output.contains("frame=4"), "got: {output}");
        assert!(output.contains("elapsed=2.5µs"), "got: {output}");
        assert!(output.contains("stop=op-limit"), "got: {output}");
    }

    #[test]
    fn pretty_print_uses_timebase() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::MICROS);
        sink.on_mass_reveal(&MassRevealEvent {
            at: HostTime(42),
            revealed: 4001,
            cause: MassRevealCause::Overflow,
        });
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert_eq!(
            output, "[mass-reveal] revealed=4001 cause=overflow at 42.0µs\n",
            "microsecond ticks print unscaled"
        );
    }
}
