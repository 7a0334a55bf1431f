// Copyright 2026 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`]. A truncated final record or an unknown
//! tag ends decoding.

use trickle_core::intake::IntakeCounts;
use trickle_core::session::{FlushState, Lifecycle};
use trickle_core::time::{Duration, HostTime};
use trickle_core::trace::{
    FlushStateEvent, FlushStop, FlushSummary, IntakeEvent, LifecycleEvent, MassRevealCause,
    MassRevealEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_LIFECYCLE: u8 = 1;
const TAG_INTAKE: u8 = 2;
const TAG_FLUSH_STATE: u8 = 3;
const TAG_FLUSH_SUMMARY: u8 = 4;
const TAG_MASS_REVEAL: u8 = 5;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_lifecycle(&mut self, l: Lifecycle) {
        self.write_u8(match l {
            Lifecycle::Stopped => 0,
            Lifecycle::Delayed => 1,
            Lifecycle::Observing => 2,
            Lifecycle::Paused => 3,
        });
    }

    fn write_flush_state(&mut self, s: FlushState) {
        self.write_u8(match s {
            FlushState::Idle => 0,
            FlushState::Scheduled => 1,
            FlushState::Running => 2,
        });
    }

    fn write_stop(&mut self, s: FlushStop) {
        self.write_u8(match s {
            FlushStop::Drained => 0,
            FlushStop::OpLimit => 1,
            FlushStop::TimeBudget => 2,
            FlushStop::Inactive => 3,
        });
    }

    fn write_cause(&mut self, c: MassRevealCause) {
        self.write_u8(match c {
            MassRevealCause::Overflow => 0,
            MassRevealCause::Disabled => 1,
            MassRevealCause::Stopped => 2,
            MassRevealCause::Explicit => 3,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_lifecycle(&mut self, e: &LifecycleEvent) {
        self.write_u8(TAG_LIFECYCLE);
        self.write_u64(e.at.ticks());
        self.write_lifecycle(e.lifecycle);
    }

    fn on_intake(&mut self, e: &IntakeEvent) {
        self.write_u8(TAG_INTAKE);
        self.write_u64(e.at.ticks());
        self.write_u32(e.batch_len);
        self.write_u32(e.counts.accepted);
        self.write_u32(e.counts.skipped);
        self.write_u32(e.counts.rejected);
        self.write_u32(e.pending);
    }

    fn on_flush_state(&mut self, e: &FlushStateEvent) {
        self.write_u8(TAG_FLUSH_STATE);
        self.write_u64(e.at.ticks());
        self.write_flush_state(e.from);
        self.write_flush_state(e.to);
    }

    fn on_flush_summary(&mut self, s: &FlushSummary) {
        self.write_u8(TAG_FLUSH_SUMMARY);
        self.write_u64(s.frame_index);
        self.write_u64(s.started_at.ticks());
        self.write_u64(s.elapsed.ticks());
        self.write_u32(s.revealed);
        self.write_u32(s.remaining);
        self.write_stop(s.stop);
    }

    fn on_mass_reveal(&mut self, e: &MassRevealEvent) {
        self.write_u8(TAG_MASS_REVEAL);
        self.write_u64(e.at.ticks());
        self.write_u32(e.revealed);
        self.write_cause(e.cause);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`LifecycleEvent`].
    Lifecycle(LifecycleEvent),
    /// An [`IntakeEvent`].
    Intake(IntakeEvent),
    /// A [`FlushStateEvent`].
    FlushState(FlushStateEvent),
    /// A [`FlushSummary`].
    FlushSummary(FlushSummary),
    /// A [`MassRevealEvent`].
    MassReveal(MassRevealEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_lifecycle(&mut self) -> Option<Lifecycle> {
        Some(match self.read_u8()? {
            0 => Lifecycle::Stopped,
            1 => Lifecycle::Delayed,
            2 => Lifecycle::Observing,
            _ => Lifecycle::Paused,
        })
    }

    fn read_flush_state(&mut self) -> Option<FlushState> {
        Some(match self.read_u8()? {
            0 => FlushState::Idle,
            1 => FlushState::Scheduled,
            _ => FlushState::Running,
        })
    }

    fn read_stop(&mut self) -> Option<FlushStop> {
        Some(match self.read_u8()? {
            0 => FlushStop::Drained,
            1 => FlushStop::OpLimit,
            2 => FlushStop::TimeBudget,
            _ => FlushStop::Inactive,
        })
    }

    fn read_cause(&mut self) -> Option<MassRevealCause> {
        Some(match self.read_u8()? {
            0 => MassRevealCause::Overflow,
            1 => MassRevealCause::Disabled,
            2 => MassRevealCause::Stopped,
            _ => MassRevealCause::Explicit,
        })
    }

    fn decode_lifecycle(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Lifecycle(LifecycleEvent {
            at: HostTime(self.read_u64()?),
            lifecycle: self.read_lifecycle()?,
        }))
    }

    fn decode_intake(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Intake(IntakeEvent {
            at: HostTime(self.read_u64()?),
            batch_len: self.read_u32()?,
            counts: IntakeCounts {
                accepted: self.read_u32()?,
                skipped: self.read_u32()?,
                rejected: self.read_u32()?,
            },
            pending: self.read_u32()?,
        }))
    }

    fn decode_flush_state(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FlushState(FlushStateEvent {
            at: HostTime(self.read_u64()?),
            from: self.read_flush_state()?,
            to: self.read_flush_state()?,
        }))
    }

    fn decode_flush_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FlushSummary(FlushSummary {
            frame_index: self.read_u64()?,
            started_at: HostTime(self.read_u64()?),
            elapsed: Duration(self.read_u64()?),
            revealed: self.read_u32()?,
            remaining: self.read_u32()?,
            stop: self.read_stop()?,
        }))
    }

    fn decode_mass_reveal(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::MassReveal(MassRevealEvent {
            at: HostTime(self.read_u64()?),
            revealed: self.read_u32()?,
            cause: self.read_cause()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_LIFECYCLE => self.decode_lifecycle(),
            TAG_INTAKE => self.decode_intake(),
            TAG_FLUSH_STATE => self.decode_flush_state(),
            TAG_FLUSH_SUMMARY => self.decode_flush_summary(),
            TAG_MASS_REVEAL => self.decode_mass_reveal(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_summary() -> FlushSummary {
        FlushSummary {
            frame_index: 9,
            started_at: HostTime(16_000_000),
            elapsed: Duration(7_900_000),
            revealed: 113,
            remaining: 2_400,
            stop: FlushStop::TimeBudget,
        }
    }

    #[test]
    fn flush_summary_survives_recording() {
        let mut rec = RecorderSink::new();
        let orig = sample_summary();
        rec.on_flush_summary(&orig);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 1);
        match &events[0] {
            RecordedEvent::FlushSummary(s) => {
                assert_eq!(s.frame_index, orig.frame_index);
                assert_eq!(s.started_at, orig.started_at);
                assert_eq!(s.elapsed, orig.elapsed);
                assert_eq!(s.revealed, orig.revealed);
                assert_eq!(s.remaining, orig.remaining);
                assert_eq!(s.stop, orig.stop);
            }
            other => panic!("expected FlushSummary, got {other:?}"),
        }
    }

    #[test]
    fn intake_counts_keep_field_order() {
        let mut rec = RecorderSink::new();
        rec.on_intake(&IntakeEvent {
            at: HostTime(5),
            batch_len: 3,
            counts: IntakeCounts {
                accepted: 10,
                skipped: 2,
                rejected: 1,
            },
            pending: 10,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        match &events[..] {
            [RecordedEvent::Intake(e)] => {
                assert_eq!(e.batch_len, 3);
                assert_eq!(
                    e.counts,
                    IntakeCounts {
                        accepted: 10,
                        skipped: 2,
                        rejected: 1,
                    }
                );
                assert_eq!(e.pending, 10);
            }
            other => panic!("expected one Intake, got {other:?}"),
        }
    }

    #[test]
    fn mixed_events_decode_in_order() {
        let mut rec = RecorderSink::new();
        rec.on_lifecycle(&LifecycleEvent {
            at: HostTime(0),
            lifecycle: Lifecycle::Observing,
        });
        rec.on_flush_state(&FlushStateEvent {
            at: HostTime(10),
            from: FlushState::Idle,
            to: FlushState::Scheduled,
        });
        rec.on_flush_summary(&sample_summary());
        rec.on_mass_reveal(&MassRevealEvent {
            at: HostTime(20),
            revealed: 4_000,
            cause: MassRevealCause::Overflow,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 4);
        assert!(matches!(
            events[0],
            RecordedEvent::Lifecycle(LifecycleEvent {
                lifecycle: Lifecycle::Observing,
                ..
            })
        ));
        assert!(matches!(
            events[1],
            RecordedEvent::FlushState(FlushStateEvent {
                from: FlushState::Idle,
                to: FlushState::Scheduled,
                ..
            })
        ));
        assert!(matches!(events[2], RecordedEvent::FlushSummary(_)));
        assert!(matches!(
            events[3],
            RecordedEvent::MassReveal(MassRevealEvent {
                revealed: 4_000,
                cause: MassRevealCause::Overflow,
                ..
            })
        ));
    }

    #[test]
    fn truncated_record_ends_decoding() {
        let mut rec = RecorderSink::new();
        rec.on_lifecycle(&LifecycleEvent {
            at: HostTime(1),
            lifecycle: Lifecycle::Delayed,
        });
        rec.on_flush_summary(&sample_summary());
        let bytes = rec.into_bytes();

        let events: Vec<_> = decode(&bytes[..bytes.len() - 1]).collect();
        assert_eq!(events.len(), 1, "only the complete record decodes");
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty());
    }
}
