// Copyright 2026 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the reveal scheduler.
//!
//! This module provides a [`TraceSink`] trait with one method per event the
//! session emits. All method bodies default to no-ops, so implementing only
//! the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! The flush-state transitions double as the observability surface for
//! status indicators: a sink that watches [`FlushStateEvent`]s knows when the
//! scheduler starts and stops flushing without polling.
//!
//! # Crate features
//!
//! - `trace` — enables the `Tracer` method bodies (one branch per call).

use alloc::rc::Rc;
use core::cell::RefCell;

use crate::intake::IntakeCounts;
use crate::session::{FlushState, Lifecycle};
use crate::time::{Duration, HostTime};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Why a flush step stopped revealing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlushStop {
    /// The pending store ran empty.
    Drained,
    /// `max_ops_per_frame` nodes were revealed.
    OpLimit,
    /// `frame_budget_ms` elapsed.
    TimeBudget,
    /// The session was inactive when the frame fired; everything was
    /// revealed at once.
    Inactive,
}

/// What triggered a mass reveal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MassRevealCause {
    /// The pending store reached the overflow threshold.
    Overflow,
    /// Configuration turned the session off.
    Disabled,
    /// The session was stopped.
    Stopped,
    /// The host asked for it through
    /// [`Session::reveal_all`](crate::session::Session::reveal_all).
    Explicit,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when the session's lifecycle changes.
#[derive(Clone, Copy, Debug)]
pub struct LifecycleEvent {
    /// Host time of the change.
    pub at: HostTime,
    /// The lifecycle entered.
    pub lifecycle: Lifecycle,
}

/// Emitted after each insertion batch has been classified.
#[derive(Clone, Copy, Debug)]
pub struct IntakeEvent {
    /// Host time of the batch.
    pub at: HostTime,
    /// Number of inserted subtree roots in the batch.
    pub batch_len: u32,
    /// Verdict tallies over the whole batch.
    pub counts: IntakeCounts,
    /// Pending nodes after enqueueing, before any overflow reveal.
    pub pending: u32,
}

/// Emitted on every flush-state transition.
#[derive(Clone, Copy, Debug)]
pub struct FlushStateEvent {
    /// Host time of the transition.
    pub at: HostTime,
    /// State left.
    pub from: FlushState,
    /// State entered.
    pub to: FlushState,
}

/// Emitted at the end of every flush step.
#[derive(Clone, Copy, Debug)]
pub struct FlushSummary {
    /// Monotonic count of flush steps in this session.
    pub frame_index: u64,
    /// Host time when the step started.
    pub started_at: HostTime,
    /// Time spent revealing.
    pub elapsed: Duration,
    /// Nodes revealed in this step.
    pub revealed: u32,
    /// Nodes still pending afterward.
    pub remaining: u32,
    /// Why the step stopped.
    pub stop: FlushStop,
}

/// Emitted when every pending node is revealed at once.
#[derive(Clone, Copy, Debug)]
pub struct MassRevealEvent {
    /// Host time of the reveal.
    pub at: HostTime,
    /// Nodes revealed.
    pub revealed: u32,
    /// What triggered it.
    pub cause: MassRevealCause,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from a session.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when the session's lifecycle changes.
    fn on_lifecycle(&mut self, e: &LifecycleEvent) {
        _ = e;
    }

    /// Called after an insertion batch is classified.
    fn on_intake(&mut self, e: &IntakeEvent) {
        _ = e;
    }

    /// Called on every flush-state transition.
    fn on_flush_state(&mut self, e: &FlushStateEvent) {
        _ = e;
    }

    /// Called at the end of every flush step.
    fn on_flush_summary(&mut self, s: &FlushSummary) {
        _ = s;
    }

    /// Called when all pending nodes are revealed at once.
    fn on_mass_reveal(&mut self, e: &MassRevealEvent) {
        _ = e;
    }
}

/// Shared sinks.
///
/// The session owns its sink as a `Box<dyn TraceSink>`. Installing an
/// `Rc<RefCell<S>>` clone lets the host keep reading `S` while the session
/// writes to it.
impl<S: TraceSink + ?Sized> TraceSink for Rc<RefCell<S>> {
    fn on_lifecycle(&mut self, e: &LifecycleEvent) {
        self.borrow_mut().on_lifecycle(e);
    }

    fn on_intake(&mut self, e: &IntakeEvent) {
        self.borrow_mut().on_intake(e);
    }

    fn on_flush_state(&mut self, e: &FlushStateEvent) {
        self.borrow_mut().on_flush_state(e);
    }

    fn on_flush_summary(&mut self, s: &FlushSummary) {
        self.borrow_mut().on_flush_summary(s);
    }

    fn on_mass_reveal(&mut self, e: &MassRevealEvent) {
        self.borrow_mut().on_mass_reveal(e);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`LifecycleEvent`].
    #[inline]
    pub fn lifecycle(&mut self, e: &LifecycleEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_lifecycle(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`IntakeEvent`].
    #[inline]
    pub fn intake(&mut self, e: &IntakeEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_intake(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FlushStateEvent`].
    #[inline]
    pub fn flush_state(&mut self, e: &FlushStateEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_flush_state(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FlushSummary`].
    #[inline]
    pub fn flush_summary(&mut self, s: &FlushSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_flush_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits a [`MassRevealEvent`].
    #[inline]
    pub fn mass_reveal(&mut self, e: &MassRevealEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_mass_reveal(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
