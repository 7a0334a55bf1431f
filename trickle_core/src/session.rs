// Copyright 2026 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The reveal session: intake, frame-budgeted flushing, and teardown.
//!
//! A [`Session`] owns everything that lives for one throttling session: the
//! visual tree adapter, the host services, the [`PendingStore`], the flush
//! state, and the start-delay timer. Host callbacks come in through
//! [`on_mutations`](Session::on_mutations), [`on_frame`](Session::on_frame)
//! and [`on_timer`](Session::on_timer).
//!
//! # Flush state
//!
//! ```text
//!            request_frame                on_frame
//!   Idle ─────────────────► Scheduled ─────────────► Running
//!    ▲                          ▲                       │
//!    │  store empty             │  store non-empty      │
//!    └──────────────────────────┴───────────────────────┘
//! ```
//!
//! At most one frame callback is outstanding. A flush step reads the budget
//! from the current [`ThrottleConfig`], then reveals one node at a time,
//! checking the op count and then the elapsed time after every reveal.
//!
//! # Overflow
//!
//! After an intake batch, if the store holds at least
//! [`IntakeRules::overflow_threshold`] nodes, the outstanding frame is
//! cancelled and every pending node is revealed in the same step.
//!
//! # Teardown
//!
//! [`stop`](Session::stop) cancels the outstanding frame, cancels the start
//! timer, disconnects the change feed, and then reveals everything. A frame
//! or timer callback that still arrives afterward carries a handle the
//! session no longer holds and is ignored.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::backend::{FrameHandle, Host, TimerHandle};
use crate::config::{ConfigError, ThrottleConfig};
use crate::intake::{self, IntakeCounts, IntakeRules};
use crate::node::{self, VisualTree};
use crate::pending::PendingStore;
use crate::time::{Duration, HostTime};
use crate::trace::{
    FlushStateEvent, FlushStop, FlushSummary, IntakeEvent, LifecycleEvent, MassRevealCause,
    MassRevealEvent, TraceSink, Tracer,
};

/// Whether a flush callback is outstanding or running.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlushState {
    /// Nothing scheduled.
    Idle,
    /// A frame callback has been requested and not yet fired.
    Scheduled,
    /// A flush step is executing.
    Running,
}

/// Where the session is in its start/stop lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Not started, stopped, or the root container was absent at attach time.
    Stopped,
    /// Waiting for the one-shot start delay.
    Delayed,
    /// Connected to the change feed.
    Observing,
    /// Started, but configuration has the session inactive.
    Paused,
}

/// Cumulative counters for one session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Nodes added to the pending store.
    pub enqueued: u64,
    /// Nodes revealed, by flushes and mass reveals together.
    pub revealed: u64,
    /// Flush steps run.
    pub frames: u64,
    /// Times the overflow guard fired.
    pub overflows: u64,
}

/// One throttling session over a visual tree `T` driven by host `H`.
pub struct Session<T: VisualTree, H: Host> {
    tree: T,
    host: H,
    config: ThrottleConfig,
    rules: IntakeRules,
    store: PendingStore<T::Node>,
    flush: FlushState,
    frame: Option<FrameHandle>,
    lifecycle: Lifecycle,
    timer: Option<TimerHandle>,
    stats: SessionStats,
    frame_index: u64,
    scratch: Vec<T::Node>,
    sink: Option<Box<dyn TraceSink>>,
}

impl<T: VisualTree, H: Host> fmt::Debug for Session<T, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("rules", &self.rules)
            .field("store", &self.store)
            .field("flush", &self.flush)
            .field("frame", &self.frame)
            .field("lifecycle", &self.lifecycle)
            .field("timer", &self.timer)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

fn tracer(sink: &mut Option<Box<dyn TraceSink>>) -> Tracer<'_> {
    match sink {
        Some(s) => Tracer::new(&mut **s),
        None => Tracer::none(),
    }
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

impl<T: VisualTree, H: Host> Session<T, H> {
    /// Creates a stopped session with the default [`IntakeRules`].
    pub fn new(tree: T, host: H, config: ThrottleConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            tree,
            host,
            config,
            rules: IntakeRules::DEFAULT,
            store: PendingStore::new(),
            flush: FlushState::Idle,
            frame: None,
            lifecycle: Lifecycle::Stopped,
            timer: None,
            stats: SessionStats::default(),
            frame_index: 0,
            scratch: Vec::new(),
            sink: None,
        })
    }

    /// Replaces the intake rules.
    #[must_use]
    pub fn with_rules(mut self, rules: IntakeRules) -> Self {
        self.rules = rules;
        self
    }

    /// Installs a trace sink. Events reach it only with the `trace` feature.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.sink = Some(sink);
    }

    /// Removes and returns the installed trace sink.
    pub fn take_trace_sink(&mut self) -> Option<Box<dyn TraceSink>> {
        self.sink.take()
    }

    // -- Lifecycle ---------------------------------------------------------

    /// Starts the session.
    ///
    /// Inactive configuration parks the session in [`Lifecycle::Paused`]. A
    /// non-zero start delay arms a timer and attaches when it fires
    /// ([`on_timer`](Self::on_timer)); otherwise the session attaches now.
    /// Attaching without a root container leaves the session
    /// [`Lifecycle::Stopped`], and the host may call `start` again once the
    /// root exists.
    ///
    /// Does nothing unless the session is stopped.
    pub fn start(&mut self) {
        if self.lifecycle != Lifecycle::Stopped {
            return;
        }
        if !self.config.active {
            self.enter(Lifecycle::Paused);
            return;
        }
        if self.config.start_delay_ms > 0 {
            let delay = Duration::from_millis(self.config.start_delay_ms, self.host.timebase());
            self.timer = Some(self.host.start_timer(delay));
            self.enter(Lifecycle::Delayed);
        } else {
            self.attach();
        }
    }

    /// Handles the start-delay timer firing.
    ///
    /// Handles other than the armed one are ignored.
    pub fn on_timer(&mut self, handle: TimerHandle) {
        if self.lifecycle != Lifecycle::Delayed || self.timer != Some(handle) {
            return;
        }
        self.timer = None;
        self.attach();
    }

    /// Tears the session down.
    ///
    /// Cancels the outstanding frame and start timer, disconnects the change
    /// feed, then reveals every pending node. The session can be started
    /// again afterward.
    pub fn stop(&mut self) {
        if let Some(handle) = self.frame.take() {
            self.host.cancel_frame(handle);
        }
        if let Some(handle) = self.timer.take() {
            self.host.cancel_timer(handle);
        }
        if self.lifecycle == Lifecycle::Observing {
            self.host.disconnect();
        }
        self.mass_reveal(MassRevealCause::Stopped);
        self.scratch.clear();
        self.enter(Lifecycle::Stopped);
    }

    /// Applies a new configuration.
    ///
    /// Turning the session off reveals everything at once and detaches from
    /// the change feed; turning it back on reattaches. Budget changes apply
    /// from the next flush step. An invalid configuration is rejected and the
    /// previous one stays in effect.
    pub fn set_config(&mut self, config: ThrottleConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let was_active = self.config.active;
        self.config = config;
        match (was_active, config.active) {
            (true, false) => {
                self.mass_reveal(MassRevealCause::Disabled);
                match self.lifecycle {
                    Lifecycle::Observing => {
                        self.host.disconnect();
                        self.enter(Lifecycle::Paused);
                    }
                    Lifecycle::Delayed => {
                        if let Some(handle) = self.timer.take() {
                            self.host.cancel_timer(handle);
                        }
                        self.enter(Lifecycle::Paused);
                    }
                    Lifecycle::Stopped | Lifecycle::Paused => {}
                }
            }
            (false, true) if self.lifecycle == Lifecycle::Paused => self.attach(),
            _ => {}
        }
        Ok(())
    }

    fn attach(&mut self) {
        if self.tree.root().is_none() {
            self.enter(Lifecycle::Stopped);
            return;
        }
        self.host.connect();
        self.enter(Lifecycle::Observing);
    }

    fn enter(&mut self, lifecycle: Lifecycle) {
        if self.lifecycle == lifecycle {
            return;
        }
        self.lifecycle = lifecycle;
        let at = self.host.now();
        tracer(&mut self.sink).lifecycle(&LifecycleEvent { at, lifecycle });
    }

    // -- Intake ------------------------------------------------------------

    /// Handles one batch of newly inserted nodes from the change feed.
    ///
    /// Each node's subtree is classified and accepted nodes are hidden and
    /// enqueued. Afterward either the overflow guard reveals everything or a
    /// flush is scheduled. Does nothing while inactive or not observing.
    pub fn on_mutations<I>(&mut self, added: I)
    where
        I: IntoIterator<Item = T::Node>,
    {
        if !self.config.active || self.lifecycle != Lifecycle::Observing {
            return;
        }

        let mut counts = IntakeCounts::default();
        let mut batch_len: u32 = 0;
        let mut accepted = core::mem::take(&mut self.scratch);
        let root = self.tree.root();
        for inserted in added {
            batch_len = batch_len.saturating_add(1);
            intake::collect(
                &self.tree,
                &self.rules,
                root.as_ref(),
                &inserted,
                &mut accepted,
                &mut counts,
            );
        }
        for node in accepted.drain(..) {
            if self.store.enqueue(&mut self.tree, node) {
                self.stats.enqueued += 1;
            }
        }
        self.scratch = accepted;

        let pending = self.store.len();
        let at = self.host.now();
        tracer(&mut self.sink).intake(&IntakeEvent {
            at,
            batch_len,
            counts,
            pending: saturating_u32(pending),
        });

        if pending >= self.rules.overflow_threshold {
            self.stats.overflows += 1;
            self.mass_reveal(MassRevealCause::Overflow);
        } else {
            self.schedule();
        }
    }

    // -- Flushing ----------------------------------------------------------

    fn schedule(&mut self) {
        if self.flush != FlushState::Idle || self.store.is_empty() || !self.config.active {
            return;
        }
        self.frame = Some(self.host.request_frame());
        self.set_flush(FlushState::Scheduled);
    }

    /// Runs one flush step for a fired frame callback.
    ///
    /// Handles other than the outstanding one are ignored, so a callback
    /// that was cancelled but still delivered cannot touch the store.
    pub fn on_frame(&mut self, handle: FrameHandle) {
        if self.frame != Some(handle) {
            return;
        }
        self.frame = None;
        self.set_flush(FlushState::Running);
        self.frame_index += 1;
        self.stats.frames += 1;

        let config = self.config;
        let started_at = self.host.now();

        // Unreachable through `set_config`: disabling reveals everything and
        // cancels the frame, so its handle is already stale here.
        if !config.active {
            let revealed = self.mass_reveal(MassRevealCause::Disabled);
            let elapsed = self.host.now().saturating_duration_since(started_at);
            self.summarize(started_at, elapsed, revealed, FlushStop::Inactive);
            return;
        }

        let budget = Duration::from_millis(config.frame_budget_ms, self.host.timebase());
        let mut revealed: u32 = 0;
        let stop = loop {
            let Some(node) = self.store.drain_next() else {
                break FlushStop::Drained;
            };
            node::reveal(&mut self.tree, &node);
            revealed += 1;
            if revealed >= config.max_ops_per_frame {
                break FlushStop::OpLimit;
            }
            if self.host.now().saturating_duration_since(started_at) >= budget {
                break FlushStop::TimeBudget;
            }
        };
        let elapsed = self.host.now().saturating_duration_since(started_at);
        self.stats.revealed += u64::from(revealed);
        self.summarize(started_at, elapsed, revealed, stop);

        if self.store.is_empty() {
            self.set_flush(FlushState::Idle);
        } else {
            self.frame = Some(self.host.request_frame());
            self.set_flush(FlushState::Scheduled);
        }
    }

    fn summarize(
        &mut self,
        started_at: HostTime,
        elapsed: Duration,
        revealed: u32,
        stop: FlushStop,
    ) {
        let summary = FlushSummary {
            frame_index: self.frame_index,
            started_at,
            elapsed,
            revealed,
            remaining: saturating_u32(self.store.len()),
            stop,
        };
        tracer(&mut self.sink).flush_summary(&summary);
    }

    /// Reveals every pending node now and cancels the outstanding frame.
    ///
    /// Returns the number of nodes revealed.
    pub fn reveal_all(&mut self) -> u32 {
        self.mass_reveal(MassRevealCause::Explicit)
    }

    fn mass_reveal(&mut self, cause: MassRevealCause) -> u32 {
        if let Some(handle) = self.frame.take() {
            self.host.cancel_frame(handle);
        }
        let nodes = self.store.clear_all();
        for node in &nodes {
            node::reveal(&mut self.tree, node);
        }
        let revealed = saturating_u32(nodes.len());
        self.stats.revealed += nodes.len() as u64;
        if revealed > 0 {
            let at = self.host.now();
            tracer(&mut self.sink).mass_reveal(&MassRevealEvent {
                at,
                revealed,
                cause,
            });
        }
        self.set_flush(FlushState::Idle);
        revealed
    }

    fn set_flush(&mut self, to: FlushState) {
        let from = self.flush;
        if from == to {
            return;
        }
        self.flush = to;
        let at = self.host.now();
        tracer(&mut self.sink).flush_state(&FlushStateEvent { at, from, to });
    }

    // -- Accessors ---------------------------------------------------------

    /// Returns the current flush state.
    #[must_use]
    pub fn flush_state(&self) -> FlushState {
        self.flush
    }

    /// Returns `true` while a flush is scheduled or running.
    ///
    /// Status indicators poll this.
    #[must_use]
    pub fn is_flushing(&self) -> bool {
        self.flush != FlushState::Idle
    }

    /// Returns the outstanding frame callback, if any.
    #[must_use]
    pub fn scheduled_frame(&self) -> Option<FrameHandle> {
        self.frame
    }

    /// Returns the armed start-delay timer, if any.
    #[must_use]
    pub fn start_timer(&self) -> Option<TimerHandle> {
        self.timer
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Returns the number of nodes waiting for reveal.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if `node` is waiting for reveal.
    #[must_use]
    pub fn is_pending(&self, node: &T::Node) -> bool {
        self.store.contains(node)
    }

    /// Returns the pending store.
    #[must_use]
    pub fn pending(&self) -> &PendingStore<T::Node> {
        &self.store
    }

    /// Returns the cumulative counters.
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Returns the configuration in effect.
    #[must_use]
    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    /// Returns the intake rules in effect.
    #[must_use]
    pub fn rules(&self) -> &IntakeRules {
        &self.rules
    }

    /// Returns the visual tree adapter.
    #[must_use]
    pub fn tree(&self) -> &T {
        &self.tree
    }

    /// Returns the visual tree adapter mutably.
    ///
    /// Callers must not toggle the hidden marker of pending nodes.
    pub fn tree_mut(&mut self) -> &mut T {
        &mut self.tree
    }

    /// Returns the host services.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Returns the host services mutably.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

impl<T: VisualTree, H: Host> Drop for Session<T, H> {
    fn drop(&mut self) {
        if self.lifecycle != Lifecycle::Stopped || !self.store.is_empty() || self.frame.is_some() {
            self.stop();
        }
    }
}
