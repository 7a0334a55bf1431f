// Copyright 2026 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend contract for host integrations.
//!
//! Trickle splits host-specific work into *backend* crates. A backend
//! provides two things:
//!
//! - **A visual tree** — an implementation of
//!   [`VisualTree`](crate::node::VisualTree) over the host's node handles.
//!
//! - **A [`Host`]** — the clock, the per-frame callback primitive, a one-shot
//!   timer, and the change feed subscription.
//!
//! The host's callbacks are delivered back into the session by the backend:
//!
//! | Host event                  | Session entry point                                   |
//! |-----------------------------|-------------------------------------------------------|
//! | frame callback fired        | [`Session::on_frame`](crate::session::Session::on_frame)         |
//! | start-delay timer fired     | [`Session::on_timer`](crate::session::Session::on_timer)         |
//! | insertion batch committed   | [`Session::on_mutations`](crate::session::Session::on_mutations) |
//!
//! The host guarantees these never overlap: each runs to completion before
//! the next is delivered.
//!
//! # Crate boundaries
//!
//! `trickle_core` owns the data model, intake, scheduling, and this contract
//! module. Backend crates depend on `trickle_core` and provide host glue.

use core::fmt;

use crate::time::{Duration, HostTime, Timebase};

/// Identifies one requested frame callback.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

impl fmt::Debug for FrameHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrameHandle({})", self.0)
    }
}

/// Identifies one armed one-shot timer.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub i32);

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimerHandle({})", self.0)
    }
}

/// Host services consumed by a [`Session`](crate::session::Session).
///
/// # Frame loop pseudocode
///
/// ```rust,ignore
/// // requestAnimationFrame callback
/// fn on_animation_frame() {
///     if let Some(handle) = session.scheduled_frame() {
///         session.on_frame(handle);
///     }
/// }
///
/// // MutationObserver callback
/// fn on_records(records: &[MutationRecord]) {
///     session.on_mutations(records.iter().flat_map(added_elements));
/// }
/// ```
pub trait Host {
    /// Reads the host's monotonic clock.
    fn now(&self) -> HostTime;

    /// Returns the tick-to-nanosecond ratio of [`now`](Self::now).
    fn timebase(&self) -> Timebase;

    /// Arranges one callback at the next display refresh.
    fn request_frame(&mut self) -> FrameHandle;

    /// Cancels a requested frame callback before it fires.
    ///
    /// Must be safe to call with a handle that already fired or was already
    /// cancelled.
    fn cancel_frame(&mut self, handle: FrameHandle);

    /// Arms a one-shot timer that fires after `delay`.
    fn start_timer(&mut self, delay: Duration) -> TimerHandle;

    /// Disarms a one-shot timer. Safe to call on a fired timer.
    fn cancel_timer(&mut self, handle: TimerHandle);

    /// Starts delivering insertion batches under the root container.
    fn connect(&mut self);

    /// Stops delivering insertion batches. Safe to call when not connected.
    fn disconnect(&mut self);
}
