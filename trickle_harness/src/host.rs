// Copyright 2026 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic host with a manual clock.

use alloc::vec::Vec;
use core::cell::Cell;

use trickle_core::backend::{FrameHandle, Host, TimerHandle};
use trickle_core::time::{Duration, HostTime, Timebase};

/// A [`Host`] whose clock, frames, and timers advance only when told to.
///
/// Ticks are nanoseconds. Every call to [`now`](Host::now) can optionally
/// advance the clock by a fixed step after reading it, which models the cost
/// of work done between clock samples.
#[derive(Debug)]
pub struct ManualHost {
    now: Cell<HostTime>,
    step_per_read: Duration,
    next_handle: i32,
    frames: Vec<FrameHandle>,
    frame_requests: u32,
    cancelled_frames: Vec<FrameHandle>,
    timers: Vec<(TimerHandle, HostTime)>,
    cancelled_timers: Vec<TimerHandle>,
    connected: bool,
    connects: u32,
    disconnects: u32,
}

impl Default for ManualHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualHost {
    /// Creates a host at time zero with a frozen clock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Cell::new(HostTime(0)),
            step_per_read: Duration::ZERO,
            next_handle: 1,
            frames: Vec::new(),
            frame_requests: 0,
            cancelled_frames: Vec::new(),
            timers: Vec::new(),
            cancelled_timers: Vec::new(),
            connected: false,
            connects: 0,
            disconnects: 0,
        }
    }

    /// Advances the clock by `step` after every clock read.
    pub fn set_step_per_read(&mut self, step: Duration) {
        self.step_per_read = step;
    }

    /// Advances the clock.
    pub fn advance(&mut self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Returns the clock without advancing it.
    #[must_use]
    pub fn peek_now(&self) -> HostTime {
        self.now.get()
    }

    /// Removes and returns the oldest outstanding frame request.
    pub fn take_frame(&mut self) -> Option<FrameHandle> {
        if self.frames.is_empty() {
            None
        } else {
            Some(self.frames.remove(0))
        }
    }

    /// Returns outstanding (requested, not fired, not cancelled) frames.
    #[must_use]
    pub fn outstanding_frames(&self) -> &[FrameHandle] {
        &self.frames
    }

    /// Returns every frame handle that was cancelled.
    #[must_use]
    pub fn cancelled_frames(&self) -> &[FrameHandle] {
        &self.cancelled_frames
    }

    /// Returns the number of frames ever requested.
    #[must_use]
    pub fn frame_requests(&self) -> u32 {
        self.frame_requests
    }

    /// Removes and returns timers whose deadline has passed.
    pub fn take_due_timers(&mut self) -> Vec<TimerHandle> {
        let now = self.now.get();
        let mut due = Vec::new();
        self.timers.retain(|&(handle, deadline)| {
            if deadline <= now {
                due.push(handle);
                false
            } else {
                true
            }
        });
        due
    }

    /// Returns armed timers.
    #[must_use]
    pub fn armed_timers(&self) -> usize {
        self.timers.len()
    }

    /// Returns every timer handle that was cancelled.
    #[must_use]
    pub fn cancelled_timers(&self) -> &[TimerHandle] {
        &self.cancelled_timers
    }

    /// Returns `true` while the change feed is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Returns `(connects, disconnects)` call counts.
    #[must_use]
    pub fn connection_calls(&self) -> (u32, u32) {
        (self.connects, self.disconnects)
    }

    fn next_handle(&mut self) -> i32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }
}

impl Host for ManualHost {
    fn now(&self) -> HostTime {
        let now = self.now.get();
        self.now.set(now + self.step_per_read);
        now
    }

    fn timebase(&self) -> Timebase {
        Timebase::NANOS
    }

    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_handle());
        self.frames.push(handle);
        self.frame_requests += 1;
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.frames.retain(|&h| h != handle);
        self.cancelled_frames.push(handle);
    }

    fn start_timer(&mut self, delay: Duration) -> TimerHandle {
        let handle = TimerHandle(self.next_handle());
        let deadline = self.now.get() + delay;
        self.timers.push((handle, deadline));
        handle
    }

    fn cancel_timer(&mut self, handle: TimerHandle) {
        self.timers.retain(|&(h, _)| h != handle);
        self.cancelled_timers.push(handle);
    }

    fn connect(&mut self) {
        self.connected = true;
        self.connects += 1;
    }

    fn disconnect(&mut self) {
        self.connected = false;
        self.disconnects += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_per_read_advances_after_reading() {
        let mut host = ManualHost::new();
        host.set_step_per_read(Duration(5));
        assert_eq!(host.now(), HostTime(0));
        assert_eq!(host.now(), HostTime(5));
        assert_eq!(host.peek_now(), HostTime(10), "peek does not advance");
    }

    #[test]
    fn cancelled_frame_is_no_longer_outstanding() {
        let mut host = ManualHost::new();
        let a = host.request_frame();
        let b = host.request_frame();
        host.cancel_frame(a);
        host.cancel_frame(a);
        assert_eq!(host.outstanding_frames(), &[b]);
        assert_eq!(host.take_frame(), Some(b));
        assert_eq!(host.take_frame(), None);
    }

    #[test]
    fn timers_fire_at_deadline() {
        let mut host = ManualHost::new();
        let t = host.start_timer(Duration(100));
        host.advance(Duration(99));
        assert!(host.take_due_timers().is_empty(), "not due yet");
        host.advance(Duration(1));
        assert_eq!(host.take_due_timers(), [t]);
        assert_eq!(host.armed_timers(), 0);
    }
}
