// Copyright 2026 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for trickle.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`WebThrottle`]: the page-level driver that owns a session
//! - [`DomTree`]: the live DOM as a [`VisualTree`](trickle_core::node::VisualTree)
//! - [`WebHost`]: `requestAnimationFrame`, `setTimeout`, and a
//!   `MutationObserver` as a [`Host`](trickle_core::backend::Host)
//!
//! Pending nodes carry the [`HIDDEN_MARKER_ATTRIBUTE`] attribute. The page is
//! expected to hide them with a stylesheet rule.

#![no_std]

extern crate alloc;

mod host;
mod throttle;
mod tree;

pub use host::WebHost;
pub use throttle::{ThrottleError, WebThrottle};
pub use tree::{DomNode, DomTree, HIDDEN_MARKER_ATTRIBUTE};

use trickle_core::time::{HostTime, Timebase};

/// Returns the current host time from `performance.now()`.
///
/// The returned [`HostTime`] is in microsecond ticks. Use [`timebase`] to
/// convert to nanoseconds.
#[must_use]
pub fn now() -> HostTime {
    let ms = host::performance_now();
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "performance.now() returns small positive f64; µs fits in u64"
    )]
    let us = (ms * 1000.0) as u64;
    HostTime(us)
}

/// Returns the web [`Timebase`]: 1 tick = 1 µs = 1000 ns.
#[must_use]
pub fn timebase() -> Timebase {
    Timebase::MICROS
}

#[cfg(test)]
mod tests {
    use super::*;
    use trickle_core::time::Duration;

    #[test]
    fn timebase_is_microsecond() {
        let tb = timebase();
        // 1 tick = 1 µs = 1000 ns
        assert_eq!(tb.ticks_to_nanos(1), 1000);
        assert_eq!(tb.ticks_to_nanos(1_000_000), 1_000_000_000);
    }

    #[test]
    fn start_delay_converts_to_whole_milliseconds() {
        let tb = timebase();
        assert_eq!(host::timeout_ms(Duration::from_millis(250, tb), tb), 250);
        assert_eq!(host::timeout_ms(Duration(1_999), tb), 1, "rounds down");
        assert_eq!(
            host::timeout_ms(Duration(u64::MAX / 1000), tb),
            i32::MAX,
            "clamps oversized delays"
        );
    }
}
