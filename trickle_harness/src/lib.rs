// Copyright 2026 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Off-browser driver for trickle sessions.
//!
//! [`MemoryTree`] is an arena-backed [`VisualTree`] and [`ManualHost`] is a
//! [`Host`] whose clock, frame callbacks, and timers only move when the caller
//! says so. Together they let tests and demos replay insertion bursts against
//! a [`Session`] deterministically.
//!
//! ```
//! use trickle_core::config::ThrottleConfig;
//! use trickle_core::session::Session;
//! use trickle_harness::{ManualHost, MemoryTree, step_frame};
//!
//! let (mut tree, root) = MemoryTree::with_root();
//! let rows: Vec<_> = (0..3).map(|_| tree.element(root, "li")).collect();
//! let config = ThrottleConfig::DEFAULT.with_max_ops_per_frame(2);
//! let mut session = Session::new(tree, ManualHost::new(), config).unwrap();
//! session.start();
//!
//! session.on_mutations(rows);
//! assert_eq!(session.pending_len(), 3);
//! assert!(step_frame(&mut session));
//! assert_eq!(session.pending_len(), 1);
//! ```
//!
//! [`VisualTree`]: trickle_core::node::VisualTree
//! [`Host`]: trickle_core::backend::Host

#![no_std]

extern crate alloc;

mod host;
mod tree;


pub use host::ManualHost;
pub use tree::{MemoryTree, NodeId};

use trickle_core::session::Session;

/// A session over the in-memory tree and manual host.
pub type HarnessSession = Session<MemoryTree, ManualHost>;

/// Fires the oldest outstanding frame callback.
///
/// Returns `false` if no frame was outstanding.
pub fn step_frame(session: &mut HarnessSession) -> bool {
    match session.host_mut().take_frame() {
        Some(handle) => {
            session.on_frame(handle);
            true
        }
        None => false,
    }
}

/// Fires frame callbacks until none is outstanding or `max_frames` have run.
///
/// Returns the number of frames fired.
pub fn run_until_idle(session: &mut HarnessSession, max_frames: u32) -> u32 {
    let mut fired = 0;
    while fired < max_frames && step_frame(session) {
        fired += 1;
    }
    fired
}

/// Delivers every timer whose deadline has passed.
///
/// Returns the number of timers delivered.
pub fn fire_due_timers(session: &mut HarnessSession) -> usize {
    let due = session.host_mut().take_due_timers();
    let n = due.len();
    for handle in due {
        session.on_timer(handle);
    }
    n
}
