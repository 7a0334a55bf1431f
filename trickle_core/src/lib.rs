// Copyright 2026 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame-budgeted reveal scheduling for bursty visual trees.
//!
//! When a host application inserts hundreds or thousands of nodes at once,
//! laying them all out and painting them in one refresh stalls the rendering
//! pipeline. `trickle_core` hides freshly inserted nodes and reveals them a
//! few at a time across display refreshes, bounded per refresh by a time
//! budget and an operation count. It is `no_std` compatible (with `alloc`)
//! and talks to the host only through traits.
//!
//! # Architecture
//!
//! ```text
//!   Host change feed
//!       │ inserted nodes
//!       ▼
//!   Session::on_mutations ──► intake::collect ──► PendingStore::enqueue
//!                                                       │ (hidden)
//!       ┌───────────── overflow? ◄──────────────────────┤
//!       ▼                                               ▼
//!   mass reveal                               Host::request_frame
//!                                                       │
//!                                                       ▼
//!                              Session::on_frame ──► drain_next + reveal
//!                                                  (until ops/time budget)
//! ```
//!
//! **[`node`]** — The [`VisualTree`](node::VisualTree) capability trait that
//! backends implement over their node handles, and the reveal action.
//!
//! **[`intake`]** — Per-node accept/skip/reject classification of inserted
//! subtrees, and the [`IntakeRules`](intake::IntakeRules) it applies.
//!
//! **[`pending`]** — [`PendingStore`](pending::PendingStore), the
//! deduplicated last-in-first-out set of hidden nodes.
//!
//! **[`session`]** — [`Session`](session::Session): lifecycle, intake, the
//! frame-budgeted flush loop, the overflow guard, and teardown.
//!
//! **[`config`]** — Live [`ThrottleConfig`](config::ThrottleConfig).
//!
//! **[`backend`]** — The [`Host`](backend::Host) trait for clocks, frame
//! callbacks, timers, and the change feed.
//!
//! **[`time`]** — Host ticks, durations, and timebase conversion.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! session instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod backend;
pub mod config;
pub mod intake;
pub mod node;
pub mod pending;
pub mod session;
pub mod time;
pub mod trace;
