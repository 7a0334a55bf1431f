// Copyright 2026 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated insertion bursts that exercise the tracing and diagnostics
//! pipeline.
//!
//! Drives a session over an in-memory tree through a large burst, a second
//! burst landing mid-flush, an overflow burst, a live disable, and teardown.
//! Events go to both a
//! [`PrettyPrintSink`](trickle_debug::pretty::PrettyPrintSink) and a
//! [`RecorderSink`](trickle_debug::recorder::RecorderSink); the recording is
//! then exported as a Chrome trace JSON file.

use std::cell::RefCell;
use std::fs::File;
use std::io::BufWriter;
use std::rc::Rc;

use trickle_core::config::ThrottleConfig;
use trickle_core::session::Session;
use trickle_core::time::{Duration, Timebase};
use trickle_debug::pretty::PrettyPrintSink;
use trickle_debug::recorder::RecorderSink;
use trickle_debug::tee::Tee;
use trickle_harness::{HarnessSession, ManualHost, MemoryTree, NodeId, step_frame};

/// 16.6ms refresh interval in nanoseconds (≈60 Hz).
const REFRESH_INTERVAL_NS: u64 = 16_666_667;
/// Simulated layout cost charged to every clock read during a flush.
const REVEAL_COST_NS: u64 = 45_000;

fn main() {
    let timebase = Timebase::NANOS;

    // -- sinks -------------------------------------------------------------
    let pretty = PrettyPrintSink::new(Box::new(std::io::stdout()), timebase);
    let recorder = Rc::new(RefCell::new(RecorderSink::new()));

    // -- session -----------------------------------------------------------
    let (mut tree, root) = MemoryTree::with_root();
    let first = rows(&mut tree, root, 600);
    let second = rows(&mut tree, root, 150);
    let flood = rows(&mut tree, root, 4_500);
    let tail = rows(&mut tree, root, 300);

    let config = ThrottleConfig::DEFAULT;
    let mut host = ManualHost::new();
    host.advance(Duration(1_000_000_000)); // start at 1s
    let mut session = Session::new(tree, host, config).expect("default config is valid");
    session.set_trace_sink(Box::new(Tee(pretty, Rc::clone(&recorder))));
    session.start();

    // -- 1. a large burst trickles in over several frames -------------------
    session.on_mutations(first);
    run_frames(&mut session, 2);

    // -- 2. a second burst lands mid-flush and drains first -----------------
    session.on_mutations(second);
    run_frames(&mut session, 8);

    // -- 3. a flood trips the overflow guard --------------------------------
    session.on_mutations(flood);
    run_frames(&mut session, 1);

    // -- 4. disabling mid-flush reveals the rest at once --------------------
    session.on_mutations(tail);
    run_frames(&mut session, 1);
    session
        .set_config(config.with_active(false))
        .expect("disabled config is valid");

    // -- 5. teardown --------------------------------------------------------
    session.stop();
    let stats = session.stats();
    drop(session);

    // -- export Chrome trace -----------------------------------------------
    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    trickle_debug::chrome::export(recorder.borrow().as_bytes(), timebase, &mut writer)
        .expect("failed to write Chrome trace");

    println!(
        "Wrote {path} ({} frames, {} revealed, {} overflows)",
        stats.frames, stats.revealed, stats.overflows
    );
}

fn rows(tree: &mut MemoryTree, root: NodeId, n: usize) -> Vec<NodeId> {
    (0..n)
        .map(|_| {
            let row = tree.element(root, "li");
            tree.element(row, "span");
            row
        })
        .collect()
}

/// Fires up to `n` frames at the display refresh cadence.
fn run_frames(session: &mut HarnessSession, n: u32) {
    for _ in 0..n {
        session
            .host_mut()
            .set_step_per_read(Duration(REVEAL_COST_NS));
        let fired = step_frame(session);
        session.host_mut().set_step_per_read(Duration::ZERO);
        session
            .host_mut()
            .advance(Duration(REFRESH_INTERVAL_NS));
        if !fired {
            break;
        }
    }
}
