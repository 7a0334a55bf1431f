// Copyright 2026 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fan-out to two sinks.

use trickle_core::trace::{
    FlushStateEvent, FlushSummary, IntakeEvent, LifecycleEvent, MassRevealEvent, TraceSink,
};

/// A [`TraceSink`] that forwards every event to `A` and then to `B`.
///
/// Nest `Tee`s for more than two destinations.
#[derive(Clone, Debug, Default)]
pub struct Tee<A, B>(pub A, pub B);

impl<A: TraceSink, B: TraceSink> TraceSink for Tee<A, B> {
    fn on_lifecycle(&mut self, e: &LifecycleEvent) {
        self.0.on_lifecycle(e);
        self.1.on_lifecycle(e);
    }

    fn on_intake(&mut self, e: &IntakeEvent) {
        self.0.on_intake(e);
        self.1.on_intake(e);
    }

    fn on_flush_state(&mut self, e: &FlushStateEvent) {
        self.0.on_flush_state(e);
        self.1.on_flush_state(e);
    }

    fn on_flush_summary(&mut self, s: &FlushSummary) {
        self.0.on_flush_summary(s);
        self.1.on_flush_summary(s);
    }

    fn on_mass_reveal(&mut self, e: &MassRevealEvent) {
        self.0.on_mass_reveal(e);
        self.1.on_mass_reveal(e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::{RecorderSink, decode};
    use trickle_core::time::HostTime;
    use trickle_core::trace::MassRevealCause;

    #[test]
    fn both_sides_see_every_event() {
        let mut tee = Tee(RecorderSink::new(), RecorderSink::new());
        tee.on_mass_reveal(&MassRevealEvent {
            at: HostTime(3),
            revealed: 12,
            cause: MassRevealCause::Explicit,
        });
        assert_eq!(decode(tee.0.as_bytes()).count(), 1);
        assert_eq!(tee.0.as_bytes(), tee.1.as_bytes());
    }
}
