// Copyright 2026 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Live throttling configuration.
//!
//! A [`ThrottleConfig`] is handed to the session at construction and may be
//! replaced at any time through
//! [`Session::set_config`](crate::session::Session::set_config). The flush
//! loop reads the budget fields once at the start of every frame, so a change
//! applies from the next frame on and never inside a frame already running.

use core::fmt;

/// Throttling parameters supplied by the host's configuration store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ThrottleConfig {
    /// Whether new insertions are hidden and trickled in.
    ///
    /// Turning this off reveals every pending node at once and stops intake
    /// until it is turned back on.
    pub active: bool,
    /// Per-frame time cap for revealing nodes, in milliseconds (at least 1).
    pub frame_budget_ms: u32,
    /// Per-frame cap on revealed nodes (at least 1).
    pub max_ops_per_frame: u32,
    /// One-shot delay between [`start`](crate::session::Session::start) and
    /// attaching the change observer, in milliseconds.
    pub start_delay_ms: u32,
}

impl ThrottleConfig {
    /// Active, 8ms per frame, 200 reveals per frame, no start delay.
    pub const DEFAULT: Self = Self {
        active: true,
        frame_budget_ms: 8,
        max_ops_per_frame: 200,
        start_delay_ms: 0,
    };

    /// Returns a copy with `active` set to the given value.
    #[must_use]
    pub const fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Returns a copy with the given frame budget.
    #[must_use]
    pub const fn with_frame_budget_ms(mut self, ms: u32) -> Self {
        self.frame_budget_ms = ms;
        self
    }

    /// Returns a copy with the given per-frame reveal cap.
    #[must_use]
    pub const fn with_max_ops_per_frame(mut self, ops: u32) -> Self {
        self.max_ops_per_frame = ops;
        self
    }

    /// Returns a copy with the given start delay.
    #[must_use]
    pub const fn with_start_delay_ms(mut self, ms: u32) -> Self {
        self.start_delay_ms = ms;
        self
    }

    /// Checks the lower bounds on the per-frame budgets.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_budget_ms == 0 {
            return Err(ConfigError::ZeroFrameBudget);
        }
        if self.max_ops_per_frame == 0 {
            return Err(ConfigError::ZeroOpsPerFrame);
        }
        Ok(())
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Errors from [`ThrottleConfig::validate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `frame_budget_ms` was zero; no node could ever be revealed.
    ZeroFrameBudget,
    /// `max_ops_per_frame` was zero; no node could ever be revealed.
    ZeroOpsPerFrame,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroFrameBudget => write!(f, "frame budget must be at least 1ms"),
            Self::ZeroOpsPerFrame => write!(f, "max ops per frame must be at least 1"),
        }
    }
}

impl core::error::Error for ConfigError {}
