// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failure backoff and the global circuit breaker (gate G4).

use ntm_config::BackoffConfig;
use std::time::Duration;
use tokio::time::Instant;

/// What G4 says about the next admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BackoffGate {
    /// No outstanding failures; admit.
    Clear,
    /// Wait until this instant before the next attempt.
    WaitUntil(Instant),
    /// Circuit open: fail fast until this instant.
    FailFast(Instant),
}

/// Consecutive-failure tracking shared by every gate pump.
#[derive(Debug)]
pub(crate) struct BackoffState {
    config: BackoffConfig,
    failures: u32,
    next_allowed: Option<Instant>,
    pause_until: Option<Instant>,
}

impl BackoffState {
    pub(crate) fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            failures: 0,
            next_allowed: None,
            pause_until: None,
        }
    }

    pub(crate) fn failures(&self) -> u32 {
        self.failures
    }

    /// Delay before attempt `n+1` after the `n`-th consecutive failure:
    /// `min(max_delay, initial * multiplier^(n-1))`.
    fn delay_after(&self, failures: u32) -> Duration {
        let initial = self.config.initial_delay_ms as f64;
        let exponent = failures.saturating_sub(1);
        let raw = initial * self.config.multiplier.powi(exponent as i32);
        let capped = raw.min(self.config.max_delay_ms as f64);
        Duration::from_millis(capped as u64)
    }

    /// Record a failed spawn; returns the wait imposed on the next attempt.
    pub(crate) fn on_failure(&mut self, now: Instant) -> Duration {
        self.failures += 1;
        let delay = self.delay_after(self.failures);
        self.next_allowed = Some(now + delay);
        if self.failures >= self.config.max_consecutive_failures {
            let pause = Duration::from_millis(self.config.global_pause_duration_ms);
            self.pause_until = Some(now + pause);
            tracing::warn!(
                failures = self.failures,
                pause_ms = self.config.global_pause_duration_ms,
                "spawn circuit breaker opened"
            );
        }
        delay
    }

    /// A single success clears everything.
    pub(crate) fn on_success(&mut self) {
        self.failures = 0;
        self.next_allowed = None;
        self.pause_until = None;
    }

    pub(crate) fn gate(&mut self, now: Instant) -> BackoffGate {
        if let Some(until) = self.pause_until {
            if now < until {
                return BackoffGate::FailFast(until);
            }
            self.pause_until = None;
        }
        if let Some(at) = self.next_allowed {
            if now < at {
                return BackoffGate::WaitUntil(at);
            }
            self.next_allowed = None;
        }
        BackoffGate::Clear
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
