// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction so dwell-time logic is testable without sleeping.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

/// Source of time for components that measure dwell and deadlines.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> SystemTime;
    fn instant(&self) -> Instant;
}

/// Real wall/monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock for tests.
#[derive(Debug, Clone)]
pub struct FakeClock {
    inner: Arc<Mutex<FakeClockState>>,
}

#[derive(Debug)]
struct FakeClockState {
    system: SystemTime,
    instant: Instant,
    offset: Duration,
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeClockState {
                system: SystemTime::now(),
                instant: Instant::now(),
                offset: Duration::ZERO,
            })),
        }
    }

    /// Move both the wall and monotonic views forward.
    pub fn advance(&self, by: Duration) {
        let mut state = self.inner.lock();
        state.offset += by;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> SystemTime {
        let state = self.inner.lock();
        state.system + state.offset
    }

    fn instant(&self) -> Instant {
        let state = self.inner.lock();
        state.instant + state.offset
    }
}
