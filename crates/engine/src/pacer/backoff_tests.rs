// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ntm_config::BackoffConfig;
use std::time::Duration;

fn config() -> BackoffConfig {
    BackoffConfig {
        initial_delay_ms: 1000,
        multiplier: 2.0,
        max_delay_ms: 60_000,
        max_consecutive_failures: 3,
        global_pause_duration_ms: 30_000,
    }
}

#[tokio::test(start_paused = true)]
async fn failure_delays_follow_one_two_four() {
    let mut state = BackoffState::new(config());
    let now = Instant::now();

    assert_eq!(state.on_failure(now), Duration::from_secs(1));
    assert_eq!(state.on_failure(now), Duration::from_secs(2));
    assert_eq!(state.on_failure(now), Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn circuit_opens_after_max_consecutive_failures() {
    let mut state = BackoffState::new(config());
    let now = Instant::now();

    state.on_failure(now);
    state.on_failure(now);
    assert!(!matches!(state.gate(now), BackoffGate::FailFast(_)));

    state.on_failure(now); // third failure: breaker opens
    match state.gate(now) {
        BackoffGate::FailFast(until) => {
            assert_eq!(until - now, Duration::from_secs(30));
        }
        other => panic!("expected FailFast, got {other:?}"),
    }

    // Once the pause elapses the gate falls back to the backoff wait (also
    // elapsed here), so admission is clear again.
    let later = now + Duration::from_secs(31);
    assert_eq!(state.gate(later), BackoffGate::Clear);
}

#[tokio::test(start_paused = true)]
async fn single_success_resets_counter() {
    let mut state = BackoffState::new(config());
    let now = Instant::now();

    state.on_failure(now);
    state.on_failure(now);
    state.on_failure(now);
    assert_eq!(state.failures(), 3);

    state.on_success();
    assert_eq!(state.failures(), 0);
    assert_eq!(state.gate(now), BackoffGate::Clear);

    // The sequence starts over at the initial delay.
    assert_eq!(state.on_failure(now), Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn delay_caps_at_max() {
    let mut state = BackoffState::new(BackoffConfig {
        max_delay_ms: 3000,
        max_consecutive_failures: 100,
        ..config()
    });
    let now = Instant::now();
    state.on_failure(now);
    state.on_failure(now);
    assert_eq!(state.on_failure(now), Duration::from_secs(3)); // 4s capped to 3s
    assert_eq!(state.on_failure(now), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn wait_gate_clears_after_deadline() {
    let mut state = BackoffState::new(config());
    let now = Instant::now();
    state.on_failure(now);

    match state.gate(now) {
        BackoffGate::WaitUntil(at) => assert_eq!(at - now, Duration::from_secs(1)),
        other => panic!("expected WaitUntil, got {other:?}"),
    }
    assert_eq!(state.gate(now + Duration::from_secs(2)), BackoffGate::Clear);
}
