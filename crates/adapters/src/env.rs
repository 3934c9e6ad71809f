// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the adapters crate.

use std::time::Duration;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Streamer FIFO read deadline per iteration (default: 10ms).
pub fn fifo_read_deadline() -> Duration {
    parse_duration_ms("NTM_FIFO_READ_DEADLINE_MS").unwrap_or(Duration::from_millis(10))
}

/// Streamer flush interval for pending lines (default: 50ms).
pub fn stream_flush_interval() -> Duration {
    parse_duration_ms("NTM_STREAM_FLUSH_MS").unwrap_or(Duration::from_millis(50))
}

/// Capture-poll cadence when the pipe fast path is unavailable
/// (default: 500ms).
pub fn stream_fallback_poll_interval() -> Duration {
    parse_duration_ms("NTM_STREAM_FALLBACK_POLL_MS").unwrap_or(Duration::from_millis(500))
}

/// PID-map refresh cadence (default: 5000ms).
pub fn pidmap_refresh_interval() -> Duration {
    parse_duration_ms("NTM_PIDMAP_REFRESH_MS").unwrap_or(Duration::from_secs(5))
}
