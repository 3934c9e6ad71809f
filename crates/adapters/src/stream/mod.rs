// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-pane output streaming.
//!
//! The fast path pipes pane output into a named FIFO and reads it
//! incrementally; when the multiplexer cannot pipe (or the FIFO read fails
//! fatally) the streamer degrades to capture-polling with content-hash
//! deduplication. Either way consumers see one sequenced event stream.

mod streamer;

pub(crate) use streamer::StreamerHandle;

use crate::mux::MuxAdapter;
use ntm_core::StreamEvent;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Buffer between streamers and the consumer of [`StreamEvent`]s.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Tuning for one streamer.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Directory where FIFOs are created.
    pub fifo_dir: PathBuf,
    /// Emit when this many lines are pending, even inside the flush window.
    pub max_lines_per_event: usize,
    /// Emit pending lines at least this often.
    pub flush_interval: Duration,
    /// FIFO read deadline per iteration.
    pub read_deadline: Duration,
    /// Capture cadence in polling fallback.
    pub fallback_poll_interval: Duration,
    /// Lines captured per fallback poll.
    pub fallback_poll_lines: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            fifo_dir: std::env::temp_dir(),
            max_lines_per_event: 100,
            flush_interval: crate::env::stream_flush_interval(),
            read_deadline: crate::env::fifo_read_deadline(),
            fallback_poll_interval: crate::env::stream_fallback_poll_interval(),
            fallback_poll_lines: 200,
        }
    }
}

/// Stream-manager counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamStats {
    pub active_streams: usize,
    pub pipe_pane_count: usize,
    pub fallback_count: usize,
}

/// Owns one streamer per target pane.
pub struct StreamManager<M: MuxAdapter> {
    mux: M,
    config: StreamConfig,
    event_tx: mpsc::Sender<StreamEvent>,
    streamers: Arc<RwLock<HashMap<String, StreamerHandle>>>,
}

impl<M: MuxAdapter> StreamManager<M> {
    /// Create a manager and the receiving end of its event stream.
    pub fn new(mux: M, config: StreamConfig) -> (Self, mpsc::Receiver<StreamEvent>) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        (
            Self {
                mux,
                config,
                event_tx,
                streamers: Arc::new(RwLock::new(HashMap::new())),
            },
            event_rx,
        )
    }

    /// Start streaming a target. Idempotent: a second call for the same
    /// target leaves the existing streamer untouched.
    pub fn start_stream(&self, target: &str) {
        let mut streamers = self.streamers.write();
        if streamers.contains_key(target) {
            return;
        }
        let handle = streamer::spawn(
            self.mux.clone(),
            target.to_string(),
            self.config.clone(),
            self.event_tx.clone(),
        );
        streamers.insert(target.to_string(), handle);
        tracing::debug!(target, "stream started");
    }

    /// Stop one streamer. A no-op when the target is unknown.
    pub async fn stop_stream(&self, target: &str) {
        let handle = self.streamers.write().remove(target);
        if let Some(handle) = handle {
            handle.stop(&self.mux).await;
            tracing::debug!(target, "stream stopped");
        }
    }

    /// Stop every streamer.
    pub async fn stop_all(&self) {
        let targets: Vec<String> = self.streamers.read().keys().cloned().collect();
        for target in targets {
            self.stop_stream(&target).await;
        }
    }

    /// Targets with a live streamer.
    pub fn active(&self) -> Vec<String> {
        self.streamers.read().keys().cloned().collect()
    }

    pub fn stats(&self) -> StreamStats {
        let streamers = self.streamers.read();
        let fallback_count = streamers.values().filter(|h| h.is_fallback()).count();
        StreamStats {
            active_streams: streamers.len(),
            pipe_pane_count: streamers.len() - fallback_count,
            fallback_count,
        }
    }
}

/// Cheap content hash for fallback dedup: length plus the first and last 32
/// bytes of the snapshot.
pub(crate) fn snapshot_hash(content: &str) -> String {
    let bytes = content.as_bytes();
    let head = &bytes[..bytes.len().min(32)];
    let tail = &bytes[bytes.len().saturating_sub(32)..];
    format!(
        "{}:{}:{}",
        bytes.len(),
        String::from_utf8_lossy(head),
        String::from_utf8_lossy(tail)
    )
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
