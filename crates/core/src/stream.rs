// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sequenced pane-output events shared by the streamer and its consumers.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// A batch of output lines from one pane.
///
/// `seq` is strictly increasing and contiguous within a streamer lifetime.
/// `is_full` marks snapshots taken by the polling fallback; incremental
/// batches from the pipe fast path carry `is_full = false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    pub target: String,
    pub lines: Vec<String>,
    pub seq: u64,
    pub timestamp: SystemTime,
    pub is_full: bool,
}

impl StreamEvent {
    pub fn new(target: impl Into<String>, lines: Vec<String>, seq: u64, is_full: bool) -> Self {
        Self {
            target: target.into(),
            lines,
            seq,
            timestamp: SystemTime::now(),
            is_full,
        }
    }

    /// Joined view of the batch, newline-separated.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}
