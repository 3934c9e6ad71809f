// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal-multiplexer adapters.

mod tmux;

pub use tmux::TmuxClient;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeMux, MuxCall};

use async_trait::async_trait;
use ntm_core::PaneInfo;
use std::path::Path;
use thiserror::Error;

/// Errors from multiplexer operations.
#[derive(Debug, Error)]
pub enum MuxError {
    #[error("target not found: {0}")]
    NotFound(String),
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("{command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },
    #[error("unexpected output from {command}: {detail}")]
    BadOutput { command: String, detail: String },
}

/// What to capture from a pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureRange {
    /// The last N lines of the visible pane plus recent history.
    LastLines(u32),
    /// The full scrollback.
    FullHistory,
}

/// Functional facade over the terminal multiplexer.
///
/// Every call resolves once the external command returns; callers impose
/// deadlines with `tokio::time::timeout` and cancellation by dropping the
/// future, which kills nothing but stops the wait.
#[async_trait]
pub trait MuxAdapter: Clone + Send + Sync + 'static {
    /// Create a detached session rooted at `cwd`.
    async fn create_session(&self, name: &str, cwd: &Path) -> Result<(), MuxError>;

    /// Whether a session with this exact name exists.
    async fn has_session(&self, name: &str) -> Result<bool, MuxError>;

    /// List panes of a session with their ids, indexes, titles and shell PIDs.
    async fn list_panes(&self, session: &str) -> Result<Vec<PaneInfo>, MuxError>;

    /// Split a new pane into the session; returns the new pane id.
    async fn split_window(&self, session: &str, cwd: &Path) -> Result<String, MuxError>;

    /// Send keys with key-name interpretation (e.g. `Enter`, `C-c`).
    async fn send_keys(&self, target: &str, keys: &str) -> Result<(), MuxError>;

    /// Send literal text, no key-name interpretation.
    async fn send_literal(&self, target: &str, text: &str) -> Result<(), MuxError>;

    /// Send literal text followed by Enter.
    async fn send_line(&self, target: &str, text: &str) -> Result<(), MuxError>;

    async fn set_pane_title(&self, target: &str, title: &str) -> Result<(), MuxError>;

    /// Focus a pane, optionally applying a border style.
    async fn select_pane(&self, target: &str, border_style: Option<&str>) -> Result<(), MuxError>;

    /// Capture pane contents as trimmed text.
    async fn capture_pane(&self, target: &str, range: CaptureRange) -> Result<String, MuxError>;

    async fn kill_session(&self, session: &str) -> Result<(), MuxError>;

    async fn kill_pane(&self, target: &str) -> Result<(), MuxError>;

    /// Attach a shell command consuming the pane's output stream.
    ///
    /// The command string is evaluated by a shell on the multiplexer side;
    /// callers must quote paths.
    async fn pipe_pane(&self, target: &str, command: &str) -> Result<(), MuxError>;

    /// Detach any output pipe from the pane.
    async fn pipe_pane_cancel(&self, target: &str) -> Result<(), MuxError>;
}

/// Quote a string for safe interpolation into a shell command line.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

#[cfg(test)]
mod shell_quote_tests {
    use super::shell_quote;

    #[test]
    fn plain_strings_get_single_quotes() {
        assert_eq!(shell_quote("/tmp/x.fifo"), "'/tmp/x.fifo'");
    }

    #[test]
    fn embedded_quotes_are_escaped() {
        assert_eq!(shell_quote("a'b"), r"'a'\''b'");
    }
}
