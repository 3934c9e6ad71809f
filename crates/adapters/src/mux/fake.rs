// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory multiplexer fake for tests.

use super::{CaptureRange, MuxAdapter, MuxError};
use async_trait::async_trait;
use ntm_core::PaneInfo;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;

/// One recorded adapter invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MuxCall {
    CreateSession(String),
    ListPanes(String),
    SplitWindow(String),
    SendKeys(String, String),
    SendLiteral(String, String),
    SendLine(String, String),
    SetPaneTitle(String, String),
    SelectPane(String, Option<String>),
    Capture(String),
    KillSession(String),
    KillPane(String),
    PipePane(String, String),
    PipePaneCancel(String),
}

#[derive(Default)]
struct FakeState {
    calls: Vec<MuxCall>,
    sessions: HashMap<String, Vec<PaneInfo>>,
    /// Scripted capture snapshots per target; the last one repeats.
    captures: HashMap<String, VecDeque<String>>,
    fail_pipe_pane: bool,
    next_pane_id: u32,
}

/// Records every call and serves scripted captures.
#[derive(Clone, Default)]
pub struct FakeMux {
    state: Arc<Mutex<FakeState>>,
}

impl FakeMux {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `pipe_pane` calls fail, forcing streamers into the
    /// polling fallback.
    pub fn fail_pipe_pane(&self) {
        self.state.lock().fail_pipe_pane = true;
    }

    /// Queue a capture snapshot for a target. The final snapshot repeats
    /// once the queue drains.
    pub fn push_capture(&self, target: &str, snapshot: &str) {
        self.state
            .lock()
            .captures
            .entry(target.to_string())
            .or_default()
            .push_back(snapshot.to_string());
    }

    pub fn add_pane(&self, session: &str, pane: PaneInfo) {
        self.state
            .lock()
            .sessions
            .entry(session.to_string())
            .or_default()
            .push(pane);
    }

    pub fn calls(&self) -> Vec<MuxCall> {
        self.state.lock().calls.clone()
    }

    /// Lines sent to a target via `send_line`, in order.
    pub fn sent_lines(&self, target: &str) -> Vec<String> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                MuxCall::SendLine(t, line) if t == target => Some(line.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn killed_panes(&self) -> Vec<String> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                MuxCall::KillPane(t) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: MuxCall) {
        self.state.lock().calls.push(call);
    }
}

#[async_trait]
impl MuxAdapter for FakeMux {
    async fn create_session(&self, name: &str, _cwd: &Path) -> Result<(), MuxError> {
        self.record(MuxCall::CreateSession(name.to_string()));
        self.state
            .lock()
            .sessions
            .entry(name.to_string())
            .or_default();
        Ok(())
    }

    async fn has_session(&self, name: &str) -> Result<bool, MuxError> {
        Ok(self.state.lock().sessions.contains_key(name))
    }

    async fn list_panes(&self, session: &str) -> Result<Vec<PaneInfo>, MuxError> {
        self.record(MuxCall::ListPanes(session.to_string()));
        self.state
            .lock()
            .sessions
            .get(session)
            .cloned()
            .ok_or_else(|| MuxError::NotFound(session.to_string()))
    }

    async fn split_window(&self, session: &str, _cwd: &Path) -> Result<String, MuxError> {
        self.record(MuxCall::SplitWindow(session.to_string()));
        let mut state = self.state.lock();
        state.next_pane_id += 1;
        let next_pane_id = state.next_pane_id;
        let id = format!("%{}", next_pane_id);
        let index = state
            .sessions
            .get(session)
            .map(|p| p.len() as u32)
            .unwrap_or(0);
        state
            .sessions
            .entry(session.to_string())
            .or_default()
            .push(PaneInfo {
                id: id.clone(),
                index,
                title: String::new(),
                shell_pid: 10_000 + next_pane_id,
            });
        Ok(id)
    }

    async fn send_keys(&self, target: &str, keys: &str) -> Result<(), MuxError> {
        self.record(MuxCall::SendKeys(target.to_string(), keys.to_string()));
        Ok(())
    }

    async fn send_literal(&self, target: &str, text: &str) -> Result<(), MuxError> {
        self.record(MuxCall::SendLiteral(target.to_string(), text.to_string()));
        Ok(())
    }

    async fn send_line(&self, target: &str, text: &str) -> Result<(), MuxError> {
        self.record(MuxCall::SendLine(target.to_string(), text.to_string()));
        Ok(())
    }

    async fn set_pane_title(&self, target: &str, title: &str) -> Result<(), MuxError> {
        self.record(MuxCall::SetPaneTitle(target.to_string(), title.to_string()));
        // Mirror the title into any matching pane record.
        let mut state = self.state.lock();
        for panes in state.sessions.values_mut() {
            for pane in panes.iter_mut() {
                if pane.id == target {
                    pane.title = title.to_string();
                }
            }
        }
        Ok(())
    }

    async fn select_pane(&self, target: &str, border_style: Option<&str>) -> Result<(), MuxError> {
        self.record(MuxCall::SelectPane(
            target.to_string(),
            border_style.map(str::to_string),
        ));
        Ok(())
    }

    async fn capture_pane(&self, target: &str, _range: CaptureRange) -> Result<String, MuxError> {
        self.record(MuxCall::Capture(target.to_string()));
        let mut state = self.state.lock();
        let queue = state
            .captures
            .get_mut(target)
            .ok_or_else(|| MuxError::NotFound(target.to_string()))?;
        let snapshot = if queue.len() > 1 {
            queue.pop_front().unwrap_or_default()
        } else {
            queue.front().cloned().unwrap_or_default()
        };
        Ok(snapshot)
    }

    async fn kill_session(&self, session: &str) -> Result<(), MuxError> {
        self.record(MuxCall::KillSession(session.to_string()));
        self.state.lock().sessions.remove(session);
        Ok(())
    }

    async fn kill_pane(&self, target: &str) -> Result<(), MuxError> {
        self.record(MuxCall::KillPane(target.to_string()));
        Ok(())
    }

    async fn pipe_pane(&self, target: &str, command: &str) -> Result<(), MuxError> {
        self.record(MuxCall::PipePane(target.to_string(), command.to_string()));
        if self.state.lock().fail_pipe_pane {
            return Err(MuxError::CommandFailed {
                command: format!("pipe-pane -t {target}"),
                stderr: "pipe-pane unsupported".to_string(),
            });
        }
        Ok(())
    }

    async fn pipe_pane_cancel(&self, target: &str) -> Result<(), MuxError> {
        self.record(MuxCall::PipePaneCancel(target.to_string()));
        Ok(())
    }
}
