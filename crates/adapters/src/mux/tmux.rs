// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tmux implementation of the multiplexer facade.
//!
//! Shells out to the configured tmux binary, optionally over ssh when a
//! remote host string (`user@host`) is configured. All stdout is returned
//! trimmed; failures carry the full command line and captured stderr.

use super::{CaptureRange, MuxAdapter, MuxError};
use async_trait::async_trait;
use ntm_core::PaneInfo;
use std::path::Path;
use tokio::process::Command;

/// Tmux-backed multiplexer client.
#[derive(Clone, Debug)]
pub struct TmuxClient {
    binary: String,
    remote_host: Option<String>,
}

impl Default for TmuxClient {
    fn default() -> Self {
        Self::new("tmux", None)
    }
}

impl TmuxClient {
    pub fn new(binary: impl Into<String>, remote_host: Option<String>) -> Self {
        Self {
            binary: binary.into(),
            remote_host,
        }
    }

    pub fn from_config(config: &ntm_config::TmuxConfig) -> Self {
        Self::new(&config.binary, config.remote_host.clone())
    }

    /// Run a tmux subcommand, returning trimmed stdout.
    async fn run(&self, args: &[&str]) -> Result<String, MuxError> {
        let command_line = self.render_command(args);

        let mut command = match self.remote_host.as_deref() {
            Some(host) => {
                let mut c = Command::new("ssh");
                c.arg(host).arg(&self.binary).args(args);
                c
            }
            None => {
                let mut c = Command::new(&self.binary);
                c.args(args);
                c
            }
        };

        let output = command.output().await.map_err(|source| MuxError::Spawn {
            command: command_line.clone(),
            source,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.contains("can't find") || stderr.contains("no such") {
                return Err(MuxError::NotFound(stderr));
            }
            return Err(MuxError::CommandFailed {
                command: command_line,
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn render_command(&self, args: &[&str]) -> String {
        let mut parts = Vec::with_capacity(args.len() + 2);
        if let Some(host) = self.remote_host.as_deref() {
            parts.push("ssh");
            parts.push(host);
        }
        parts.push(&self.binary);
        parts.extend_from_slice(args);
        parts.join(" ")
    }
}

#[async_trait]
impl MuxAdapter for TmuxClient {
    async fn create_session(&self, name: &str, cwd: &Path) -> Result<(), MuxError> {
        let cwd = cwd.to_string_lossy();
        self.run(&["new-session", "-d", "-s", name, "-c", &cwd])
            .await?;
        Ok(())
    }

    async fn has_session(&self, name: &str) -> Result<bool, MuxError> {
        match self.run(&["has-session", "-t", name]).await {
            Ok(_) => Ok(true),
            Err(MuxError::NotFound(_)) | Err(MuxError::CommandFailed { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn list_panes(&self, session: &str) -> Result<Vec<PaneInfo>, MuxError> {
        let format = "#{pane_id}\t#{pane_index}\t#{pane_pid}\t#{pane_title}";
        let out = self
            .run(&["list-panes", "-t", session, "-F", format])
            .await?;

        let mut panes = Vec::new();
        for line in out.lines().filter(|l| !l.is_empty()) {
            let mut fields = line.splitn(4, '\t');
            let (Some(id), Some(index), Some(pid)) = (fields.next(), fields.next(), fields.next())
            else {
                return Err(MuxError::BadOutput {
                    command: "list-panes".to_string(),
                    detail: format!("short line: {line:?}"),
                });
            };
            let title = fields.next().unwrap_or_default();
            let index: u32 = index.parse().map_err(|_| MuxError::BadOutput {
                command: "list-panes".to_string(),
                detail: format!("bad pane index in {line:?}"),
            })?;
            let shell_pid: u32 = pid.parse().map_err(|_| MuxError::BadOutput {
                command: "list-panes".to_string(),
                detail: format!("bad pane pid in {line:?}"),
            })?;
            panes.push(PaneInfo {
                id: id.to_string(),
                index,
                title: title.to_string(),
                shell_pid,
            });
        }
        Ok(panes)
    }

    async fn split_window(&self, session: &str, cwd: &Path) -> Result<String, MuxError> {
        let cwd = cwd.to_string_lossy();
        self.run(&[
            "split-window",
            "-t",
            session,
            "-c",
            &cwd,
            "-P",
            "-F",
            "#{pane_id}",
        ])
        .await
    }

    async fn send_keys(&self, target: &str, keys: &str) -> Result<(), MuxError> {
        self.run(&["send-keys", "-t", target, keys]).await?;
        Ok(())
    }

    async fn send_literal(&self, target: &str, text: &str) -> Result<(), MuxError> {
        // -l = literal mode (no key name interpretation)
        // -- = end of options (handles text starting with -)
        self.run(&["send-keys", "-t", target, "-l", "--", text])
            .await?;
        Ok(())
    }

    async fn send_line(&self, target: &str, text: &str) -> Result<(), MuxError> {
        self.send_literal(target, text).await?;
        self.run(&["send-keys", "-t", target, "Enter"]).await?;
        Ok(())
    }

    async fn set_pane_title(&self, target: &str, title: &str) -> Result<(), MuxError> {
        self.run(&["select-pane", "-t", target, "-T", title]).await?;
        Ok(())
    }

    async fn select_pane(&self, target: &str, border_style: Option<&str>) -> Result<(), MuxError> {
        match border_style {
            Some(style) => {
                self.run(&["select-pane", "-t", target, "-P", style]).await?;
            }
            None => {
                self.run(&["select-pane", "-t", target]).await?;
            }
        }
        Ok(())
    }

    async fn capture_pane(&self, target: &str, range: CaptureRange) -> Result<String, MuxError> {
        match range {
            CaptureRange::LastLines(lines) => {
                let start = format!("-{lines}");
                self.run(&["capture-pane", "-t", target, "-p", "-S", &start])
                    .await
            }
            CaptureRange::FullHistory => {
                self.run(&["capture-pane", "-t", target, "-p", "-S", "-", "-E", "-"])
                    .await
            }
        }
    }

    async fn kill_session(&self, session: &str) -> Result<(), MuxError> {
        // Session might already be dead, which is fine.
        let _ = self.run(&["kill-session", "-t", session]).await;
        Ok(())
    }

    async fn kill_pane(&self, target: &str) -> Result<(), MuxError> {
        self.run(&["kill-pane", "-t", target]).await?;
        Ok(())
    }

    async fn pipe_pane(&self, target: &str, command: &str) -> Result<(), MuxError> {
        // -o would toggle; unconditional attach replaces any previous pipe.
        self.run(&["pipe-pane", "-t", target, command]).await?;
        Ok(())
    }

    async fn pipe_pane_cancel(&self, target: &str) -> Result<(), MuxError> {
        self.run(&["pipe-pane", "-t", target]).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tmux_tests.rs"]
mod tests;
