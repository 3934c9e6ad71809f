// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Context-window rotation.
//!
//! Watches per-pane context usage from the output stream, warns at the
//! first threshold, and performs a compact-or-rotate handoff at the
//! second: try the agent's compact command, and when that is not enough,
//! gather a bounded summary, confirm if configured, then restart the agent
//! with a continuation prompt carrying the summary.

use crate::bus::Emitter;
use crate::rotation::account::send_interrupt;
use async_trait::async_trait;
use ntm_adapters::mux::{CaptureRange, MuxAdapter};
use ntm_config::{AgentsConfig, ContextRotationConfig, RecoveryConfig};
use ntm_core::{AgentKind, BusEvent, EventType, StreamEvent};
use parking_lot::Mutex;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::time::Instant;

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
/// `82% used`, `82% of context used`.
static USED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,3}(?:\.\d+)?)\s*%\s*(?:of\s+context\s+)?used")
        .expect("constant regex pattern is valid")
});

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
/// `context left: 18%`, `18% remaining`, `context left until auto-compact: 8%`.
static LEFT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:context[^%\n]*?(\d{1,3}(?:\.\d+)?)\s*%|(\d{1,3}(?:\.\d+)?)\s*%\s*(?:remaining|left))",
    )
    .expect("constant regex pattern is valid")
});

/// Extract a context-usage fraction from one output line.
///
/// Lines reporting used percent win over lines reporting remaining
/// percent; the result is clamped to `[0, 1]`.
pub fn parse_context_usage(line: &str) -> Option<f64> {
    if let Some(caps) = USED_PATTERN.captures(line) {
        let used: f64 = caps.get(1)?.as_str().parse().ok()?;
        return Some((used / 100.0).clamp(0.0, 1.0));
    }
    if line.to_lowercase().contains("context") || line.contains('%') {
        if let Some(caps) = LEFT_PATTERN.captures(line) {
            let left: f64 = caps
                .get(1)
                .or_else(|| caps.get(2))?
                .as_str()
                .parse()
                .ok()?;
            return Some((1.0 - left / 100.0).clamp(0.0, 1.0));
        }
    }
    None
}

/// Pluggable source of handoff context (mail inbox tail, memory rules,
/// beads). Each packer is gated by its recovery-config flag at wiring time.
#[async_trait]
pub trait ContextPacker: Send + Sync {
    fn name(&self) -> &str;
    async fn pack(&self) -> Option<String>;
}

#[derive(Debug, Clone)]
struct PaneWatch {
    session: String,
    kind: AgentKind,
    registered_at: Instant,
    last_usage: f64,
    warned: bool,
    in_flight: bool,
}

/// Supervises context usage for registered panes.
pub struct ContextRotationSupervisor<M: MuxAdapter> {
    config: ContextRotationConfig,
    recovery: RecoveryConfig,
    agents: AgentsConfig,
    mux: M,
    emitter: Arc<Emitter>,
    packers: Vec<Arc<dyn ContextPacker>>,
    panes: Mutex<HashMap<String, PaneWatch>>,
}

impl<M: MuxAdapter> ContextRotationSupervisor<M> {
    pub fn new(
        config: ContextRotationConfig,
        recovery: RecoveryConfig,
        agents: AgentsConfig,
        mux: M,
        emitter: Arc<Emitter>,
        packers: Vec<Arc<dyn ContextPacker>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            recovery,
            agents,
            mux,
            emitter,
            packers,
            panes: Mutex::new(HashMap::new()),
        })
    }

    /// Start watching a pane.
    pub fn register_pane(&self, target: &str, session: &str, kind: AgentKind) {
        self.panes.lock().insert(
            target.to_string(),
            PaneWatch {
                session: session.to_string(),
                kind,
                registered_at: Instant::now(),
                last_usage: 0.0,
                warned: false,
                in_flight: false,
            },
        );
    }

    pub fn unregister_pane(&self, target: &str) {
        self.panes.lock().remove(target);
    }

    /// Last observed usage fraction for a pane.
    pub fn usage(&self, target: &str) -> Option<f64> {
        self.panes.lock().get(target).map(|w| w.last_usage)
    }

    /// Feed one stream event through the usage watcher.
    ///
    /// May emit a warning event or kick off a rotation; a rotation already
    /// in flight for the pane coalesces further triggers.
    pub fn observe(self: &Arc<Self>, event: &StreamEvent) {
        if !self.config.enabled {
            return;
        }
        let Some(usage) = event.lines.iter().rev().find_map(|l| parse_context_usage(l)) else {
            return;
        };

        let decision = {
            let mut panes = self.panes.lock();
            let Some(watch) = panes.get_mut(&event.target) else {
                return;
            };
            watch.last_usage = usage;

            if usage >= self.config.rotate_threshold {
                let old_enough = watch.registered_at.elapsed()
                    >= Duration::from_secs(self.config.min_session_age_sec);
                if watch.in_flight {
                    Decision::None
                } else if !old_enough {
                    tracing::debug!(target = %event.target, usage, "rotation suppressed: session too young");
                    Decision::None
                } else {
                    watch.in_flight = true;
                    Decision::Rotate {
                        session: watch.session.clone(),
                        kind: watch.kind.clone(),
                    }
                }
            } else if usage >= self.config.warning_threshold && !watch.warned {
                watch.warned = true;
                Decision::Warn {
                    session: watch.session.clone(),
                }
            } else {
                Decision::None
            }
        };

        match decision {
            Decision::None => {}
            Decision::Warn { session } => {
                tracing::info!(target = %event.target, usage, "context usage warning");
                self.emitter.emit(
                    BusEvent::new(EventType::HealthDegraded, session)
                        .with_pane(event.target.clone())
                        .with_message(format!("context usage at {:.0}%", usage * 100.0)),
                );
            }
            Decision::Rotate { session, kind } => {
                let supervisor = Arc::clone(self);
                let target = event.target.clone();
                tokio::spawn(async move {
                    supervisor.rotate(&target, &session, &kind, usage).await;
                    if let Some(watch) = supervisor.panes.lock().get_mut(&target) {
                        watch.in_flight = false;
                    }
                });
            }
        }
    }

    /// The compact-or-rotate handoff.
    async fn rotate(&self, target: &str, session: &str, kind: &AgentKind, usage: f64) {
        tracing::info!(target, usage, "context rotation triggered");

        // Step 1: compaction may make the restart unnecessary.
        if self.config.try_compact_first && self.compact_recovers(target).await {
            tracing::info!(target, "compaction recovered context headroom");
            if let Some(watch) = self.panes.lock().get_mut(target) {
                watch.warned = false;
                watch.last_usage = 0.0;
            }
            return;
        }

        // Step 2: gather the handoff summary.
        let summary = self.gather_summary(target).await;

        // Step 3: operator confirmation window.
        let action = if self.config.require_confirm {
            tokio::time::sleep(Duration::from_secs(self.config.confirm_timeout_sec)).await;
            self.config.default_confirm_action.as_str()
        } else {
            "rotate"
        };
        match action {
            "ignore" => {
                tracing::info!(target, "rotation skipped by confirm policy");
                return;
            }
            "compact" => {
                let _ = self.mux.send_line(target, "/compact").await;
                return;
            }
            _ => {}
        }

        // Step 4: kill-and-restart with the continuation prompt.
        if let Err(e) = self.restart_with_summary(target, kind, &summary).await {
            tracing::error!(target, error = %e, "context rotation restart failed");
            self.emitter.emit(
                BusEvent::new(EventType::AgentError, session)
                    .with_pane(target)
                    .with_message(format!("context rotation failed: {e}")),
            );
            return;
        }

        if let Some(watch) = self.panes.lock().get_mut(target) {
            watch.warned = false;
            watch.last_usage = 0.0;
            watch.registered_at = Instant::now();
        }
        self.emitter.emit(
            BusEvent::new(EventType::AgentRestarted, session)
                .with_pane(target)
                .with_message("context rotation".to_string()),
        );
    }

    /// Issue the compact command, wait, and re-sample usage.
    async fn compact_recovers(&self, target: &str) -> bool {
        if self.mux.send_line(target, "/compact").await.is_err() {
            return false;
        }
        tokio::time::sleep(Duration::from_secs(self.config.compact_wait_secs)).await;

        let Ok(snapshot) = self
            .mux
            .capture_pane(target, CaptureRange::LastLines(50))
            .await
        else {
            return false;
        };
        let usage = snapshot
            .lines()
            .rev()
            .find_map(parse_context_usage)
            .unwrap_or(1.0);
        usage < self.config.warning_threshold
    }

    /// Scrollback tail plus enabled packers, capped to the summary budget.
    async fn gather_summary(&self, target: &str) -> String {
        // Rough chars-per-token factor used across the handoff budget math.
        const CHARS_PER_TOKEN: usize = 4;
        let summary_budget = self.config.summary_max_tokens as usize * CHARS_PER_TOKEN;
        let total_budget = (self.recovery.max_tokens as usize * CHARS_PER_TOKEN).max(summary_budget);

        let mut parts = Vec::new();
        if let Ok(scrollback) = self.mux.capture_pane(target, CaptureRange::FullHistory).await {
            let tail = tail_chars(&scrollback, summary_budget);
            if !tail.is_empty() {
                parts.push(format!("Recent terminal output:\n{tail}"));
            }
        }
        for packer in &self.packers {
            if let Some(content) = packer.pack().await {
                parts.push(format!("{}:\n{}", packer.name(), content));
            }
        }

        let mut summary = parts.join("\n\n");
        if summary.len() > total_budget {
            summary = tail_chars(&summary, total_budget).to_string();
        }
        summary
    }

    async fn restart_with_summary(
        &self,
        target: &str,
        kind: &AgentKind,
        summary: &str,
    ) -> Result<(), String> {
        let command = self
            .agents
            .command_for(kind)
            .ok_or_else(|| format!("no launch command for agent kind {kind}"))?
            .to_string();

        send_interrupt(&self.mux, target)
            .await
            .map_err(|e| e.to_string())?;
        tokio::time::sleep(Duration::from_millis(500)).await;
        self.mux
            .send_line(target, &command)
            .await
            .map_err(|e| e.to_string())?;
        tokio::time::sleep(Duration::from_secs(2)).await;

        let prompt = continuation_prompt(summary);
        self.mux
            .send_line(target, &prompt)
            .await
            .map_err(|e| e.to_string())
    }
}

enum Decision {
    None,
    Warn { session: String },
    Rotate { session: String, kind: AgentKind },
}

/// The continuation prompt sent to a freshly restarted agent, with the
/// summary interpolated at `{{.Context}}`.
pub(crate) fn continuation_prompt(summary: &str) -> String {
    const TEMPLATE: &str = "You are resuming work after a restart. \
Summary of the prior session:\n{{.Context}}\nPick up where the summary leaves off.";
    TEMPLATE.replace("{{.Context}}", summary)
}

fn tail_chars(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
