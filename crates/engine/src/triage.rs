// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pane triage: classification state machine and dwell alerts.
//!
//! Each check produces a verdict (from the external triage binary when
//! configured, else internal heuristics; a missing verdict classifies
//! `unknown`). The monitor tracks per-pane state, fires alerts when a pane
//! dwells in `stuck` or `idle` past its threshold, and fires the zombie
//! alert immediately on entry.

use ntm_config::ProcessTriageConfig;
use ntm_core::clock::Clock;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::mpsc;

/// Pane classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Useful,
    Waiting,
    Idle,
    Stuck,
    Zombie,
    Unknown,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Classification::Useful => "useful",
            Classification::Waiting => "waiting",
            Classification::Idle => "idle",
            Classification::Stuck => "stuck",
            Classification::Zombie => "zombie",
            Classification::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A single check's verdict, before state-machine mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Useful,
    Waiting,
    Idle,
    /// External label for a pane whose agent walked away; maps to `stuck`.
    Abandoned,
    Zombie,
}

impl Verdict {
    /// Parse an external triage binary's label.
    pub fn parse(label: &str) -> Option<Verdict> {
        match label.trim().to_lowercase().as_str() {
            "useful" => Some(Verdict::Useful),
            "waiting" => Some(Verdict::Waiting),
            "idle" => Some(Verdict::Idle),
            "abandoned" => Some(Verdict::Abandoned),
            "zombie" => Some(Verdict::Zombie),
            _ => None,
        }
    }

    fn classification(&self) -> Classification {
        match self {
            Verdict::Useful => Classification::Useful,
            Verdict::Waiting => Classification::Waiting,
            Verdict::Idle => Classification::Idle,
            Verdict::Abandoned => Classification::Stuck,
            Verdict::Zombie => Classification::Zombie,
        }
    }
}

/// Tracked state for one pane.
#[derive(Debug, Clone)]
pub struct PaneState {
    pub pane_key: String,
    pub pid: Option<u32>,
    pub classification: Classification,
    pub confidence: f64,
    pub since: SystemTime,
    pub last_check: SystemTime,
    pub history: VecDeque<Classification>,
    pub consecutive_count: u32,
}

/// Dwell and zombie alerts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    Stuck { pane_key: String, dwell: Duration },
    Idle { pane_key: String, dwell: Duration },
    Zombie { pane_key: String },
}

/// Side effect requested by a periodic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriageAction {
    /// `on_stuck = "kill"`: ask the multiplexer client to end the pane.
    KillPane { pane_key: String },
}

/// Classification state machine over all panes.
pub struct HealthMonitor<C: Clock> {
    config: ProcessTriageConfig,
    clock: C,
    states: Mutex<HashMap<String, PaneState>>,
    alert_tx: mpsc::Sender<Alert>,
    /// Panes already alerted for their current stuck/idle dwell.
    alerted: Mutex<HashMap<String, Classification>>,
}

impl<C: Clock> HealthMonitor<C> {
    /// Create the monitor and the bounded alert stream. When the channel is
    /// full, new alerts are dropped.
    pub fn new(config: ProcessTriageConfig, clock: C) -> (Arc<Self>, mpsc::Receiver<Alert>) {
        let (alert_tx, alert_rx) = mpsc::channel(config.alert_buffer.max(1));
        (
            Arc::new(Self {
                config,
                clock,
                states: Mutex::new(HashMap::new()),
                alert_tx,
                alerted: Mutex::new(HashMap::new()),
            }),
            alert_rx,
        )
    }

    /// Record one check's verdict for a pane.
    ///
    /// A state change resets `consecutive_count` to 1 and `since` to now;
    /// the same verdict again increments the count and raises confidence.
    /// Entering `zombie` fires its alert immediately.
    pub fn observe(&self, pane_key: &str, verdict: Option<Verdict>, pid: Option<u32>) {
        let classification = verdict
            .map(|v| v.classification())
            .unwrap_or(Classification::Unknown);
        let now = self.clock.now();

        let became_zombie = {
            let mut states = self.states.lock();
            let state = states.entry(pane_key.to_string()).or_insert_with(|| PaneState {
                pane_key: pane_key.to_string(),
                pid,
                classification,
                confidence: 0.5,
                since: now,
                last_check: now,
                history: VecDeque::new(),
                consecutive_count: 0,
            });

            state.pid = pid.or(state.pid);
            state.last_check = now;

            let changed = state.classification != classification || state.consecutive_count == 0;
            if changed {
                state.classification = classification;
                state.consecutive_count = 1;
                state.confidence = 0.5;
                state.since = now;
                self.alerted.lock().remove(pane_key);
            } else {
                state.consecutive_count += 1;
                let n = f64::from(state.consecutive_count);
                state.confidence = n / (n + 1.0);
            }

            state.history.push_back(classification);
            while state.history.len() > self.config.history_limit {
                state.history.pop_front();
            }

            changed && classification == Classification::Zombie
        };

        if became_zombie {
            self.push_alert(Alert::Zombie {
                pane_key: pane_key.to_string(),
            });
        }
    }

    /// Periodic dwell check. Fires stuck/idle alerts once per dwell and
    /// returns the configured side effects for the caller to apply.
    pub fn check(&self) -> Vec<TriageAction> {
        let now = self.clock.now();
        let mut actions = Vec::new();
        let snapshot: Vec<PaneState> = self.states.lock().values().cloned().collect();

        for state in snapshot {
            let dwell = now
                .duration_since(state.since)
                .unwrap_or(Duration::ZERO);

            match state.classification {
                Classification::Stuck if dwell >= self.config.stuck_threshold() => {
                    if !self.mark_alerted(&state.pane_key, Classification::Stuck) {
                        continue;
                    }
                    match self.config.on_stuck.as_str() {
                        "ignore" => {}
                        "kill" => {
                            actions.push(TriageAction::KillPane {
                                pane_key: state.pane_key.clone(),
                            });
                            self.push_alert(Alert::Stuck {
                                pane_key: state.pane_key.clone(),
                                dwell,
                            });
                        }
                        _ => {
                            self.push_alert(Alert::Stuck {
                                pane_key: state.pane_key.clone(),
                                dwell,
                            });
                        }
                    }
                }
                Classification::Idle if dwell >= self.config.idle_threshold() => {
                    if self.mark_alerted(&state.pane_key, Classification::Idle) {
                        self.push_alert(Alert::Idle {
                            pane_key: state.pane_key.clone(),
                            dwell,
                        });
                    }
                }
                _ => {}
            }
        }
        actions
    }

    /// True the first time a pane hits this dwell alert; false afterwards
    /// until the classification changes.
    fn mark_alerted(&self, pane_key: &str, classification: Classification) -> bool {
        let mut alerted = self.alerted.lock();
        match alerted.get(pane_key) {
            Some(&existing) if existing == classification => false,
            _ => {
                alerted.insert(pane_key.to_string(), classification);
                true
            }
        }
    }

    fn push_alert(&self, alert: Alert) {
        if let Err(mpsc::error::TrySendError::Full(alert)) = self.alert_tx.try_send(alert) {
            tracing::warn!(?alert, "alert channel full, dropping alert");
        }
    }

    /// Copy of one pane's state.
    pub fn state(&self, pane_key: &str) -> Option<PaneState> {
        self.states.lock().get(pane_key).cloned()
    }

    /// Copies of every pane state.
    pub fn states(&self) -> Vec<PaneState> {
        self.states.lock().values().cloned().collect()
    }

    /// Forget a pane (e.g. after its session is killed).
    pub fn forget(&self, pane_key: &str) {
        self.states.lock().remove(pane_key);
        self.alerted.lock().remove(pane_key);
    }
}

#[cfg(test)]
#[path = "triage_tests.rs"]
mod tests;
