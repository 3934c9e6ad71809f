// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Account rotation on rate-limit and quota hits.
//!
//! Watches pane output for rate-limit markers. On a hit it selects the next
//! eligible account for the pane's provider and either restarts the agent
//! on the current account (after a grace period) or drives a credential
//! switch through the configured actions, then injects the continuation
//! prompt and cools the previous account.

use crate::bus::Emitter;
use async_trait::async_trait;
use ntm_adapters::mux::{MuxAdapter, MuxError};
use ntm_config::RotationConfig;
use ntm_core::account::{Account, AccountRoster, Provider};
use ntm_core::{BusEvent, EventType, StreamEvent};
use parking_lot::Mutex;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// The account identity behind one pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneAccount {
    pub provider: Provider,
    pub email: String,
}

/// Side effects the engine drives during a rotation. The composition root
/// supplies a multiplexer-backed implementation; tests record calls.
#[async_trait]
pub trait RotationActions: Send + Sync + 'static {
    /// Restart the agent in place, keeping the current account.
    async fn restart_agent(&self, target: &str) -> Result<(), String>;

    /// Switch the pane's credentials to `account` and restart as needed.
    async fn switch_account(&self, target: &str, account: &Account) -> Result<(), String>;

    /// Send the continuation prompt after a restart or switch.
    async fn inject_continuation(&self, target: &str) -> Result<(), String>;
}

struct RotationState {
    panes: HashMap<String, PaneAccount>,
    sessions: HashMap<String, String>,
    cooldowns: HashMap<String, Instant>,
    in_flight: HashSet<String>,
}

/// Rate-limit detector and rotation driver.
pub struct AccountRotationEngine<A: RotationActions> {
    config: RotationConfig,
    roster: AccountRoster,
    actions: Arc<A>,
    emitter: Arc<Emitter>,
    patterns: Vec<Regex>,
    state: Mutex<RotationState>,
}

impl<A: RotationActions> AccountRotationEngine<A> {
    pub fn new(
        config: RotationConfig,
        roster: AccountRoster,
        actions: Arc<A>,
        emitter: Arc<Emitter>,
    ) -> Arc<Self> {
        let patterns = config
            .patterns
            .iter()
            .filter_map(|p| match Regex::new(&format!("(?i){p}")) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    tracing::warn!(pattern = %p, error = %e, "invalid rate-limit pattern, skipping");
                    None
                }
            })
            .collect();
        Arc::new(Self {
            config,
            roster,
            actions,
            emitter,
            patterns,
            state: Mutex::new(RotationState {
                panes: HashMap::new(),
                sessions: HashMap::new(),
                cooldowns: HashMap::new(),
                in_flight: HashSet::new(),
            }),
        })
    }

    /// Associate a pane with its session and backing account.
    pub fn register_pane(&self, target: &str, session: &str, account: PaneAccount) {
        let mut state = self.state.lock();
        state.panes.insert(target.to_string(), account);
        state.sessions.insert(target.to_string(), session.to_string());
    }

    pub fn unregister_pane(&self, target: &str) {
        let mut state = self.state.lock();
        state.panes.remove(target);
        state.sessions.remove(target);
        state.in_flight.remove(target);
    }

    /// Current account for a pane.
    pub fn pane_account(&self, target: &str) -> Option<PaneAccount> {
        self.state.lock().panes.get(target).cloned()
    }

    /// Whether any line of the event matches a rate-limit marker.
    pub fn detects_rate_limit(&self, event: &StreamEvent) -> bool {
        event
            .lines
            .iter()
            .any(|line| self.patterns.iter().any(|p| p.is_match(line)))
    }

    /// Feed one stream event through the detector; a match kicks off the
    /// rotation flow for the pane (coalesced while one is in flight).
    pub fn observe(self: &Arc<Self>, event: &StreamEvent) {
        if !self.config.enabled || !self.detects_rate_limit(event) {
            return;
        }

        let target = event.target.clone();
        {
            let mut state = self.state.lock();
            if !state.panes.contains_key(&target) || !state.in_flight.insert(target.clone()) {
                return;
            }
        }

        let engine = Arc::clone(self);
        tokio::spawn(async move {
            engine.rotate(&target).await;
            engine.state.lock().in_flight.remove(&target);
        });
    }

    /// First roster account of the provider that is neither the current
    /// login nor cooling down.
    fn next_eligible(&self, provider: Provider, current: &str) -> Option<Account> {
        let state = self.state.lock();
        let now = Instant::now();
        self.roster
            .for_provider(provider)
            .filter(|a| a.email != current)
            .find(|a| match state.cooldowns.get(&a.email) {
                Some(&until) => now >= until,
                None => true,
            })
            .cloned()
    }

    async fn rotate(&self, target: &str) {
        let (account, session) = {
            let state = self.state.lock();
            let Some(account) = state.panes.get(target).cloned() else {
                return;
            };
            let session = state.sessions.get(target).cloned().unwrap_or_default();
            (account, session)
        };

        tracing::warn!(target, provider = %account.provider, "rate limit detected");
        self.emitter.emit(
            BusEvent::new(EventType::AgentRateLimit, session.clone())
                .with_pane(target)
                .with_detail("provider", account.provider.to_string()),
        );

        let next = self.next_eligible(account.provider, &account.email);
        let Some(next) = next else {
            tracing::warn!(target, provider = %account.provider, "no eligible account to rotate to");
            self.emitter.emit(
                BusEvent::new(EventType::RotationNeeded, session)
                    .with_pane(target)
                    .with_message(format!(
                        "no eligible {} account available",
                        account.provider
                    )),
            );
            return;
        };

        let outcome = if self.config.prefer_restart {
            // Ride out the limit on the current account, then restart.
            let grace = Duration::from_secs(self.config.reset_buffer_minutes * 60);
            tokio::time::sleep(grace).await;
            self.actions.restart_agent(target).await
        } else {
            let switched = self.actions.switch_account(target, &next).await;
            if switched.is_ok() {
                self.state.lock().panes.insert(
                    target.to_string(),
                    PaneAccount {
                        provider: account.provider,
                        email: next.email.clone(),
                    },
                );
            }
            switched
        };

        if let Err(e) = outcome {
            tracing::error!(target, error = %e, "account rotation failed");
            self.emitter.emit(
                BusEvent::new(EventType::AgentError, session)
                    .with_pane(target)
                    .with_message(format!("account rotation failed: {e}")),
            );
            return;
        }

        if let Err(e) = self.actions.inject_continuation(target).await {
            tracing::warn!(target, error = %e, "continuation injection failed");
        }

        // Cool the account that hit the limit.
        let cooldown = Duration::from_secs(self.config.account_cooldown_secs);
        self.state
            .lock()
            .cooldowns
            .insert(account.email.clone(), Instant::now() + cooldown);

        self.emitter.emit(
            BusEvent::new(EventType::AgentRestarted, session)
                .with_pane(target)
                .with_detail("reason", "account_rotation"),
        );
    }
}

/// Interrupt whatever runs in the pane. The double Ctrl-C unwinds REPLs
/// that swallow the first one while streaming.
pub(crate) async fn send_interrupt<M: MuxAdapter>(mux: &M, target: &str) -> Result<(), MuxError> {
    mux.send_keys(target, "C-c").await?;
    tokio::time::sleep(Duration::from_millis(150)).await;
    mux.send_keys(target, "C-c").await
}

#[cfg(test)]
#[path = "account_tests.rs"]
mod tests;
