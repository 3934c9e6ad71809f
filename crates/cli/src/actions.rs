// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Multiplexer-backed rotation actions.
//!
//! The account-rotation engine drives restarts and credential switches
//! through this adapter. Credential switching itself is out of band: the
//! configured helper command performs it and this adapter waits for it.

use async_trait::async_trait;
use ntm_adapters::MuxAdapter;
use ntm_config::AgentsConfig;
use ntm_core::account::Account;
use ntm_core::AgentKind;
use ntm_engine::RotationActions;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

pub struct MuxRotationActions<M: MuxAdapter> {
    mux: M,
    agents: AgentsConfig,
    switch_helper: Option<String>,
    kinds: Mutex<HashMap<String, AgentKind>>,
}

impl<M: MuxAdapter> MuxRotationActions<M> {
    pub fn new(mux: M, agents: AgentsConfig, switch_helper: Option<String>) -> Self {
        Self {
            mux,
            agents,
            switch_helper,
            kinds: Mutex::new(HashMap::new()),
        }
    }

    /// Remember which agent kind runs in a pane so restarts use the right
    /// launch command.
    pub fn track_pane(&self, target: &str, kind: AgentKind) {
        self.kinds.lock().insert(target.to_string(), kind);
    }

    fn launch_command(&self, target: &str) -> Result<String, String> {
        let kinds = self.kinds.lock();
        let kind = kinds
            .get(target)
            .ok_or_else(|| format!("unknown agent kind for pane {target}"))?;
        self.agents
            .command_for(kind)
            .map(str::to_string)
            .ok_or_else(|| format!("no launch command for agent kind {kind}"))
    }
}

#[async_trait]
impl<M: MuxAdapter> RotationActions for MuxRotationActions<M> {
    async fn restart_agent(&self, target: &str) -> Result<(), String> {
        let command = self.launch_command(target)?;
        self.mux
            .send_keys(target, "C-c")
            .await
            .map_err(|e| e.to_string())?;
        tokio::time::sleep(Duration::from_millis(150)).await;
        self.mux
            .send_keys(target, "C-c")
            .await
            .map_err(|e| e.to_string())?;
        tokio::time::sleep(Duration::from_millis(500)).await;
        self.mux
            .send_line(target, &command)
            .await
            .map_err(|e| e.to_string())
    }

    async fn switch_account(&self, target: &str, account: &Account) -> Result<(), String> {
        let helper = self
            .switch_helper
            .as_deref()
            .ok_or_else(|| "no account switch helper configured".to_string())?;

        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(helper)
            .env("NTM_SWITCH_PROVIDER", account.provider.as_str())
            .env("NTM_SWITCH_EMAIL", &account.email)
            .output()
            .await
            .map_err(|e| format!("switch helper spawn failed: {e}"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("switch helper failed: {}", stderr.trim()));
        }

        // Fresh credentials only apply to a fresh process.
        self.restart_agent(target).await
    }

    async fn inject_continuation(&self, target: &str) -> Result<(), String> {
        // Give the REPL a moment to come up before the prompt lands.
        tokio::time::sleep(Duration::from_secs(2)).await;
        self.mux
            .send_line(
                target,
                "You were restarted after a rate limit. Continue the task you were working on.",
            )
            .await
            .map_err(|e| e.to_string())
    }
}
