// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Automatic file reservations from observed pane activity.
//!
//! The watcher scans recent pane output for file paths, reserves new ones,
//! renews reservations while activity continues, and releases them after a
//! configured idle window. Conflicts go to a caller-supplied callback which
//! may force-release a stale hold with a justification.

use async_trait::async_trait;
use ntm_adapters::mail::{MailClient, MailError};
use ntm_adapters::mux::{CaptureRange, MuxAdapter};
use ntm_config::FileReservationConfig;
use ntm_core::reservation::{ReservationConflict, ReservationOutcome};
use parking_lot::Mutex;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
/// Paths with directory components, or bare filenames with a code-ish
/// extension. Line/column suffixes (`:42`) fall outside the match.
static PATH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        (?: \.{0,2}/ )? (?: [\w@.-]+ / )+ [\w@.-]+ \. [A-Za-z0-9]{1,8}
        | \b [\w-]+ \. (?:rs|go|py|ts|tsx|js|jsx|java|c|h|cpp|hpp|toml|yaml|yml|json|md|sh|sql) \b
        ",
    )
    .expect("constant regex pattern is valid")
});

/// Extract candidate file paths from captured output, de-duplicated in
/// order of first appearance.
pub fn detect_file_paths(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    PATH_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

/// What the conflict callback decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictDecision {
    /// Leave the other holder's reservation alone.
    Skip,
    /// Break the reservation and take the path.
    ForceRelease {
        justification: String,
        notify_holder: bool,
    },
}

/// The narrow reservation surface the watcher needs. The mail client
/// provides the production implementation; consumers depending on this
/// trait stay decoupled from the full client.
#[async_trait]
pub trait ReservationApi: Send + Sync + 'static {
    async fn reserve(
        &self,
        paths: &[String],
        exclusive: bool,
        ttl_minutes: u64,
        reason: &str,
    ) -> Result<ReservationOutcome, MailError>;

    async fn renew(&self, paths: &[String], ttl_minutes: u64) -> Result<(), MailError>;

    async fn release(&self, paths: &[String]) -> Result<(), MailError>;

    async fn force_release(
        &self,
        path: &str,
        justification: &str,
        notify_holder: bool,
    ) -> Result<(), MailError>;
}

/// Mail-client-backed [`ReservationApi`] scoped to one project and agent.
#[derive(Clone)]
pub struct ProjectReservations {
    client: MailClient,
    project_key: String,
    agent_name: String,
}

impl ProjectReservations {
    pub fn new(client: MailClient, project_key: impl Into<String>, agent_name: impl Into<String>) -> Self {
        Self {
            client,
            project_key: project_key.into(),
            agent_name: agent_name.into(),
        }
    }
}

#[async_trait]
impl ReservationApi for ProjectReservations {
    async fn reserve(
        &self,
        paths: &[String],
        exclusive: bool,
        ttl_minutes: u64,
        reason: &str,
    ) -> Result<ReservationOutcome, MailError> {
        self.client
            .file_reservation_paths(
                &self.project_key,
                &self.agent_name,
                paths,
                exclusive,
                ttl_minutes,
                reason,
            )
            .await
    }

    async fn renew(&self, paths: &[String], ttl_minutes: u64) -> Result<(), MailError> {
        self.client
            .renew_file_reservations(&self.project_key, &self.agent_name, paths, ttl_minutes)
            .await?;
        Ok(())
    }

    async fn release(&self, paths: &[String]) -> Result<(), MailError> {
        self.client
            .release_file_reservations(&self.project_key, &self.agent_name, paths)
            .await?;
        Ok(())
    }

    async fn force_release(
        &self,
        path: &str,
        justification: &str,
        notify_holder: bool,
    ) -> Result<(), MailError> {
        self.client
            .force_release_file_reservation(
                &self.project_key,
                &self.agent_name,
                path,
                justification,
                notify_holder,
            )
            .await?;
        Ok(())
    }
}

/// Caller-supplied conflict policy.
pub type ConflictCallback = Arc<dyn Fn(&ReservationConflict) -> ConflictDecision + Send + Sync>;

#[derive(Debug, Clone)]
struct Tracked {
    last_seen: Instant,
    reserved: bool,
}

/// Per-pane reservation upkeep.
pub struct FileReservationWatcher<M: MuxAdapter, R: ReservationApi> {
    config: FileReservationConfig,
    mux: M,
    api: R,
    target: String,
    on_conflict: ConflictCallback,
    tracked: Mutex<HashMap<String, Tracked>>,
}

impl<M: MuxAdapter, R: ReservationApi> FileReservationWatcher<M, R> {
    pub fn new(
        config: FileReservationConfig,
        mux: M,
        api: R,
        target: impl Into<String>,
        on_conflict: ConflictCallback,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            mux,
            api,
            target: target.into(),
            on_conflict,
            tracked: Mutex::new(HashMap::new()),
        })
    }

    /// Paths currently tracked as reserved.
    pub fn reserved_paths(&self) -> Vec<String> {
        let tracked = self.tracked.lock();
        let mut paths: Vec<String> = tracked
            .iter()
            .filter(|(_, t)| t.reserved)
            .map(|(p, _)| p.clone())
            .collect();
        paths.sort();
        paths
    }

    /// One poll cycle: scan, reserve, renew, release.
    pub async fn tick(&self) {
        let snapshot = match self
            .mux
            .capture_pane(&self.target, CaptureRange::LastLines(self.config.capture_lines))
            .await
        {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::debug!(target = %self.target, error = %e, "reservation scan capture failed");
                return;
            }
        };

        let now = Instant::now();
        let detected = detect_file_paths(&snapshot);

        let (new_paths, active_paths) = {
            let mut tracked = self.tracked.lock();
            let mut new_paths = Vec::new();
            let mut active_paths = Vec::new();
            for path in detected {
                match tracked.get_mut(&path) {
                    Some(entry) => {
                        entry.last_seen = now;
                        if entry.reserved {
                            active_paths.push(path);
                        }
                    }
                    None => new_paths.push(path),
                }
            }
            (new_paths, active_paths)
        };

        if !new_paths.is_empty() {
            self.reserve_new(&new_paths, now).await;
        }

        if self.config.extend_on_activity && !active_paths.is_empty() {
            if let Err(e) = self
                .api
                .renew(&active_paths, self.config.default_ttl_min)
                .await
            {
                tracing::warn!(target = %self.target, error = %e, "reservation renew failed");
            }
        }

        self.release_idle(now).await;
    }

    async fn reserve_new(&self, paths: &[String], now: Instant) {
        let outcome = match self
            .api
            .reserve(
                paths,
                true,
                self.config.default_ttl_min,
                "detected edit activity",
            )
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(target = %self.target, error = %e, "reservation request failed");
                return;
            }
        };

        {
            let mut tracked = self.tracked.lock();
            for path in &outcome.granted {
                tracked.insert(
                    path.clone(),
                    Tracked {
                        last_seen: now,
                        reserved: true,
                    },
                );
            }
        }

        for conflict in &outcome.conflicts {
            match (self.on_conflict)(conflict) {
                ConflictDecision::Skip => {
                    tracing::info!(
                        target = %self.target,
                        path = %conflict.path,
                        holders = ?conflict.holders,
                        "reservation conflict skipped"
                    );
                    self.tracked.lock().insert(
                        conflict.path.clone(),
                        Tracked {
                            last_seen: now,
                            reserved: false,
                        },
                    );
                }
                ConflictDecision::ForceRelease {
                    justification,
                    notify_holder,
                } => {
                    if let Err(e) = self
                        .api
                        .force_release(&conflict.path, &justification, notify_holder)
                        .await
                    {
                        tracing::warn!(path = %conflict.path, error = %e, "force release failed");
                        continue;
                    }
                    let retry = vec![conflict.path.clone()];
                    if let Ok(outcome) = self
                        .api
                        .reserve(
                            &retry,
                            true,
                            self.config.default_ttl_min,
                            "reclaimed stale reservation",
                        )
                        .await
                    {
                        let granted = outcome.granted.contains(&conflict.path);
                        self.tracked.lock().insert(
                            conflict.path.clone(),
                            Tracked {
                                last_seen: now,
                                reserved: granted,
                            },
                        );
                    }
                }
            }
        }
    }

    async fn release_idle(&self, now: Instant) {
        if self.config.auto_release_idle_minutes == 0 {
            return;
        }
        let idle_after = Duration::from_secs(self.config.auto_release_idle_minutes * 60);

        let stale: Vec<String> = {
            let tracked = self.tracked.lock();
            tracked
                .iter()
                .filter(|(_, t)| t.reserved && now.saturating_duration_since(t.last_seen) >= idle_after)
                .map(|(p, _)| p.clone())
                .collect()
        };
        if stale.is_empty() {
            return;
        }

        match self.api.release(&stale).await {
            Ok(()) => {
                tracing::info!(target = %self.target, paths = ?stale, "released idle reservations");
                let mut tracked = self.tracked.lock();
                for path in &stale {
                    tracked.remove(path);
                }
            }
            Err(e) => {
                tracing::warn!(target = %self.target, error = %e, "idle release failed");
            }
        }
    }

    /// Poll until cancelled, then release everything still held.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        if !self.config.enabled {
            return;
        }
        let interval = Duration::from_secs(self.config.poll_interval_sec.max(1));
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
            self.tick().await;
        }

        let held = self.reserved_paths();
        if !held.is_empty() {
            if let Err(e) = self.api.release(&held).await {
                tracing::warn!(error = %e, "final reservation release failed");
            }
        }
    }
}

#[cfg(test)]
#[path = "reservation_tests.rs"]
mod tests;
