// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pane ↔ PID mapping from the process table.
//!
//! A refresh loop samples `/proc` and the multiplexer's pane list to build
//! three views: pane key → shell PID, PID → pane key, and shell PID →
//! transitive descendant PIDs. Hosts without `/proc` degrade to an empty
//! map; triage then works from external verdicts only.

use crate::mux::MuxAdapter;
use ntm_core::PaneInfo;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Parent links for every visible process.
#[derive(Debug, Clone, Default)]
pub struct ProcessTable {
    ppid_of: HashMap<u32, u32>,
}

impl ProcessTable {
    /// Sample `/proc`. Unreadable entries are skipped; a host without
    /// `/proc` yields an empty table.
    pub fn sample() -> Self {
        Self::sample_from(Path::new("/proc"))
    }

    pub fn sample_from(proc_root: &Path) -> Self {
        let mut ppid_of = HashMap::new();
        let Ok(entries) = std::fs::read_dir(proc_root) else {
            return Self::default();
        };
        for entry in entries.filter_map(|e| e.ok()) {
            let name = entry.file_name();
            let Some(pid) = name.to_str().and_then(|n| n.parse::<u32>().ok()) else {
                continue;
            };
            let Ok(stat) = std::fs::read_to_string(entry.path().join("stat")) else {
                continue;
            };
            if let Some(ppid) = parse_stat_line(&stat) {
                ppid_of.insert(pid, ppid);
            }
        }
        Self { ppid_of }
    }

    #[cfg(test)]
    pub(crate) fn from_pairs(pairs: &[(u32, u32)]) -> Self {
        Self {
            ppid_of: pairs.iter().copied().collect(),
        }
    }

    /// Direct children of `pid`.
    pub fn children_of(&self, pid: u32) -> Vec<u32> {
        let mut children: Vec<u32> = self
            .ppid_of
            .iter()
            .filter(|(_, &ppid)| ppid == pid)
            .map(|(&child, _)| child)
            .collect();
        children.sort_unstable();
        children
    }

    /// `pid` plus all transitive descendants.
    pub fn descendants_of(&self, pid: u32) -> Vec<u32> {
        let mut result = vec![pid];
        let mut frontier = vec![pid];
        while let Some(current) = frontier.pop() {
            for child in self.children_of(current) {
                if !result.contains(&child) {
                    result.push(child);
                    frontier.push(child);
                }
            }
        }
        result
    }

    pub fn is_empty(&self) -> bool {
        self.ppid_of.is_empty()
    }
}

/// Extract the PPID from a `/proc/<pid>/stat` line.
///
/// The comm field may contain spaces and parentheses, so the parser finds
/// the last `)` and splits the remainder on whitespace; PPID is the second
/// field after the comm (index 1, after the state).
pub fn parse_stat_line(stat: &str) -> Option<u32> {
    let after_comm = &stat[stat.rfind(')')? + 1..];
    let mut fields = after_comm.split_whitespace();
    let _state = fields.next()?;
    fields.next()?.parse().ok()
}

#[derive(Debug, Default)]
struct Maps {
    shell_by_pane: HashMap<String, u32>,
    pane_by_pid: HashMap<u32, String>,
    pids_by_pane: HashMap<String, Vec<u32>>,
}

/// Lock-guarded pane/PID views; queries return copies.
#[derive(Clone, Default)]
pub struct PidMap {
    maps: Arc<RwLock<Maps>>,
}

impl PidMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the maps from a pane listing and a process-table sample.
    ///
    /// `pane_key` is the pane title when set, else `session:index`.
    pub fn refresh(&self, session: &str, panes: &[PaneInfo], table: &ProcessTable) {
        let mut maps = Maps::default();
        for pane in panes {
            let key = pane.pane_key(session);
            let pids = table.descendants_of(pane.shell_pid);
            maps.shell_by_pane.insert(key.clone(), pane.shell_pid);
            for &pid in &pids {
                maps.pane_by_pid.insert(pid, key.clone());
            }
            maps.pids_by_pane.insert(key, pids);
        }
        *self.maps.write() = maps;
    }

    /// Pane key owning this PID (the shell or any descendant).
    pub fn pane_for_pid(&self, pid: u32) -> Option<String> {
        self.maps.read().pane_by_pid.get(&pid).cloned()
    }

    /// Shell PID of a pane.
    pub fn shell_pid(&self, pane_key: &str) -> Option<u32> {
        self.maps.read().shell_by_pane.get(pane_key).copied()
    }

    /// Shell plus transitive descendant PIDs for a pane.
    pub fn all_pids_for_pane(&self, pane_key: &str) -> Vec<u32> {
        self.maps
            .read()
            .pids_by_pane
            .get(pane_key)
            .cloned()
            .unwrap_or_default()
    }

    pub fn pane_keys(&self) -> Vec<String> {
        self.maps.read().shell_by_pane.keys().cloned().collect()
    }
}

/// Periodic refresh loop over one session. Cadence is independent of any
/// subscriber; cancellation stops the loop at the next tick.
pub fn spawn_refresh_loop<M: MuxAdapter>(
    map: PidMap,
    mux: M,
    session: String,
    interval: std::time::Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(interval) => {}
            }
            match mux.list_panes(&session).await {
                Ok(panes) => {
                    let table = ProcessTable::sample();
                    map.refresh(&session, &panes, &table);
                }
                Err(e) => {
                    tracing::debug!(session, error = %e, "pidmap refresh: list-panes failed");
                }
            }
        }
    })
}

#[cfg(test)]
#[path = "pidmap_tests.rs"]
mod tests;
