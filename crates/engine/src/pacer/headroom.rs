// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host-headroom guard (gate G3).
//!
//! A background sampler reads host telemetry every `check_interval_ms`;
//! while any threshold is violated, admission waits until a later sample
//! clears. Disabled configs make the gate a no-op.

use ntm_config::HeadroomConfig;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Budget for one telemetry sample.
const SAMPLE_TIMEOUT: Duration = Duration::from_secs(5);

/// One host telemetry reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostSample {
    pub free_ram_mb: u64,
    pub free_disk_mb: u64,
    pub load_avg: f64,
    pub open_files: u64,
}

/// Threshold checks; returns one message per violated limit.
pub(crate) fn violations(config: &HeadroomConfig, sample: &HostSample) -> Vec<String> {
    let mut out = Vec::new();
    if sample.free_ram_mb < config.min_free_ram_mb {
        out.push(format!(
            "free ram {}MiB below minimum {}MiB",
            sample.free_ram_mb, config.min_free_ram_mb
        ));
    }
    if sample.free_disk_mb < config.min_free_disk_mb {
        out.push(format!(
            "free disk {}MiB below minimum {}MiB",
            sample.free_disk_mb, config.min_free_disk_mb
        ));
    }
    if sample.load_avg > config.max_load_avg {
        out.push(format!(
            "load average {:.2} above maximum {:.2}",
            sample.load_avg, config.max_load_avg
        ));
    }
    if sample.open_files > config.max_open_files {
        out.push(format!(
            "open files {} above maximum {}",
            sample.open_files, config.max_open_files
        ));
    }
    out
}

/// Sample the host: `/proc/meminfo`, statvfs on the projects directory,
/// `/proc/loadavg`, `/proc/sys/fs/file-nr`. Returns `None` when the host
/// exposes none of these (the guard then stays open).
pub(crate) fn sample_host(projects_dir: &Path) -> Option<HostSample> {
    let free_ram_mb = read_meminfo_available_mb()?;
    let free_disk_mb = free_disk_mb(projects_dir).unwrap_or(u64::MAX);
    let load_avg = read_load_avg().unwrap_or(0.0);
    let open_files = read_open_files().unwrap_or(0);
    Some(HostSample {
        free_ram_mb,
        free_disk_mb,
        load_avg,
        open_files,
    })
}

fn read_meminfo_available_mb() -> Option<u64> {
    let contents = std::fs::read_to_string("/proc/meminfo").ok()?;
    for line in contents.lines() {
        if let Some(rest) = line.strip_prefix("MemAvailable:") {
            let kb: u64 = rest.trim().trim_end_matches(" kB").trim().parse().ok()?;
            return Some(kb / 1024);
        }
    }
    None
}

fn free_disk_mb(dir: &Path) -> Option<u64> {
    let stat = nix::sys::statvfs::statvfs(dir).ok()?;
    let bytes = stat.blocks_available() as u64 * stat.fragment_size() as u64;
    Some(bytes / (1024 * 1024))
}

fn read_load_avg() -> Option<f64> {
    let contents = std::fs::read_to_string("/proc/loadavg").ok()?;
    contents.split_whitespace().next()?.parse().ok()
}

fn read_open_files() -> Option<u64> {
    let contents = std::fs::read_to_string("/proc/sys/fs/file-nr").ok()?;
    contents.split_whitespace().next()?.parse().ok()
}

/// Pauses admission while the host is out of headroom.
#[derive(Clone, Debug)]
pub(crate) struct HeadroomGuard {
    enabled: bool,
    paused: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl HeadroomGuard {
    /// A guard that never pauses (disabled headroom checks).
    pub(crate) fn disabled() -> Self {
        Self {
            enabled: false,
            paused: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Start the sampler against the real host.
    pub(crate) fn spawn(
        config: HeadroomConfig,
        projects_dir: PathBuf,
        cancel: CancellationToken,
    ) -> Self {
        let sampler = move || sample_host(&projects_dir);
        Self::spawn_with(config, sampler, cancel)
    }

    /// Start the sampler with an injected telemetry source.
    pub(crate) fn spawn_with<F>(
        config: HeadroomConfig,
        sampler: F,
        cancel: CancellationToken,
    ) -> Self
    where
        F: Fn() -> Option<HostSample> + Send + Sync + 'static,
    {
        if !config.enabled {
            return Self::disabled();
        }

        let guard = Self {
            enabled: true,
            paused: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        };

        let paused = Arc::clone(&guard.paused);
        let notify = Arc::clone(&guard.notify);
        let interval = Duration::from_millis(config.check_interval_ms.max(100));
        let sampler = Arc::new(sampler);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(interval) => {}
                }

                let sampler = Arc::clone(&sampler);
                let sampled = tokio::time::timeout(
                    SAMPLE_TIMEOUT,
                    tokio::task::spawn_blocking(move || sampler()),
                )
                .await;

                let sample = match sampled {
                    Ok(Ok(Some(sample))) => sample,
                    Ok(Ok(None)) | Ok(Err(_)) => continue,
                    Err(_) => {
                        tracing::warn!("headroom sample timed out");
                        continue;
                    }
                };

                let problems = violations(&config, &sample);
                let was_paused = paused.load(Ordering::Relaxed);
                if problems.is_empty() {
                    if was_paused {
                        tracing::info!("host headroom recovered, resuming admission");
                        paused.store(false, Ordering::Relaxed);
                        notify.notify_waiters();
                    }
                } else if !was_paused {
                    tracing::warn!(violations = ?problems, "host headroom low, pausing admission");
                    paused.store(true, Ordering::Relaxed);
                }
            }
        });

        guard
    }

    /// Wait until admission is allowed.
    pub(crate) async fn admitted(&self) {
        if !self.enabled {
            return;
        }
        while self.paused.load(Ordering::Relaxed) {
            let notified = self.notify.notified();
            // Re-check after registering interest to avoid a lost wakeup.
            if !self.paused.load(Ordering::Relaxed) {
                return;
            }
            notified.await;
        }
    }

    #[cfg(test)]
    pub(crate) fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
#[path = "headroom_tests.rs"]
mod tests;
