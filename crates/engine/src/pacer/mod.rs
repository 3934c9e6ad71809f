// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawn pacer: admission control for agent launches.
//!
//! Four gates in series: global concurrency and rate (G1), per-agent-kind
//! limits with ramp-up spacing (G2), host headroom (G3), and failure
//! backoff with a circuit breaker (G4). Each agent kind drains its own
//! FIFO queue so a burst of one kind cannot starve another; ties at the
//! global gate resolve in arrival order.

mod backoff;
mod bucket;
mod headroom;

pub use headroom::HostSample;

use backoff::{BackoffGate, BackoffState};
use bucket::TokenBucket;
use headroom::HeadroomGuard;
use ntm_config::SpawnPacingConfig;
use ntm_core::AgentKind;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// How long one global-gate acquisition attempt may take before the request
/// counts as a tick-miss and re-queues.
const GLOBAL_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(1);

/// Errors surfaced by admission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacerError {
    #[error("spawn queue is full, try again later")]
    Busy,
    #[error("admission paused by circuit breaker")]
    Paused,
    #[error("pacer is shut down")]
    Closed,
    #[error("spawn failed after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

/// Pacer throughput and pressure counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacerStats {
    pub pending: usize,
    pub tick_misses: u64,
    pub consecutive_failures: u32,
}

/// Queue key: the three rate-managed kinds plus one lane for everything
/// else (user shells, plugins), which only pass the global gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Lane {
    Claude,
    Codex,
    Gemini,
    Other,
}

impl Lane {
    fn for_kind(kind: &AgentKind) -> Self {
        match kind {
            AgentKind::Claude => Lane::Claude,
            AgentKind::Codex => Lane::Codex,
            AgentKind::Gemini => Lane::Gemini,
            AgentKind::User | AgentKind::Plugin(_) => Lane::Other,
        }
    }
}

struct KindGate {
    semaphore: Arc<Semaphore>,
    bucket: TokenBucket,
    ramp_up_delay: Duration,
}

struct Queued {
    arrival: u64,
    resp: oneshot::Sender<Result<SpawnPermit, PacerError>>,
}

#[derive(Debug)]
struct Shared {
    config: SpawnPacingConfig,
    global_semaphore: Arc<Semaphore>,
    global_bucket: TokenBucket,
    headroom: HeadroomGuard,
    backoff: Mutex<BackoffState>,
    pending: AtomicUsize,
    arrivals: AtomicU64,
    tick_misses: AtomicU64,
}

/// Admission controller for agent spawns.
pub struct SpawnPacer {
    shared: Arc<Shared>,
    lanes: HashMap<Lane, mpsc::UnboundedSender<Queued>>,
    cancel: CancellationToken,
}

impl SpawnPacer {
    /// Build the pacer and start its per-kind pumps and headroom sampler.
    pub fn new(config: SpawnPacingConfig, projects_dir: PathBuf) -> Self {
        let cancel = CancellationToken::new();
        let headroom = if config.enabled && config.headroom.enabled {
            HeadroomGuard::spawn(config.headroom.clone(), projects_dir, cancel.clone())
        } else {
            HeadroomGuard::disabled()
        };
        Self::with_headroom(config, headroom, cancel)
    }

    fn with_headroom(
        config: SpawnPacingConfig,
        headroom: HeadroomGuard,
        cancel: CancellationToken,
    ) -> Self {
        let caps = &config.agent_caps;
        let gates: Vec<(Lane, KindGate)> = vec![
            (
                Lane::Claude,
                kind_gate(
                    caps.claude_max_concurrent,
                    caps.claude_rate_per_sec,
                    caps.claude_ramp_up_delay_ms,
                ),
            ),
            (
                Lane::Codex,
                kind_gate(
                    caps.codex_max_concurrent,
                    caps.codex_rate_per_sec,
                    caps.codex_ramp_up_delay_ms,
                ),
            ),
            (
                Lane::Gemini,
                kind_gate(
                    caps.gemini_max_concurrent,
                    caps.gemini_rate_per_sec,
                    caps.gemini_ramp_up_delay_ms,
                ),
            ),
            (Lane::Other, kind_gate(0, 0.0, 0)),
        ];

        let shared = Arc::new(Shared {
            global_semaphore: Arc::new(Semaphore::new(config.max_concurrent_spawns.max(1) as usize)),
            global_bucket: TokenBucket::new(config.max_spawns_per_second, config.burst_size),
            headroom,
            backoff: Mutex::new(BackoffState::new(config.backoff.clone())),
            pending: AtomicUsize::new(0),
            arrivals: AtomicU64::new(0),
            tick_misses: AtomicU64::new(0),
            config,
        });

        let mut lanes = HashMap::new();
        for (lane, gate) in gates {
            let (tx, rx) = mpsc::unbounded_channel();
            lanes.insert(lane, tx);
            tokio::spawn(pump(Arc::clone(&shared), gate, rx, cancel.clone()));
        }

        Self {
            shared,
            lanes,
            cancel,
        }
    }

    /// Request admission for one spawn of `kind`.
    ///
    /// Resolves with a [`SpawnPermit`] once all four gates pass. Fails fast
    /// with [`PacerError::Busy`] beyond the backpressure threshold and with
    /// [`PacerError::Paused`] while the circuit breaker is open.
    pub async fn admit(&self, kind: &AgentKind) -> Result<SpawnPermit, PacerError> {
        if !self.shared.config.enabled {
            return Ok(SpawnPermit::ungated(Arc::clone(&self.shared)));
        }

        if self.shared.pending.load(Ordering::Relaxed) >= self.shared.config.backpressure_threshold
        {
            return Err(PacerError::Busy);
        }
        self.shared.pending.fetch_add(1, Ordering::Relaxed);

        let arrival = self.shared.arrivals.fetch_add(1, Ordering::Relaxed);
        let (resp, rx) = oneshot::channel();
        let lane = Lane::for_kind(kind);
        let queued = Queued { arrival, resp };

        let sent = self
            .lanes
            .get(&lane)
            .map(|tx| tx.send(queued).is_ok())
            .unwrap_or(false);
        if !sent {
            self.shared.pending.fetch_sub(1, Ordering::Relaxed);
            return Err(PacerError::Closed);
        }

        let result = rx.await.unwrap_or(Err(PacerError::Closed));
        self.shared.pending.fetch_sub(1, Ordering::Relaxed);
        result
    }

    /// Admit, run the spawn operation, and retry per config.
    ///
    /// Retries honor `retry_delay_ms` between attempts in addition to
    /// whatever G4 imposes; a request that exhausts its retries reports the
    /// last error.
    pub async fn run_spawn<T, E, F, Fut>(
        &self,
        kind: &AgentKind,
        mut operation: F,
    ) -> Result<T, PacerError>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let attempts = self.shared.config.default_retries + 1;
        let retry_delay = Duration::from_millis(self.shared.config.retry_delay_ms);
        let mut last_error = String::new();

        for attempt in 0..attempts {
            if attempt > 0 {
                tokio::time::sleep(retry_delay).await;
            }
            let permit = self.admit(kind).await?;
            match operation().await {
                Ok(value) => {
                    permit.report_success();
                    return Ok(value);
                }
                Err(e) => {
                    last_error = e.to_string();
                    tracing::warn!(
                        kind = %kind,
                        attempt = attempt + 1,
                        error = %last_error,
                        "spawn attempt failed"
                    );
                    permit.report_failure();
                }
            }
        }

        Err(PacerError::Exhausted {
            attempts,
            last_error,
        })
    }

    pub fn stats(&self) -> PacerStats {
        PacerStats {
            pending: self.shared.pending.load(Ordering::Relaxed),
            tick_misses: self.shared.tick_misses.load(Ordering::Relaxed),
            consecutive_failures: self.shared.backoff.lock().failures(),
        }
    }

    /// Stop the pumps and sampler. In-flight admissions resolve `Closed`.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for SpawnPacer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn kind_gate(max_concurrent: u32, rate_per_sec: f64, ramp_up_delay_ms: u64) -> KindGate {
    // Zero concurrency means "rate-limited only": a large cap stands in.
    let slots = if max_concurrent == 0 {
        Semaphore::MAX_PERMITS.min(1 << 16)
    } else {
        max_concurrent as usize
    };
    KindGate {
        semaphore: Arc::new(Semaphore::new(slots)),
        bucket: TokenBucket::new(rate_per_sec, 1),
        ramp_up_delay: Duration::from_millis(ramp_up_delay_ms),
    }
}

/// Per-kind pump: drains the lane FIFO through the four gates.
async fn pump(
    shared: Arc<Shared>,
    gate: KindGate,
    mut rx: mpsc::UnboundedReceiver<Queued>,
    cancel: CancellationToken,
) {
    let mut last_spawn: Option<tokio::time::Instant> = None;

    loop {
        let queued = tokio::select! {
            _ = cancel.cancelled() => return,
            queued = rx.recv() => match queued {
                Some(queued) => queued,
                None => return,
            },
        };

        let result = tokio::select! {
            _ = cancel.cancelled() => Err(PacerError::Closed),
            result = admit_one(&shared, &gate, &mut last_spawn) => result,
        };
        tracing::trace!(arrival = queued.arrival, ok = result.is_ok(), "admission resolved");
        let _ = queued.resp.send(result);
    }
}

async fn admit_one(
    shared: &Arc<Shared>,
    gate: &KindGate,
    last_spawn: &mut Option<tokio::time::Instant>,
) -> Result<SpawnPermit, PacerError> {
    // G4 first: a paused pacer fails fast, a backoff window is waited out.
    loop {
        let decision = shared.backoff.lock().gate(tokio::time::Instant::now());
        match decision {
            BackoffGate::FailFast(_) => return Err(PacerError::Paused),
            BackoffGate::WaitUntil(at) => tokio::time::sleep_until(at).await,
            BackoffGate::Clear => break,
        }
    }

    // G1: global concurrency, then global rate.
    let global_permit = loop {
        let acquire = Arc::clone(&shared.global_semaphore).acquire_owned();
        match tokio::time::timeout(GLOBAL_ACQUIRE_TIMEOUT, acquire).await {
            Ok(Ok(permit)) => break permit,
            Ok(Err(_)) => return Err(PacerError::Closed),
            Err(_) => {
                // Tick-miss: stay at the head of this kind's queue.
                shared.tick_misses.fetch_add(1, Ordering::Relaxed);
            }
        }
    };
    shared.global_bucket.acquire().await;

    // G2: per-kind concurrency, rate, and ramp-up spacing.
    let kind_permit = Arc::clone(&gate.semaphore)
        .acquire_owned()
        .await
        .map_err(|_| PacerError::Closed)?;
    gate.bucket.acquire().await;
    if !gate.ramp_up_delay.is_zero() {
        if let Some(last) = *last_spawn {
            let earliest = last + gate.ramp_up_delay;
            tokio::time::sleep_until(earliest).await;
        }
    }
    *last_spawn = Some(tokio::time::Instant::now());

    // G3: host headroom.
    shared.headroom.admitted().await;

    Ok(SpawnPermit {
        _global: Some(global_permit),
        _kind: Some(kind_permit),
        shared: Arc::clone(shared),
    })
}

/// Admission token for one spawn.
///
/// Holds the concurrency slots until dropped; the caller reports the spawn
/// outcome so G4 can track consecutive failures.
#[derive(Debug)]
pub struct SpawnPermit {
    _global: Option<OwnedSemaphorePermit>,
    _kind: Option<OwnedSemaphorePermit>,
    shared: Arc<Shared>,
}

impl SpawnPermit {
    fn ungated(shared: Arc<Shared>) -> Self {
        Self {
            _global: None,
            _kind: None,
            shared,
        }
    }

    /// The spawn succeeded: clear the failure counter.
    pub fn report_success(self) {
        self.shared.backoff.lock().on_success();
    }

    /// The spawn failed: advance backoff, possibly opening the breaker.
    pub fn report_failure(self) {
        self.shared
            .backoff
            .lock()
            .on_failure(tokio::time::Instant::now());
    }
}

#[cfg(test)]
#[path = "pacer_tests.rs"]
mod tests;
