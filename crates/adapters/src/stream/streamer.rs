// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One pane's streaming task: FIFO fast path with polling fallback.

use super::{snapshot_hash, StreamConfig};
use crate::mux::{shell_quote, CaptureRange, MuxAdapter};
use nix::errno::Errno;
use ntm_core::StreamEvent;
use std::fs::File;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Running streamer for one target.
pub(crate) struct StreamerHandle {
    target: String,
    cancel: CancellationToken,
    task: JoinHandle<()>,
    fallback: Arc<AtomicBool>,
    fifo_path: PathBuf,
}

impl StreamerHandle {
    pub(crate) fn is_fallback(&self) -> bool {
        self.fallback.load(Ordering::Relaxed)
    }

    /// Cancel the task, detach the pipe, remove the FIFO and wait for the
    /// reader. Safe to call on an already-stopped streamer.
    pub(crate) async fn stop<M: MuxAdapter>(self, mux: &M) {
        self.cancel.cancel();
        if let Err(e) = mux.pipe_pane_cancel(&self.target).await {
            tracing::debug!(target = %self.target, error = %e, "pipe-pane detach failed");
        }
        let _ = self.task.await;
        let _ = std::fs::remove_file(&self.fifo_path);
    }
}

/// Spawn the streaming task for `target`.
pub(crate) fn spawn<M: MuxAdapter>(
    mux: M,
    target: String,
    config: StreamConfig,
    event_tx: mpsc::Sender<StreamEvent>,
) -> StreamerHandle {
    let cancel = CancellationToken::new();
    let fallback = Arc::new(AtomicBool::new(false));
    let fifo_path = fifo_path_for(&config.fifo_dir, &target);

    let task = tokio::spawn(run(
        mux,
        target.clone(),
        config,
        event_tx,
        cancel.clone(),
        Arc::clone(&fallback),
        fifo_path.clone(),
    ));

    StreamerHandle {
        target,
        cancel,
        task,
        fallback,
        fifo_path,
    }
}

/// FIFO path derived from the sanitized target plus the process id, so
/// concurrent orchestrators never collide.
fn fifo_path_for(dir: &std::path::Path, target: &str) -> PathBuf {
    let sanitized: String = target
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    dir.join(format!("ntm-{}-{}.fifo", sanitized, std::process::id()))
}

#[allow(clippy::too_many_arguments)]
async fn run<M: MuxAdapter>(
    mux: M,
    target: String,
    config: StreamConfig,
    event_tx: mpsc::Sender<StreamEvent>,
    cancel: CancellationToken,
    fallback: Arc<AtomicBool>,
    fifo_path: PathBuf,
) {
    let mut seq: u64 = 0;

    match fifo_setup(&mux, &target, &fifo_path).await {
        Ok(fifo) => {
            tracing::debug!(target, fifo = %fifo_path.display(), "pipe fast path attached");
            let outcome =
                fifo_loop(&target, fifo, &config, &event_tx, &cancel, &mut seq).await;
            if matches!(outcome, FifoOutcome::Cancelled) {
                return;
            }
            tracing::warn!(target, "fifo read failed, switching to polling fallback");
        }
        Err(e) => {
            tracing::warn!(target, error = %e, "pipe fast path unavailable, using polling fallback");
        }
    }

    fallback.store(true, Ordering::Relaxed);
    let _ = std::fs::remove_file(&fifo_path);
    poll_loop(&mux, &target, &config, &event_tx, &cancel, &mut seq).await;
}

/// Create the FIFO, attach pipe-pane, and open the read side.
///
/// The FIFO is opened read-write: a read-only open would block until the
/// multiplexer attaches its writer. The path is shell-quoted because
/// pipe-pane hands the command to a shell.
async fn fifo_setup<M: MuxAdapter>(
    mux: &M,
    target: &str,
    fifo_path: &std::path::Path,
) -> Result<File, String> {
    let _ = std::fs::remove_file(fifo_path);
    nix::unistd::mkfifo(fifo_path, nix::sys::stat::Mode::from_bits_truncate(0o600))
        .map_err(|e| format!("mkfifo: {e}"))?;

    let command = format!("cat >> {}", shell_quote(&fifo_path.to_string_lossy()));
    mux.pipe_pane(target, &command)
        .await
        .map_err(|e| format!("pipe-pane: {e}"))?;

    let file = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(fifo_path)
        .map_err(|e| format!("open fifo: {e}"))?;
    set_nonblocking(&file).map_err(|e| format!("set nonblocking: {e}"))?;
    Ok(file)
}

/// Set the given file descriptor to non-blocking mode.
fn set_nonblocking(fd: &impl std::os::fd::AsFd) -> Result<(), Errno> {
    use nix::fcntl::{fcntl, FcntlArg, OFlag};
    let flags = fcntl(fd, FcntlArg::F_GETFL)?;
    let flags = OFlag::from_bits_truncate(flags);
    fcntl(fd, FcntlArg::F_SETFL(flags | OFlag::O_NONBLOCK))?;
    Ok(())
}

enum FifoOutcome {
    Cancelled,
    ReadError,
}

/// Incremental read loop: drain whatever is available each deadline tick,
/// emit on line-count or flush-interval pressure.
async fn fifo_loop(
    target: &str,
    fifo: File,
    config: &StreamConfig,
    event_tx: &mpsc::Sender<StreamEvent>,
    cancel: &CancellationToken,
    seq: &mut u64,
) -> FifoOutcome {
    let mut pending: Vec<String> = Vec::new();
    let mut partial = String::new();
    let mut buf = [0u8; 4096];
    let mut last_flush = Instant::now();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return FifoOutcome::Cancelled,
            _ = tokio::time::sleep(config.read_deadline) => {}
        }

        loop {
            match nix::unistd::read(&fifo, &mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    partial.push_str(&String::from_utf8_lossy(&buf[..n]));
                    while let Some(newline) = partial.find('\n') {
                        let line: String = partial.drain(..=newline).collect();
                        pending.push(line.trim_end_matches(['\n', '\r']).to_string());
                    }
                }
                Err(Errno::EAGAIN) => break,
                Err(e) => {
                    tracing::warn!(target, error = %e, "fifo read error");
                    return FifoOutcome::ReadError;
                }
            }
            if pending.len() >= config.max_lines_per_event {
                break;
            }
        }

        let flush_due = !pending.is_empty() && last_flush.elapsed() >= config.flush_interval;
        if pending.len() >= config.max_lines_per_event || flush_due {
            let lines = std::mem::take(&mut pending);
            *seq += 1;
            let event = StreamEvent::new(target, lines, *seq, false);
            if event_tx.send(event).await.is_err() {
                return FifoOutcome::Cancelled;
            }
            last_flush = Instant::now();
        }
    }
}

/// Capture-poll fallback with content-hash dedup.
async fn poll_loop<M: MuxAdapter>(
    mux: &M,
    target: &str,
    config: &StreamConfig,
    event_tx: &mpsc::Sender<StreamEvent>,
    cancel: &CancellationToken,
    seq: &mut u64,
) {
    let mut last_hash = String::new();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(config.fallback_poll_interval) => {}
        }

        let snapshot = match mux
            .capture_pane(target, CaptureRange::LastLines(config.fallback_poll_lines))
            .await
        {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::debug!(target, error = %e, "fallback capture failed");
                continue;
            }
        };

        let hash = snapshot_hash(&snapshot);
        if hash == last_hash {
            continue;
        }
        last_hash = hash;

        let lines: Vec<String> = snapshot.lines().map(str::to_string).collect();
        *seq += 1;
        let event = StreamEvent::new(target, lines, *seq, true);
        if event_tx.send(event).await.is_err() {
            return;
        }
    }
}
