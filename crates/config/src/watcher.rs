// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live config reload.
//!
//! Watches the global and discovered project config files and republishes
//! the snapshot after a 500 ms debounce. Readers hold [`ConfigHandle`] and
//! see either the old or the new snapshot, never a mix; a failed reload
//! leaves the previous snapshot current.

use crate::loader::Loader;
use crate::types::Config;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

/// Debounce window between the first change event and the reload.
pub const RELOAD_DEBOUNCE: Duration = Duration::from_millis(500);

/// Shared pointer to the current immutable snapshot.
#[derive(Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<Arc<Config>>>,
}

impl ConfigHandle {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    /// The current snapshot. Cheap; callers re-read per event they process.
    pub fn current(&self) -> Arc<Config> {
        self.inner.read().clone()
    }

    /// Atomically swap in a new snapshot.
    pub fn publish(&self, config: Config) {
        *self.inner.write() = Arc::new(config);
    }
}

/// Background watcher driving [`ConfigHandle`] reloads.
pub struct ConfigWatcher {
    // Dropping the notify watcher stops event delivery; dropping the sender
    // unblocks the debounce thread.
    _watcher: RecommendedWatcher,
    stop_tx: mpsc::Sender<WatchSignal>,
    thread: Option<std::thread::JoinHandle<()>>,
}

enum WatchSignal {
    Changed,
    Stop,
}

impl ConfigWatcher {
    /// Start watching the loader's config paths.
    ///
    /// `on_publish` runs after each successful snapshot swap, with the new
    /// snapshot; wire it to a bus event so subscribers observe the change
    /// after publication.
    pub fn spawn(
        loader: Loader,
        handle: ConfigHandle,
        on_publish: impl Fn(Arc<Config>) + Send + 'static,
    ) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();

        let event_tx = tx.clone();
        let mut watcher =
            notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                if res.is_ok() {
                    let _ = event_tx.send(WatchSignal::Changed);
                }
            })?;

        // Watch the parent directories so edits that replace the file
        // (editors, atomic renames) are still observed.
        for path in loader.watch_paths() {
            if let Some(dir) = path.parent().filter(|d| d.is_dir()) {
                watcher.watch(dir, RecursiveMode::NonRecursive)?;
            }
        }

        let thread = std::thread::spawn(move || debounce_loop(rx, loader, handle, on_publish));

        Ok(Self {
            _watcher: watcher,
            stop_tx: tx,
            thread: Some(thread),
        })
    }

    /// Stop the watcher and join its thread. Idempotent.
    pub fn stop(mut self) {
        let _ = self.stop_tx.send(WatchSignal::Stop);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for ConfigWatcher {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(WatchSignal::Stop);
    }
}

fn debounce_loop(
    rx: mpsc::Receiver<WatchSignal>,
    loader: Loader,
    handle: ConfigHandle,
    on_publish: impl Fn(Arc<Config>),
) {
    loop {
        match rx.recv() {
            Ok(WatchSignal::Changed) => {}
            Ok(WatchSignal::Stop) | Err(_) => return,
        }

        // Absorb the burst: editors fire several events per save.
        loop {
            match rx.recv_timeout(RELOAD_DEBOUNCE) {
                Ok(WatchSignal::Changed) => continue,
                Ok(WatchSignal::Stop) => return,
                Err(mpsc::RecvTimeoutError::Timeout) => break,
                Err(mpsc::RecvTimeoutError::Disconnected) => return,
            }
        }

        match loader.load() {
            Ok(loaded) => {
                for err in &loaded.validation_errors {
                    tracing::warn!(%err, "config reload: validation");
                }
                handle.publish(loaded.config);
                let snapshot = handle.current();
                tracing::info!("config reloaded");
                on_publish(snapshot);
            }
            Err(e) => {
                // Previous snapshot stays current.
                tracing::error!(error = %e, "config reload failed; keeping previous snapshot");
            }
        }
    }
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
