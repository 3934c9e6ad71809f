// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide pub/sub and the non-blocking emitter in front of it.
//!
//! The bus may apply back-pressure: handlers run under a bounded semaphore
//! and a saturated semaphore blocks `publish`. The emitter absorbs that
//! pressure with a bounded buffer drained by a single worker, so emission
//! never blocks application code; overflow drops the event and bumps a
//! counter that is first-class telemetry.

use ntm_core::{BusEvent, EventType};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::{mpsc, Semaphore};

/// Default handler-semaphore size.
const DEFAULT_HANDLER_SLOTS: usize = 16;

/// Default emitter buffer.
pub const DEFAULT_EMITTER_BUFFER: usize = 1024;

type BoxedHandler =
    Arc<dyn Fn(BusEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

#[derive(Default)]
struct Subscriptions {
    by_type: HashMap<EventType, Vec<BoxedHandler>>,
    catch_all: Vec<BoxedHandler>,
}

/// Pub/sub bus with per-type and catch-all subscriptions.
pub struct EventBus {
    subscriptions: RwLock<Subscriptions>,
    handler_slots: Arc<Semaphore>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_HANDLER_SLOTS)
    }
}

impl EventBus {
    pub fn new(handler_slots: usize) -> Self {
        Self {
            subscriptions: RwLock::new(Subscriptions::default()),
            handler_slots: Arc::new(Semaphore::new(handler_slots.max(1))),
        }
    }

    /// Subscribe to one event type.
    pub fn subscribe<F, Fut>(&self, event_type: EventType, handler: F)
    where
        F: Fn(BusEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: BoxedHandler = Arc::new(move |event| Box::pin(handler(event)));
        self.subscriptions
            .write()
            .by_type
            .entry(event_type)
            .or_default()
            .push(handler);
    }

    /// Subscribe to every event type.
    pub fn subscribe_all<F, Fut>(&self, handler: F)
    where
        F: Fn(BusEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: BoxedHandler = Arc::new(move |event| Box::pin(handler(event)));
        self.subscriptions.write().catch_all.push(handler);
    }

    /// Publish an event to all matching handlers.
    ///
    /// Each handler runs in its own task under the handler semaphore; when
    /// every slot is busy this call blocks until one frees up. Handlers
    /// must not assume ordering across event types.
    pub async fn publish(&self, event: &BusEvent) {
        let handlers: Vec<BoxedHandler> = {
            let subs = self.subscriptions.read();
            subs.by_type
                .get(&event.event_type)
                .into_iter()
                .flatten()
                .chain(subs.catch_all.iter())
                .cloned()
                .collect()
        };

        for handler in handlers {
            let permit = match Arc::clone(&self.handler_slots).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return, // semaphore closed: bus shutting down
            };
            let event = event.clone();
            tokio::spawn(async move {
                handler(event).await;
                drop(permit);
            });
        }
    }
}

/// Non-blocking front for the bus.
///
/// A bounded channel is drained by a single worker that publishes in FIFO
/// order, so one emitter's successful emissions keep their order even when
/// the bus itself applies back-pressure.
pub struct Emitter {
    tx: mpsc::Sender<BusEvent>,
    dropped: Arc<AtomicU64>,
}

impl Emitter {
    pub fn new(bus: Arc<EventBus>, buffer: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<BusEvent>(buffer.max(1));
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                bus.publish(&event).await;
            }
        });
        Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Queue an event for publication. Never blocks: a full buffer drops
    /// the event and increments the drop counter.
    pub fn emit(&self, event: BusEvent) {
        if let Err(mpsc::error::TrySendError::Full(_)) = self.tx.try_send(event) {
            let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            if dropped == 1 || dropped % 1000 == 0 {
                tracing::debug!(dropped, "emitter buffer full, dropping events");
            }
        }
    }

    /// Total events dropped by this emitter.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

static DEFAULT_BUS: OnceLock<Arc<EventBus>> = OnceLock::new();
static DEFAULT_EMITTER: OnceLock<Arc<Emitter>> = OnceLock::new();

/// Process-default bus. Components should accept an injected bus; this is
/// only the default wiring.
pub fn default_bus() -> Arc<EventBus> {
    Arc::clone(DEFAULT_BUS.get_or_init(|| Arc::new(EventBus::default())))
}

/// Process-default emitter over [`default_bus`]. Must first be called from
/// within a tokio runtime.
pub fn default_emitter() -> Arc<Emitter> {
    Arc::clone(
        DEFAULT_EMITTER
            .get_or_init(|| Arc::new(Emitter::new(default_bus(), DEFAULT_EMITTER_BUFFER))),
    )
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
