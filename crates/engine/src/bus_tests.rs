// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ntm_core::{BusEvent, EventType};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

fn event(event_type: EventType) -> BusEvent {
    BusEvent::new(event_type, "proj")
}

#[tokio::test]
async fn typed_and_catch_all_subscribers_both_fire() {
    let bus = Arc::new(EventBus::default());
    let (typed_tx, mut typed_rx) = mpsc::channel(8);
    let (all_tx, mut all_rx) = mpsc::channel(8);

    bus.subscribe(EventType::AgentStarted, move |e| {
        let tx = typed_tx.clone();
        async move {
            let _ = tx.send(e).await;
        }
    });
    bus.subscribe_all(move |e| {
        let tx = all_tx.clone();
        async move {
            let _ = tx.send(e).await;
        }
    });

    bus.publish(&event(EventType::AgentStarted)).await;
    bus.publish(&event(EventType::AgentIdle)).await;

    let typed = timeout(Duration::from_secs(2), typed_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(typed.event_type, EventType::AgentStarted);
    // Typed subscriber must not see the idle event.
    assert!(typed_rx.try_recv().is_err());

    let first = timeout(Duration::from_secs(2), all_rx.recv())
        .await
        .unwrap()
        .unwrap();
    let second = timeout(Duration::from_secs(2), all_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.event_type, EventType::AgentStarted);
    assert_eq!(second.event_type, EventType::AgentIdle);
}

#[tokio::test]
async fn emitter_preserves_fifo_for_successful_emissions() {
    let bus = Arc::new(EventBus::default());
    let (tx, mut rx) = mpsc::channel(64);
    bus.subscribe_all(move |e| {
        let tx = tx.clone();
        async move {
            let _ = tx.send(e).await;
        }
    });

    let emitter = Emitter::new(Arc::clone(&bus), 64);
    for i in 0..10u32 {
        emitter.emit(event(EventType::AgentBusy).with_detail("i", i.to_string()));
    }

    for i in 0..10u32 {
        let got = timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got.details.get("i").map(String::as_str), Some(&*i.to_string()));
    }
    assert_eq!(emitter.dropped(), 0);
}

#[tokio::test]
async fn emitter_drops_on_overflow_without_blocking() {
    // One handler slot held forever: the bus blocks its worker, the buffer
    // fills, and further emissions drop instead of blocking the caller.
    let bus = Arc::new(EventBus::new(1));
    let (hold_tx, hold_rx) = tokio::sync::oneshot::channel::<()>();
    let hold_rx = Arc::new(tokio::sync::Mutex::new(Some(hold_rx)));
    bus.subscribe_all(move |_| {
        let hold_rx = Arc::clone(&hold_rx);
        async move {
            if let Some(rx) = hold_rx.lock().await.take() {
                let _ = rx.await;
            }
        }
    });

    let emitter = Emitter::new(Arc::clone(&bus), 2);

    let start = std::time::Instant::now();
    for _ in 0..50 {
        emitter.emit(event(EventType::AgentBusy));
    }
    // emit() must return promptly even though the bus is wedged.
    assert!(start.elapsed() < Duration::from_millis(500));

    // Drop counter grows monotonically once the buffer overflows.
    let dropped = emitter.dropped();
    assert!(dropped > 0, "expected drops, got {dropped}");
    emitter.emit(event(EventType::AgentBusy));
    assert!(emitter.dropped() >= dropped);

    let _ = hold_tx.send(());
}

#[tokio::test]
async fn publish_blocks_until_handler_slot_frees() {
    let bus = Arc::new(EventBus::new(1));
    let (done_tx, mut done_rx) = mpsc::channel::<&'static str>(8);

    let slow_done = done_tx.clone();
    bus.subscribe(EventType::AgentStarted, move |_| {
        let done = slow_done.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let _ = done.send("slow").await;
        }
    });
    bus.subscribe(EventType::AgentStopped, move |_| {
        let done = done_tx.clone();
        async move {
            let _ = done.send("fast").await;
        }
    });

    bus.publish(&event(EventType::AgentStarted)).await;
    // The single slot is occupied; this publish waits for it, then the
    // fast handler runs.
    bus.publish(&event(EventType::AgentStopped)).await;

    let first = timeout(Duration::from_secs(2), done_rx.recv())
        .await
        .unwrap()
        .unwrap();
    let second = timeout(Duration::from_secs(2), done_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first, "slow");
    assert_eq!(second, "fast");
}

#[tokio::test]
async fn default_singletons_are_stable() {
    let a = default_bus();
    let b = default_bus();
    assert!(Arc::ptr_eq(&a, &b));

    let e1 = default_emitter();
    let e2 = default_emitter();
    assert!(Arc::ptr_eq(&e1, &e2));
}
