// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ntm_config::HeadroomConfig;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

fn config() -> HeadroomConfig {
    HeadroomConfig {
        enabled: true,
        check_interval_ms: 100,
        min_free_ram_mb: 1024,
        min_free_disk_mb: 2048,
        max_load_avg: 8.0,
        max_open_files: 1000,
    }
}

fn healthy() -> HostSample {
    HostSample {
        free_ram_mb: 8192,
        free_disk_mb: 50_000,
        load_avg: 1.0,
        open_files: 100,
    }
}

#[test]
fn violations_name_each_breached_limit() {
    let sample = HostSample {
        free_ram_mb: 512,
        free_disk_mb: 100,
        load_avg: 9.5,
        open_files: 2000,
    };
    let problems = violations(&config(), &sample);
    assert_eq!(problems.len(), 4);
    assert!(problems[0].contains("free ram"));
    assert!(problems[1].contains("free disk"));
    assert!(problems[2].contains("load average"));
    assert!(problems[3].contains("open files"));
}

#[test]
fn healthy_sample_has_no_violations() {
    assert!(violations(&config(), &healthy()).is_empty());
}

#[yare::parameterized(
    ram_at_limit   = { HostSample { free_ram_mb: 1024, ..healthy_sample() }, true },
    disk_at_limit  = { HostSample { free_disk_mb: 2048, ..healthy_sample() }, true },
    load_at_limit  = { HostSample { load_avg: 8.0, ..healthy_sample() }, true },
    files_at_limit = { HostSample { open_files: 1000, ..healthy_sample() }, true },
    ram_below      = { HostSample { free_ram_mb: 1023, ..healthy_sample() }, false },
)]
fn limits_are_inclusive(sample: HostSample, ok: bool) {
    assert_eq!(violations(&config(), &sample).is_empty(), ok);
}

fn healthy_sample() -> HostSample {
    healthy()
}

#[tokio::test(start_paused = true)]
async fn guard_pauses_and_resumes_with_samples() {
    let toggle = Arc::new(AtomicU64::new(0));
    let source = Arc::clone(&toggle);
    let cancel = CancellationToken::new();

    let guard = HeadroomGuard::spawn_with(
        config(),
        move || {
            Some(if source.load(AtomicOrdering::Relaxed) == 0 {
                HostSample {
                    free_ram_mb: 8192,
                    free_disk_mb: 50_000,
                    load_avg: 1.0,
                    open_files: 100,
                }
            } else {
                HostSample {
                    free_ram_mb: 1, // violates the ram floor
                    free_disk_mb: 50_000,
                    load_avg: 1.0,
                    open_files: 100,
                }
            })
        },
        cancel.clone(),
    );

    // Healthy sample: admission proceeds.
    tokio::time::sleep(Duration::from_millis(250)).await;
    guard.admitted().await;
    assert!(!guard.is_paused());

    // Flip to a violating sample and let the sampler observe it.
    toggle.store(1, AtomicOrdering::Relaxed);
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(guard.is_paused());

    // A waiting admission resolves once the next sample is clean again.
    let waiter = tokio::spawn({
        let guard = guard.clone();
        async move {
            guard.admitted().await;
        }
    });
    toggle.store(0, AtomicOrdering::Relaxed);
    tokio::time::sleep(Duration::from_millis(250)).await;
    tokio::time::timeout(Duration::from_secs(1), waiter)
        .await
        .expect("admission should resume")
        .unwrap();

    cancel.cancel();
}

#[tokio::test]
async fn disabled_guard_never_pauses() {
    let guard = HeadroomGuard::disabled();
    guard.admitted().await;

    let off = HeadroomGuard::spawn_with(
        HeadroomConfig {
            enabled: false,
            ..config()
        },
        || None,
        CancellationToken::new(),
    );
    off.admitted().await;
}
