// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ntm_adapters::mux::FakeMux;
use parking_lot::Mutex as PlMutex;
use std::collections::VecDeque;

#[yare::parameterized(
    relative_path = { "editing src/stream/mod.rs now", &["src/stream/mod.rs"] },
    dotted        = { "wrote ./crates/core/src/lib.rs", &["./crates/core/src/lib.rs"] },
    bare_file     = { "updated main.rs and Cargo.toml", &["main.rs", "Cargo.toml"] },
    line_suffix   = { "error at src/pane.rs:42", &["src/pane.rs"] },
    dedup         = { "a/b.rs then a/b.rs again", &["a/b.rs"] },
    none          = { "no files mentioned here", &[] },
)]
fn path_detection(text: &str, expected: &[&str]) {
    assert_eq!(detect_file_paths(text), expected);
}

#[derive(Default)]
struct FakeApi {
    reserves: PlMutex<Vec<Vec<String>>>,
    renews: PlMutex<Vec<Vec<String>>>,
    releases: PlMutex<Vec<Vec<String>>>,
    force_releases: PlMutex<Vec<(String, String)>>,
    /// Conflicts to report on the next reserve calls, one entry per call.
    scripted_conflicts: PlMutex<VecDeque<Vec<ReservationConflict>>>,
}

impl FakeApi {
    fn script_conflict(&self, conflicts: Vec<ReservationConflict>) {
        self.scripted_conflicts.lock().push_back(conflicts);
    }
}

#[async_trait]
impl ReservationApi for Arc<FakeApi> {
    async fn reserve(
        &self,
        paths: &[String],
        _exclusive: bool,
        _ttl_minutes: u64,
        _reason: &str,
    ) -> Result<ReservationOutcome, MailError> {
        self.reserves.lock().push(paths.to_vec());
        let conflicts = self
            .scripted_conflicts
            .lock()
            .pop_front()
            .unwrap_or_default();
        let conflicted: std::collections::HashSet<&str> =
            conflicts.iter().map(|c| c.path.as_str()).collect();
        let granted = paths
            .iter()
            .filter(|p| !conflicted.contains(p.as_str()))
            .cloned()
            .collect();
        Ok(ReservationOutcome { granted, conflicts })
    }

    async fn renew(&self, paths: &[String], _ttl_minutes: u64) -> Result<(), MailError> {
        self.renews.lock().push(paths.to_vec());
        Ok(())
    }

    async fn release(&self, paths: &[String]) -> Result<(), MailError> {
        self.releases.lock().push(paths.to_vec());
        Ok(())
    }

    async fn force_release(
        &self,
        path: &str,
        justification: &str,
        _notify_holder: bool,
    ) -> Result<(), MailError> {
        self.force_releases
            .lock()
            .push((path.to_string(), justification.to_string()));
        Ok(())
    }
}

fn config() -> FileReservationConfig {
    FileReservationConfig {
        enabled: true,
        poll_interval_sec: 15,
        capture_lines: 120,
        default_ttl_min: 30,
        extend_on_activity: true,
        auto_release_idle_minutes: 10,
    }
}

fn watcher(
    config: FileReservationConfig,
    on_conflict: ConflictCallback,
) -> (
    Arc<FileReservationWatcher<FakeMux, Arc<FakeApi>>>,
    FakeMux,
    Arc<FakeApi>,
) {
    let mux = FakeMux::new();
    let api = Arc::new(FakeApi::default());
    let watcher = FileReservationWatcher::new(config, mux.clone(), Arc::clone(&api), "t:0", on_conflict);
    (watcher, mux, api)
}

fn skip_conflicts() -> ConflictCallback {
    Arc::new(|_| ConflictDecision::Skip)
}

#[tokio::test]
async fn new_paths_are_reserved_once() {
    let (watcher, mux, api) = watcher(config(), skip_conflicts());
    mux.push_capture("t:0", "editing src/a.rs and src/b.rs");
    mux.push_capture("t:0", "still editing src/a.rs and src/b.rs");

    watcher.tick().await;
    assert_eq!(api.reserves.lock().as_slice(), &[vec![
        "src/a.rs".to_string(),
        "src/b.rs".to_string()
    ]]);
    assert_eq!(watcher.reserved_paths(), ["src/a.rs", "src/b.rs"]);

    // Second tick with the same content: no new reserve, a renew instead.
    watcher.tick().await;
    assert_eq!(api.reserves.lock().len(), 1);
    assert_eq!(api.renews.lock().len(), 1);
}

#[tokio::test]
async fn renew_disabled_when_extend_on_activity_off() {
    let (watcher, mux, api) = watcher(
        FileReservationConfig {
            extend_on_activity: false,
            ..config()
        },
        skip_conflicts(),
    );
    mux.push_capture("t:0", "src/a.rs");
    watcher.tick().await;
    watcher.tick().await;
    assert!(api.renews.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn idle_paths_are_released() {
    let (watcher, mux, api) = watcher(config(), skip_conflicts());
    mux.push_capture("t:0", "touching src/a.rs");
    mux.push_capture("t:0", "now doing something else entirely");

    watcher.tick().await;
    assert_eq!(watcher.reserved_paths(), ["src/a.rs"]);

    // The path stops appearing; after the idle window it gets released.
    tokio::time::sleep(Duration::from_secs(11 * 60)).await;
    watcher.tick().await;

    assert_eq!(api.releases.lock().as_slice(), &[vec!["src/a.rs".to_string()]]);
    assert!(watcher.reserved_paths().is_empty());
}

#[tokio::test(start_paused = true)]
async fn zero_idle_minutes_never_releases() {
    let (watcher, mux, api) = watcher(
        FileReservationConfig {
            auto_release_idle_minutes: 0,
            ..config()
        },
        skip_conflicts(),
    );
    mux.push_capture("t:0", "touching src/a.rs");
    mux.push_capture("t:0", "quiet now");

    watcher.tick().await;
    tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
    watcher.tick().await;
    assert!(api.releases.lock().is_empty());
    assert_eq!(watcher.reserved_paths(), ["src/a.rs"]);
}

#[tokio::test]
async fn conflict_skip_leaves_other_holder_alone() {
    let (watcher, mux, api) = watcher(config(), skip_conflicts());
    api.script_conflict(vec![ReservationConflict {
        path: "src/a.rs".to_string(),
        holders: vec!["RedFox".to_string()],
    }]);
    mux.push_capture("t:0", "src/a.rs");

    watcher.tick().await;
    assert!(api.force_releases.lock().is_empty());
    assert!(watcher.reserved_paths().is_empty());
}

#[tokio::test]
async fn conflict_force_release_reclaims_the_path() {
    let callback: ConflictCallback = Arc::new(|conflict| {
        assert_eq!(conflict.holders, ["RedFox"]);
        ConflictDecision::ForceRelease {
            justification: "holder idle for hours".to_string(),
            notify_holder: true,
        }
    });
    let (watcher, mux, api) = watcher(config(), callback);
    api.script_conflict(vec![ReservationConflict {
        path: "src/a.rs".to_string(),
        holders: vec!["RedFox".to_string()],
    }]);
    mux.push_capture("t:0", "src/a.rs");

    watcher.tick().await;

    let forced = api.force_releases.lock();
    assert_eq!(forced.len(), 1);
    assert_eq!(forced[0].0, "src/a.rs");
    assert_eq!(forced[0].1, "holder idle for hours");
    drop(forced);

    // Reserve was retried after the force release and granted.
    assert_eq!(api.reserves.lock().len(), 2);
    assert_eq!(watcher.reserved_paths(), ["src/a.rs"]);
}
