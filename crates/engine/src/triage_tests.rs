// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ntm_core::clock::FakeClock;

fn config() -> ProcessTriageConfig {
    ProcessTriageConfig {
        enabled: true,
        binary: String::new(),
        check_interval_secs: 5,
        idle_threshold_secs: 30,
        stuck_threshold_secs: 60,
        on_stuck: "alert".to_string(),
        history_limit: 4,
        alert_buffer: 8,
    }
}

fn monitor() -> (Arc<HealthMonitor<FakeClock>>, mpsc::Receiver<Alert>, FakeClock) {
    let clock = FakeClock::new();
    let (monitor, alerts) = HealthMonitor::new(config(), clock.clone());
    (monitor, alerts, clock)
}

#[yare::parameterized(
    useful    = { "useful", Classification::Useful },
    abandoned = { "abandoned", Classification::Stuck },
    zombie    = { "zombie", Classification::Zombie },
    idle      = { "idle", Classification::Idle },
    waiting   = { "WAITING", Classification::Waiting },
)]
fn verdict_labels_map_to_classifications(label: &str, expected: Classification) {
    let (monitor, _alerts, _clock) = monitor();
    let verdict = Verdict::parse(label).unwrap();
    monitor.observe("p", Some(verdict), None);
    assert_eq!(monitor.state("p").unwrap().classification, expected);
}

#[test]
fn unknown_label_is_rejected_and_absent_verdict_is_unknown() {
    assert_eq!(Verdict::parse("meditating"), None);

    let (monitor, _alerts, _clock) = monitor();
    monitor.observe("p", None, None);
    assert_eq!(monitor.state("p").unwrap().classification, Classification::Unknown);
}

#[test]
fn transition_resets_consecutive_count_to_one() {
    let (monitor, _alerts, _clock) = monitor();

    monitor.observe("p", Some(Verdict::Useful), Some(42));
    assert_eq!(monitor.state("p").unwrap().consecutive_count, 1);

    monitor.observe("p", Some(Verdict::Useful), Some(42));
    monitor.observe("p", Some(Verdict::Useful), Some(42));
    let state = monitor.state("p").unwrap();
    assert_eq!(state.consecutive_count, 3);
    assert!(state.confidence > 0.5);

    // Any transition drops the count straight back to 1.
    monitor.observe("p", Some(Verdict::Idle), Some(42));
    let state = monitor.state("p").unwrap();
    assert_eq!(state.consecutive_count, 1);
    assert_eq!(state.classification, Classification::Idle);
}

#[test]
fn confidence_rises_with_agreement() {
    let (monitor, _alerts, _clock) = monitor();
    monitor.observe("p", Some(Verdict::Useful), None);
    let first = monitor.state("p").unwrap().confidence;
    monitor.observe("p", Some(Verdict::Useful), None);
    let second = monitor.state("p").unwrap().confidence;
    assert!(second > first);
}

#[test]
fn since_tracks_the_latest_transition() {
    let (monitor, _alerts, clock) = monitor();
    monitor.observe("p", Some(Verdict::Useful), None);
    let initial = monitor.state("p").unwrap().since;

    clock.advance(Duration::from_secs(10));
    monitor.observe("p", Some(Verdict::Useful), None);
    // Same classification: since unchanged.
    assert_eq!(monitor.state("p").unwrap().since, initial);

    clock.advance(Duration::from_secs(10));
    monitor.observe("p", Some(Verdict::Abandoned), None);
    assert!(monitor.state("p").unwrap().since > initial);
}

#[test]
fn history_is_bounded() {
    let (monitor, _alerts, _clock) = monitor();
    for _ in 0..10 {
        monitor.observe("p", Some(Verdict::Useful), None);
    }
    assert_eq!(monitor.state("p").unwrap().history.len(), 4);
}

#[test]
fn zombie_alert_fires_immediately_on_entry() {
    let (monitor, mut alerts, _clock) = monitor();
    monitor.observe("p", Some(Verdict::Zombie), None);
    assert_eq!(
        alerts.try_recv().unwrap(),
        Alert::Zombie {
            pane_key: "p".to_string()
        }
    );

    // Staying zombie does not refire.
    monitor.observe("p", Some(Verdict::Zombie), None);
    assert!(alerts.try_recv().is_err());
}

#[test]
fn stuck_alert_fires_after_dwell_threshold() {
    let (monitor, mut alerts, clock) = monitor();
    monitor.observe("p", Some(Verdict::Abandoned), None);

    // Below the threshold: nothing.
    clock.advance(Duration::from_secs(59));
    assert!(monitor.check().is_empty());
    assert!(alerts.try_recv().is_err());

    clock.advance(Duration::from_secs(1));
    monitor.check();
    match alerts.try_recv().unwrap() {
        Alert::Stuck { pane_key, dwell } => {
            assert_eq!(pane_key, "p");
            assert!(dwell >= Duration::from_secs(60));
        }
        other => panic!("expected stuck alert, got {other:?}"),
    }

    // Repeated checks in the same dwell do not re-alert.
    monitor.check();
    assert!(alerts.try_recv().is_err());
}

#[test]
fn idle_alert_fires_after_dwell_threshold() {
    let (monitor, mut alerts, clock) = monitor();
    monitor.observe("p", Some(Verdict::Idle), None);
    clock.advance(Duration::from_secs(30));
    monitor.check();
    assert!(matches!(alerts.try_recv().unwrap(), Alert::Idle { .. }));
}

#[test]
fn on_stuck_kill_requests_pane_termination() {
    let clock = FakeClock::new();
    let (monitor, mut alerts) = HealthMonitor::new(
        ProcessTriageConfig {
            on_stuck: "kill".to_string(),
            ..config()
        },
        clock.clone(),
    );
    monitor.observe("p", Some(Verdict::Abandoned), None);
    clock.advance(Duration::from_secs(61));

    let actions = monitor.check();
    assert_eq!(
        actions,
        vec![TriageAction::KillPane {
            pane_key: "p".to_string()
        }]
    );
    assert!(matches!(alerts.try_recv().unwrap(), Alert::Stuck { .. }));
}

#[test]
fn on_stuck_ignore_suppresses_the_alert() {
    let clock = FakeClock::new();
    let (monitor, mut alerts) = HealthMonitor::new(
        ProcessTriageConfig {
            on_stuck: "ignore".to_string(),
            ..config()
        },
        clock.clone(),
    );
    monitor.observe("p", Some(Verdict::Abandoned), None);
    clock.advance(Duration::from_secs(61));

    assert!(monitor.check().is_empty());
    assert!(alerts.try_recv().is_err());
}

#[test]
fn alert_channel_overflow_drops_new_alerts() {
    let clock = FakeClock::new();
    let (monitor, mut alerts) = HealthMonitor::new(
        ProcessTriageConfig {
            alert_buffer: 2,
            ..config()
        },
        clock,
    );
    for i in 0..5 {
        monitor.observe(&format!("p{i}"), Some(Verdict::Zombie), None);
    }
    // Only the buffer's worth arrived; the rest were dropped, not blocked.
    assert!(alerts.try_recv().is_ok());
    assert!(alerts.try_recv().is_ok());
    assert!(alerts.try_recv().is_err());
}

#[test]
fn forget_clears_state() {
    let (monitor, _alerts, _clock) = monitor();
    monitor.observe("p", Some(Verdict::Useful), None);
    monitor.forget("p");
    assert!(monitor.state("p").is_none());
    assert!(monitor.states().is_empty());
}
