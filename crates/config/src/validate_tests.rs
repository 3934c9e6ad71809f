// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn default_config_is_valid() {
    assert!(validate(&Config::default()).is_empty());
}

#[yare::parameterized(
    below_is_valid   = { 0.7, 0.85, true },
    equal_is_invalid = { 0.85, 0.85, false },
    above_is_invalid = { 0.9, 0.85, false },
    bounds_are_valid = { 0.0, 1.0, true },
    out_of_range     = { -0.1, 0.85, false },
)]
fn context_rotation_thresholds(warning: f64, rotate: f64, ok: bool) {
    let config = ContextRotationConfig {
        warning_threshold: warning,
        rotate_threshold: rotate,
        ..Default::default()
    };
    assert_eq!(validate_context_rotation_config(&config).is_ok(), ok);
}

#[yare::parameterized(
    lower_bound  = { 500, true },
    upper_bound  = { 10_000, true },
    below        = { 499, false },
    above        = { 10_001, false },
)]
fn summary_max_tokens_range(tokens: u32, ok: bool) {
    let config = ContextRotationConfig {
        summary_max_tokens: tokens,
        ..Default::default()
    };
    assert_eq!(validate_context_rotation_config(&config).is_ok(), ok);
}

#[yare::parameterized(
    equal_is_valid  = { 30, 30, true },
    above_is_valid  = { 30, 300, true },
    below_is_invalid = { 30, 29, false },
)]
fn health_stall_threshold(check: u64, stall: u64, ok: bool) {
    let config = HealthConfig {
        check_interval_secs: check,
        stall_threshold_secs: stall,
        ..Default::default()
    };
    assert_eq!(validate_health_config(&config).is_ok(), ok);
}

#[test]
fn health_backoff_ordering() {
    let config = HealthConfig {
        restart_backoff_base_secs: 10,
        restart_backoff_max_secs: 5,
        ..Default::default()
    };
    assert!(validate_health_config(&config).is_err());
}

#[yare::parameterized(
    zero       = { 0.0, true },
    one        = { 1.0, true },
    mid        = { 0.5, true },
    negative   = { -0.01, false },
    above_one  = { 1.01, false },
)]
fn cass_min_relevance_bounds(value: f64, ok: bool) {
    let mut config = CassConfig::default();
    config.context.min_relevance = value;
    assert_eq!(validate_cass_config(&config).is_ok(), ok);
}

#[yare::parameterized(
    zero    = { 0, true },
    hundred = { 100, true },
    above   = { 101, false },
)]
fn cass_skip_threshold_bounds(value: u32, ok: bool) {
    let mut config = CassConfig::default();
    config.context.skip_if_context_above = value;
    assert_eq!(validate_cass_config(&config).is_ok(), ok);
}

#[yare::parameterized(
    equal_is_valid   = { 120, 120, true },
    above_is_valid   = { 120, 600, true },
    below_is_invalid = { 120, 119, false },
)]
fn triage_stuck_vs_idle(idle: u64, stuck: u64, ok: bool) {
    let config = ProcessTriageConfig {
        idle_threshold_secs: idle,
        stuck_threshold_secs: stuck,
        ..Default::default()
    };
    assert_eq!(validate_process_triage_config(&config).is_ok(), ok);
}

#[test]
fn triage_minimums() {
    let short_check = ProcessTriageConfig {
        check_interval_secs: 4,
        ..Default::default()
    };
    assert!(validate_process_triage_config(&short_check).is_err());

    let short_idle = ProcessTriageConfig {
        idle_threshold_secs: 29,
        ..Default::default()
    };
    assert!(validate_process_triage_config(&short_idle).is_err());
}

#[yare::parameterized(
    alert  = { "alert", true },
    kill   = { "kill", true },
    ignore = { "ignore", true },
    other  = { "explode", false },
)]
fn triage_on_stuck_actions(action: &str, ok: bool) {
    let config = ProcessTriageConfig {
        on_stuck: action.to_string(),
        ..Default::default()
    };
    assert_eq!(validate_process_triage_config(&config).is_ok(), ok);
}

#[test]
fn rano_poll_floor() {
    let config = RanoConfig {
        poll_interval_ms: 99,
        ..Default::default()
    };
    assert!(validate_rano_config(&config).is_err());
    let ok = RanoConfig {
        poll_interval_ms: 100,
        ..Default::default()
    };
    assert!(validate_rano_config(&ok).is_ok());
}

#[yare::parameterized(
    vote     = { "vote", "consensus" },
    pairwise = { "pairwise", "tournament" },
    sample   = { "sample", "best_of_n" },
    critique = { "critique", "debate" },
)]
fn deprecated_strategies_get_migration_hint(old: &str, replacement: &str) {
    let config = EnsembleConfig {
        strategy: old.to_string(),
        ..Default::default()
    };
    let err = validate_ensemble_config(&config).unwrap_err();
    assert!(err.message.contains("renamed"), "{err}");
    assert!(err.message.contains(replacement), "{err}");
}

#[test]
fn unknown_strategy_rejected() {
    let config = EnsembleConfig {
        strategy: "vibes".to_string(),
        ..Default::default()
    };
    let err = validate_ensemble_config(&config).unwrap_err();
    assert!(err.message.contains("unknown strategy"));
}

#[yare::parameterized(
    empty_is_json = { "", true },
    json  = { "json", true },
    toon  = { "toon", true },
    auto  = { "auto", true },
    other = { "xml", false },
)]
fn robot_formats(format: &str, ok: bool) {
    let config = RobotConfig {
        output: RobotOutputConfig {
            format: format.to_string(),
        },
    };
    assert_eq!(validate_robot_config(&config).is_ok(), ok);
}

#[yare::parameterized(
    off    = { "off", true },
    warn   = { "warn", true },
    redact = { "redact", true },
    block  = { "block", true },
    other  = { "maybe", false },
)]
fn redaction_modes(mode: &str, ok: bool) {
    let config = RedactionConfig {
        mode: Some(mode.to_string()),
    };
    assert_eq!(validate_redaction_config(&config).is_ok(), ok);
}

#[test]
fn safety_profiles() {
    for profile in ["standard", "safe", "paranoid"] {
        let config = SafetyConfig {
            profile: profile.to_string(),
        };
        assert!(validate_safety_config(&config).is_ok());
    }
    let bad = SafetyConfig {
        profile: "yolo".to_string(),
    };
    assert!(validate_safety_config(&bad).is_err());
}

#[test]
fn spawn_pacing_limits_must_be_positive_when_enabled() {
    let mut config = SpawnPacingConfig {
        max_concurrent_spawns: 0,
        ..Default::default()
    };
    assert!(validate_spawn_pacing_config(&config).is_err());

    config.enabled = false;
    assert!(validate_spawn_pacing_config(&config).is_ok());
}

#[test]
fn agent_caps_need_one_positive_part_per_tier() {
    let mut config = SpawnPacingConfig::default();
    config.agent_caps.codex_max_concurrent = 0;
    config.agent_caps.codex_rate_per_sec = 0.0;
    let err = validate_spawn_pacing_config(&config).unwrap_err();
    assert!(err.message.contains("codex"));

    config.agent_caps.codex_rate_per_sec = 0.5;
    assert!(validate_spawn_pacing_config(&config).is_ok());
}

#[test]
fn validate_aggregates_one_error_per_section() {
    let mut config = Config::default();
    config.context_rotation.warning_threshold = 0.9; // >= rotate
    config.safety.profile = "yolo".to_string();
    config.integrations.rano.poll_interval_ms = 10;

    let errors = validate(&config);
    assert_eq!(errors.len(), 3);
    let sections: Vec<&str> = errors.iter().map(|e| e.section).collect();
    assert!(sections.contains(&"context_rotation"));
    assert!(sections.contains(&"safety"));
    assert!(sections.contains(&"rano"));
}
