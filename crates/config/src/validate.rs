// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-section config validation.
//!
//! Each validator reports the first rule its section violates; the
//! top-level [`validate`] collects one error per failing section. Callers
//! decide whether a non-empty error list is fatal.

use crate::types::*;
use thiserror::Error;

/// A single violated configuration rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{section}] {message}")]
pub struct ConfigError {
    pub section: &'static str,
    pub message: String,
}

impl ConfigError {
    fn new(section: &'static str, message: impl Into<String>) -> Self {
        Self {
            section,
            message: message.into(),
        }
    }
}

/// Ensemble strategies accepted today.
const ENSEMBLE_STRATEGIES: &[&str] = &["best_of_n", "tournament", "consensus", "debate"];

/// Renamed strategies and their replacements, kept for migration hints.
const DEPRECATED_STRATEGIES: &[(&str, &str)] = &[
    ("vote", "consensus"),
    ("pairwise", "tournament"),
    ("sample", "best_of_n"),
    ("critique", "debate"),
];

pub fn validate_context_rotation_config(c: &ContextRotationConfig) -> Result<(), ConfigError> {
    let section = "context_rotation";
    for (name, value) in [
        ("warning_threshold", c.warning_threshold),
        ("rotate_threshold", c.rotate_threshold),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::new(
                section,
                format!("{name} must be in [0, 1], got {value}"),
            ));
        }
    }
    if c.warning_threshold >= c.rotate_threshold {
        return Err(ConfigError::new(
            section,
            format!(
                "warning_threshold ({}) must be below rotate_threshold ({})",
                c.warning_threshold, c.rotate_threshold
            ),
        ));
    }
    if !(500..=10_000).contains(&c.summary_max_tokens) {
        return Err(ConfigError::new(
            section,
            format!(
                "summary_max_tokens must be in [500, 10000], got {}",
                c.summary_max_tokens
            ),
        ));
    }
    if !matches!(c.default_confirm_action.as_str(), "rotate" | "ignore" | "compact") {
        return Err(ConfigError::new(
            section,
            format!(
                "default_confirm_action must be one of rotate, ignore, compact; got {:?}",
                c.default_confirm_action
            ),
        ));
    }
    Ok(())
}

pub fn validate_health_config(c: &HealthConfig) -> Result<(), ConfigError> {
    let section = "health";
    if c.stall_threshold_secs < c.check_interval_secs {
        return Err(ConfigError::new(
            section,
            format!(
                "stall_threshold ({}s) must be at least check_interval ({}s)",
                c.stall_threshold_secs, c.check_interval_secs
            ),
        ));
    }
    if c.restart_backoff_max_secs < c.restart_backoff_base_secs {
        return Err(ConfigError::new(
            section,
            format!(
                "restart_backoff_max ({}s) must be at least restart_backoff_base ({}s)",
                c.restart_backoff_max_secs, c.restart_backoff_base_secs
            ),
        ));
    }
    Ok(())
}

pub fn validate_cass_config(c: &CassConfig) -> Result<(), ConfigError> {
    let section = "cass";
    if !(0.0..=1.0).contains(&c.context.min_relevance) {
        return Err(ConfigError::new(
            section,
            format!(
                "context.min_relevance must be in [0, 1], got {}",
                c.context.min_relevance
            ),
        ));
    }
    if c.context.skip_if_context_above > 100 {
        return Err(ConfigError::new(
            section,
            format!(
                "context.skip_if_context_above must be in [0, 100], got {}",
                c.context.skip_if_context_above
            ),
        ));
    }
    Ok(())
}

pub fn validate_process_triage_config(c: &ProcessTriageConfig) -> Result<(), ConfigError> {
    let section = "process_triage";
    if c.check_interval_secs < 5 {
        return Err(ConfigError::new(
            section,
            format!("check_interval must be at least 5s, got {}s", c.check_interval_secs),
        ));
    }
    if c.idle_threshold_secs < 30 {
        return Err(ConfigError::new(
            section,
            format!("idle_threshold must be at least 30s, got {}s", c.idle_threshold_secs),
        ));
    }
    if c.stuck_threshold_secs < c.idle_threshold_secs {
        return Err(ConfigError::new(
            section,
            format!(
                "stuck_threshold ({}s) must be at least idle_threshold ({}s)",
                c.stuck_threshold_secs, c.idle_threshold_secs
            ),
        ));
    }
    if !matches!(c.on_stuck.as_str(), "alert" | "kill" | "ignore") {
        return Err(ConfigError::new(
            section,
            format!("on_stuck must be one of alert, kill, ignore; got {:?}", c.on_stuck),
        ));
    }
    Ok(())
}

pub fn validate_rano_config(c: &RanoConfig) -> Result<(), ConfigError> {
    if c.poll_interval_ms < 100 {
        return Err(ConfigError::new(
            "rano",
            format!("poll_interval_ms must be at least 100, got {}", c.poll_interval_ms),
        ));
    }
    Ok(())
}

pub fn validate_ensemble_config(c: &EnsembleConfig) -> Result<(), ConfigError> {
    let section = "ensemble";
    if let Some(&(_, replacement)) = DEPRECATED_STRATEGIES
        .iter()
        .find(|(old, _)| *old == c.strategy)
    {
        return Err(ConfigError::new(
            section,
            format!(
                "strategy {:?} was renamed; use {:?} instead",
                c.strategy, replacement
            ),
        ));
    }
    if !ENSEMBLE_STRATEGIES.contains(&c.strategy.as_str()) {
        return Err(ConfigError::new(
            section,
            format!(
                "unknown strategy {:?}; must be one of: {}",
                c.strategy,
                ENSEMBLE_STRATEGIES.join(", ")
            ),
        ));
    }
    if !(1..=32).contains(&c.max_candidates) {
        return Err(ConfigError::new(
            section,
            format!("max_candidates must be in [1, 32], got {}", c.max_candidates),
        ));
    }
    if c.budget.max_total_tokens == 0 {
        return Err(ConfigError::new(section, "budget.max_total_tokens must be positive"));
    }
    if c.synthesis.max_tokens == 0 {
        return Err(ConfigError::new(section, "synthesis.max_tokens must be positive"));
    }
    if !(0.0..=1.0).contains(&c.early_stop.min_agreement) {
        return Err(ConfigError::new(
            section,
            format!(
                "early_stop.min_agreement must be in [0, 1], got {}",
                c.early_stop.min_agreement
            ),
        ));
    }
    Ok(())
}

pub fn validate_robot_config(c: &RobotConfig) -> Result<(), ConfigError> {
    match c.output.format() {
        "json" | "toon" | "auto" => Ok(()),
        other => Err(ConfigError::new(
            "robot",
            format!("output.format must be one of json, toon, auto; got {other:?}"),
        )),
    }
}

pub fn validate_redaction_config(c: &RedactionConfig) -> Result<(), ConfigError> {
    match c.mode() {
        "off" | "warn" | "redact" | "block" => Ok(()),
        other => Err(ConfigError::new(
            "redaction",
            format!("mode must be one of off, warn, redact, block; got {other:?}"),
        )),
    }
}

pub fn validate_safety_config(c: &SafetyConfig) -> Result<(), ConfigError> {
    match c.profile.as_str() {
        "standard" | "safe" | "paranoid" => Ok(()),
        other => Err(ConfigError::new(
            "safety",
            format!("profile must be one of standard, safe, paranoid; got {other:?}"),
        )),
    }
}

pub fn validate_spawn_pacing_config(c: &SpawnPacingConfig) -> Result<(), ConfigError> {
    let section = "spawn_pacing";
    if !c.enabled {
        return Ok(());
    }
    if c.max_concurrent_spawns == 0 {
        return Err(ConfigError::new(section, "max_concurrent_spawns must be positive"));
    }
    if c.max_spawns_per_second <= 0.0 {
        return Err(ConfigError::new(section, "max_spawns_per_second must be positive"));
    }
    if c.burst_size == 0 {
        return Err(ConfigError::new(section, "burst_size must be positive"));
    }
    if c.backpressure_threshold == 0 {
        return Err(ConfigError::new(section, "backpressure_threshold must be positive"));
    }

    // Allocation specs: each kind's (concurrency, rate) tier must have
    // non-negative parts and at least one positive.
    let caps = &c.agent_caps;
    for (kind, concurrent, rate) in [
        ("claude", caps.claude_max_concurrent, caps.claude_rate_per_sec),
        ("codex", caps.codex_max_concurrent, caps.codex_rate_per_sec),
        ("gemini", caps.gemini_max_concurrent, caps.gemini_rate_per_sec),
    ] {
        if rate < 0.0 {
            return Err(ConfigError::new(
                section,
                format!("agent_caps.{kind}_rate_per_sec must not be negative"),
            ));
        }
        if concurrent == 0 && rate == 0.0 {
            return Err(ConfigError::new(
                section,
                format!("agent_caps for {kind} must have a positive concurrency or rate"),
            ));
        }
    }

    if c.headroom.enabled && c.headroom.check_interval_ms < 100 {
        return Err(ConfigError::new(
            section,
            format!(
                "headroom.check_interval_ms must be at least 100, got {}",
                c.headroom.check_interval_ms
            ),
        ));
    }
    let backoff = &c.backoff;
    if backoff.initial_delay_ms == 0 || backoff.max_delay_ms == 0 {
        return Err(ConfigError::new(section, "backoff delays must be positive"));
    }
    if backoff.multiplier < 1.0 {
        return Err(ConfigError::new(
            section,
            format!("backoff.multiplier must be at least 1.0, got {}", backoff.multiplier),
        ));
    }
    if backoff.max_consecutive_failures == 0 {
        return Err(ConfigError::new(
            section,
            "backoff.max_consecutive_failures must be positive",
        ));
    }
    Ok(())
}

/// Run every section validator, collecting one error per failing section.
pub fn validate(config: &Config) -> Vec<ConfigError> {
    let checks: [Result<(), ConfigError>; 10] = [
        validate_context_rotation_config(&config.context_rotation),
        validate_health_config(&config.health),
        validate_cass_config(&config.cass),
        validate_process_triage_config(&config.integrations.process_triage),
        validate_rano_config(&config.integrations.rano),
        validate_ensemble_config(&config.ensemble),
        validate_robot_config(&config.robot),
        validate_redaction_config(&config.redaction),
        validate_safety_config(&config.safety),
        validate_spawn_pacing_config(&config.spawn_pacing),
    ];
    checks.into_iter().filter_map(Result::err).collect()
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
