// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment-variable overlay.
//!
//! Environment beats file config which beats defaults. Booleans read `"1"`
//! or `"true"` as true and anything else as false; numeric variables that
//! fail to parse or fall outside their range are ignored so a typo in the
//! environment can never poison a snapshot.

use crate::types::Config;

/// Apply the closed set of `NTM_*` / `AGENT_MAIL_*` overrides.
pub fn apply_env(config: &mut Config) {
    apply_env_with(config, |name| std::env::var(name).ok());
}

/// Inner implementation that accepts a lookup function for testability.
pub fn apply_env_with(config: &mut Config, get_env: impl Fn(&str) -> Option<String>) {
    if let Some(base) = get_env("NTM_PROJECTS_BASE") {
        if !base.is_empty() {
            config.projects_base = Some(base.into());
        }
    }

    if let Some(url) = get_env("AGENT_MAIL_URL") {
        if !url.is_empty() {
            config.agent_mail.url = url;
        }
    }
    if let Some(token) = get_env("AGENT_MAIL_TOKEN") {
        if !token.is_empty() {
            config.agent_mail.token = Some(token);
        }
    }
    if let Some(v) = get_env("AGENT_MAIL_ENABLED") {
        config.agent_mail.enabled = parse_bool(&v);
    }

    if let Some(v) = get_env("NTM_CASS_ENABLED") {
        config.cass.enabled = parse_bool(&v);
    }
    if let Some(v) = get_env("NTM_CASS_BINARY") {
        if !v.is_empty() {
            config.cass.binary = v;
        }
    }
    if let Some(timeout) = parse_in_range(get_env("NTM_CASS_TIMEOUT"), 1, u64::MAX) {
        config.cass.timeout_secs = timeout;
    }
    if let Some(v) = get_env("NTM_CASS_CONTEXT_ENABLED") {
        config.cass.context.enabled = parse_bool(&v);
    }
    if let Some(v) = get_env("NTM_CASS_MIN_RELEVANCE") {
        if let Ok(f) = v.trim().parse::<f64>() {
            if (0.0..=1.0).contains(&f) {
                config.cass.context.min_relevance = f;
            }
        }
    }
    if let Some(pct) = parse_in_range(get_env("NTM_CASS_SKIP_IF_CONTEXT_ABOVE"), 0, 100) {
        config.cass.context.skip_if_context_above = pct as u32;
    }
    if let Some(v) = get_env("NTM_CASS_PREFER_SAME_PROJECT") {
        config.cass.context.prefer_same_project = parse_bool(&v);
    }

    if let Some(v) = get_env("NTM_ACCOUNTS_AUTO_ROTATE") {
        config.accounts.auto_rotate = parse_bool(&v);
    }
    if let Some(v) = get_env("NTM_ROTATION_ENABLED") {
        config.rotation.enabled = parse_bool(&v);
    }
    if let Some(v) = get_env("NTM_GEMINI_AUTO_PRO") {
        config.gemini_setup.auto_pro = parse_bool(&v);
    }

    if let Some(v) = get_env("NTM_RECOVERY_ENABLED") {
        config.recovery.enabled = parse_bool(&v);
    }
    if let Some(v) = get_env("NTM_RECOVERY_INCLUDE_CM") {
        config.recovery.include_cm = parse_bool(&v);
    }
    if let Some(v) = get_env("NTM_RECOVERY_INCLUDE_AGENT_MAIL") {
        config.recovery.include_agent_mail = parse_bool(&v);
    }
    if let Some(v) = get_env("NTM_RECOVERY_INCLUDE_BEADS") {
        config.recovery.include_beads = parse_bool(&v);
    }
    if let Some(tokens) = parse_in_range(get_env("NTM_RECOVERY_MAX_TOKENS"), 1, u64::MAX) {
        config.recovery.max_tokens = tokens as u32;
    }
    if let Some(v) = get_env("NTM_RECOVERY_AUTO_INJECT") {
        config.recovery.auto_inject = parse_bool(&v);
    }
    if let Some(hours) = parse_in_range(get_env("NTM_RECOVERY_STALE_HOURS"), 1, u64::MAX) {
        config.recovery.stale_hours = hours as u32;
    }
}

/// `"1"` or `"true"` mean true; everything else is false.
fn parse_bool(v: &str) -> bool {
    matches!(v.trim(), "1" | "true")
}

/// Parse a numeric env value, discarding unparsable or out-of-range input.
fn parse_in_range(value: Option<String>, min: u64, max: u64) -> Option<u64> {
    let parsed = value?.trim().parse::<u64>().ok()?;
    (min..=max).contains(&parsed).then_some(parsed)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
