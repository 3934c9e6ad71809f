// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

fn overlay(vars: &[(&str, &str)]) -> Config {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let mut config = Config::default();
    apply_env_with(&mut config, |name| map.get(name).cloned());
    config
}

#[test]
fn env_overrides_numeric_values() {
    let config = overlay(&[("NTM_CASS_TIMEOUT", "60")]);
    assert_eq!(config.cass.timeout_secs, 60);
}

#[test]
fn invalid_numeric_env_is_ignored() {
    for bad in ["-5", "abc", "", "1.5"] {
        let config = overlay(&[("NTM_CASS_TIMEOUT", bad)]);
        assert_eq!(
            config.cass.timeout_secs,
            Config::default().cass.timeout_secs,
            "env value {bad:?} should be ignored"
        );
    }
}

#[test]
fn out_of_range_env_is_ignored() {
    let config = overlay(&[("NTM_CASS_SKIP_IF_CONTEXT_ABOVE", "150")]);
    assert_eq!(
        config.cass.context.skip_if_context_above,
        Config::default().cass.context.skip_if_context_above
    );

    let ok = overlay(&[("NTM_CASS_SKIP_IF_CONTEXT_ABOVE", "100")]);
    assert_eq!(ok.cass.context.skip_if_context_above, 100);
}

#[yare::parameterized(
    one       = { "1", true },
    truthy    = { "true", true },
    yes       = { "yes", false },
    zero      = { "0", false },
    empty     = { "", false },
    shouty    = { "TRUE", false },
)]
fn boolean_interpretation(value: &str, expected: bool) {
    let config = overlay(&[("NTM_ROTATION_ENABLED", value)]);
    assert_eq!(config.rotation.enabled, expected);
}

#[test]
fn min_relevance_range_checked() {
    let config = overlay(&[("NTM_CASS_MIN_RELEVANCE", "0.25")]);
    assert_eq!(config.cass.context.min_relevance, 0.25);

    let bad = overlay(&[("NTM_CASS_MIN_RELEVANCE", "1.5")]);
    assert_eq!(
        bad.cass.context.min_relevance,
        Config::default().cass.context.min_relevance
    );
}

#[test]
fn agent_mail_overrides() {
    let config = overlay(&[
        ("AGENT_MAIL_URL", "http://mail.local:9999"),
        ("AGENT_MAIL_TOKEN", "sekrit"),
        ("AGENT_MAIL_ENABLED", "true"),
    ]);
    assert_eq!(config.agent_mail.url, "http://mail.local:9999");
    assert_eq!(config.agent_mail.token.as_deref(), Some("sekrit"));
    assert!(config.agent_mail.enabled);
}

#[test]
fn projects_base_override() {
    let config = overlay(&[("NTM_PROJECTS_BASE", "/srv/projects")]);
    assert_eq!(
        config.projects_base.as_deref(),
        Some(std::path::Path::new("/srv/projects"))
    );
}

#[test]
fn recovery_overrides() {
    let config = overlay(&[
        ("NTM_RECOVERY_ENABLED", "1"),
        ("NTM_RECOVERY_INCLUDE_BEADS", "1"),
        ("NTM_RECOVERY_MAX_TOKENS", "6000"),
        ("NTM_RECOVERY_STALE_HOURS", "0"),
    ]);
    assert!(config.recovery.enabled);
    assert!(config.recovery.include_beads);
    assert_eq!(config.recovery.max_tokens, 6000);
    // Zero is out of range; default stays.
    assert_eq!(config.recovery.stale_hours, Config::default().recovery.stale_hours);
}

#[test]
fn unset_env_changes_nothing() {
    let config = overlay(&[]);
    assert_eq!(config, Config::default());
}
