// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    claude = { AgentKind::Claude, "cc" },
    codex  = { AgentKind::Codex, "cod" },
    gemini = { AgentKind::Gemini, "gmi" },
    user   = { AgentKind::User, "user" },
)]
fn kind_codes_round_trip(kind: AgentKind, code: &str) {
    assert_eq!(kind.code(), code);
    assert_eq!(AgentKind::from_code(code), kind);
}

#[test]
fn unknown_code_is_plugin() {
    assert_eq!(
        AgentKind::from_code("aider"),
        AgentKind::Plugin("aider".to_string())
    );
}

#[test]
fn title_parses_minimal() {
    let title = PaneTitle::parse("myproj__cc_1").unwrap();
    assert_eq!(title.session_base, "myproj");
    assert_eq!(title.kind, AgentKind::Claude);
    assert_eq!(title.index, 1);
    assert_eq!(title.variant, None);
    assert!(title.tags.is_empty());
}

#[test]
fn title_parses_variant_and_tags() {
    let title = PaneTitle::parse("myproj__cc_2_opus[fix,urgent]").unwrap();
    assert_eq!(title.variant.as_deref(), Some("opus"));
    assert_eq!(title.tags, vec!["fix", "urgent"]);
}

#[test]
fn title_base_may_contain_underscores() {
    let title = PaneTitle::parse("my_proj__gmi_3").unwrap();
    assert_eq!(title.session_base, "my_proj");
    assert_eq!(title.kind, AgentKind::Gemini);
}

#[test]
fn title_display_round_trips() {
    for s in [
        "proj__cc_1",
        "proj__cod_2_gpt5",
        "my_proj__gmi_3[alpha]",
        "p__user_0",
        "p__cc_4_opus[a,b,c]",
    ] {
        let parsed = PaneTitle::parse(s).unwrap();
        assert_eq!(parsed.to_string(), s);
        assert_eq!(PaneTitle::parse(&parsed.to_string()).unwrap(), parsed);
    }
}

#[yare::parameterized(
    no_separator   = { "plainshell" },
    no_index       = { "proj__cc" },
    bad_index      = { "proj__cc_x" },
    open_tags      = { "proj__cc_1[oops" },
)]
fn title_parse_rejects(s: &str) {
    assert!(PaneTitle::parse(s).is_err());
}

#[test]
fn pane_key_prefers_title() {
    let pane = PaneInfo {
        id: "%4".to_string(),
        index: 2,
        title: "proj__cc_1".to_string(),
        shell_pid: 4242,
    };
    assert_eq!(pane.pane_key("proj"), "proj__cc_1");

    let untitled = PaneInfo {
        title: String::new(),
        ..pane
    };
    assert_eq!(untitled.pane_key("proj"), "proj:2");
}

#[test]
fn builder_sets_fields() {
    let title = PaneTitle::new("proj", AgentKind::Codex, 7)
        .with_variant("mini")
        .with_tags(vec!["x".to_string()]);
    assert_eq!(title.to_string(), "proj__cod_7_mini[x]");
}
