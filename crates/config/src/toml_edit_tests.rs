// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn upsert_appends_missing_table() {
    let out = upsert_toml_table("[agents]\nclaude = \"claude\"\n", "palette_state", "pinned = []");
    assert!(out.contains("[agents]"));
    assert!(out.ends_with("[palette_state]\npinned = []\n"));
}

#[test]
fn upsert_replaces_existing_body() {
    let contents = "\
[palette_state]
pinned = [\"old\"]
recent = [\"old\"]

[agents]
claude = \"claude\"
";
    let out = upsert_toml_table(contents, "palette_state", "pinned = [\"new\"]");
    assert!(out.contains("pinned = [\"new\"]"));
    assert!(!out.contains("old"));
    // Other tables untouched.
    assert!(out.contains("[agents]"));
    assert!(out.contains("claude = \"claude\""));
}

#[test]
fn upsert_is_idempotent() {
    let contents = "[a]\nx = 1\n";
    let once = upsert_toml_table(contents, "palette_state", "pinned = [\"p\"]");
    let twice = upsert_toml_table(&once, "palette_state", "pinned = [\"p\"]");
    assert_eq!(once, twice);
}

#[test]
fn upsert_into_empty_contents() {
    let out = upsert_toml_table("", "t", "k = 1");
    assert_eq!(out, "[t]\nk = 1\n");
}

#[test]
fn render_array_quotes_and_dedups() {
    let items = vec![
        " fix ".to_string(),
        "ship".to_string(),
        "fix".to_string(),
        "".to_string(),
    ];
    assert_eq!(render_toml_string_array(&items), "[\"fix\", \"ship\"]");
}

#[test]
fn render_array_is_idempotent_under_trim_dedup() {
    let items = vec!["a".to_string(), "b".to_string()];
    let first = render_toml_string_array(&items);
    // Re-rendering the already-clean list changes nothing.
    let again = render_toml_string_array(&["a".to_string(), "b".to_string()]);
    assert_eq!(first, again);
    assert_eq!(first, "[\"a\", \"b\"]");
}

#[test]
fn render_empty_array() {
    assert_eq!(render_toml_string_array(&[]), "[]");
}
