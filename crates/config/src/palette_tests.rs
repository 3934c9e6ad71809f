// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::types::{Config, PaletteEntry};
use tempfile::TempDir;

#[test]
fn markdown_parser_reads_categories_and_commands() {
    let text = r#"
## Dev

### fix | Fix the build
Look at the failing tests.
Fix them one by one.

### ship | Ship it
Cut a release.

## Ops

### deploy | Deploy
Deploy to staging first.
"#;
    let commands = parse_markdown_palette(text);
    assert_eq!(commands.len(), 3);
    assert_eq!(commands[0].key, "fix");
    assert_eq!(commands[0].category, "Dev");
    assert_eq!(
        commands[0].prompt,
        "Look at the failing tests.\nFix them one by one."
    );
    assert_eq!(commands[2].category, "Ops");
}

#[test]
fn malformed_command_headers_are_skipped_silently() {
    let text = r#"
## Dev

### missing separator
orphan prompt text

### ok | Works
prompt
"#;
    let commands = parse_markdown_palette(text);
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].key, "ok");
}

#[test]
fn empty_key_is_skipped() {
    let commands = parse_markdown_palette("###  | No key\nprompt\n");
    assert!(commands.is_empty());
}

#[test]
fn seed_palette_is_nonempty_with_unique_keys() {
    let seed = seed_palette();
    assert!(!seed.is_empty());
    let mut keys: Vec<&str> = seed.iter().map(|c| c.key.as_str()).collect();
    keys.sort_unstable();
    keys.dedup();
    assert_eq!(keys.len(), seed.len());
}

#[test]
fn later_sources_override_by_key() {
    let tmp = TempDir::new().unwrap();
    let project = tmp.path();
    std::fs::write(
        project.join("command_palette.md"),
        "## Custom\n### status | Project status\ncustom prompt\n",
    )
    .unwrap();

    let mut config = Config::default();
    config.palette.push(PaletteEntry {
        key: "status".to_string(),
        label: "Toml status".to_string(),
        category: "T".to_string(),
        prompt: "toml".to_string(),
    });

    let palette = resolve_palette(&config, None, Some(project), None);
    let status = palette.iter().find(|c| c.key == "status").unwrap();
    // Markdown palette beats the TOML entry which beats the seed.
    assert_eq!(status.label, "Project status");
}

#[test]
fn explicit_palette_file_wins_over_discovered() {
    let tmp = TempDir::new().unwrap();
    let project = tmp.path();
    std::fs::write(
        project.join("command_palette.md"),
        "### status | Discovered\nd\n",
    )
    .unwrap();
    let explicit = project.join("mine.md");
    std::fs::write(&explicit, "### status | Explicit\ne\n").unwrap();

    let palette = resolve_palette(&Config::default(), None, Some(project), Some(&explicit));
    let status = palette.iter().find(|c| c.key == "status").unwrap();
    assert_eq!(status.label, "Explicit");
}
