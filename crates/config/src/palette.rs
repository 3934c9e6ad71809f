// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-palette resolution.
//!
//! Sources from lowest to highest precedence: the hardcoded seed palette,
//! `[[palette]]` entries from TOML, a discovered markdown palette
//! (`~/.config/ntm/command_palette.md`, then `./command_palette.md`), and an
//! explicit `palette_file`. Later sources replace earlier entries with the
//! same key.

use crate::types::{Config, PaletteEntry};
use indexmap::IndexMap;
use std::path::Path;

/// A resolved palette command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteCommand {
    pub key: String,
    pub label: String,
    pub category: String,
    pub prompt: String,
}

impl From<PaletteEntry> for PaletteCommand {
    fn from(entry: PaletteEntry) -> Self {
        Self {
            key: entry.key,
            label: entry.label,
            category: entry.category,
            prompt: entry.prompt,
        }
    }
}

/// Built-in commands available before any configuration exists.
pub fn seed_palette() -> Vec<PaletteCommand> {
    [
        ("status", "Status check", "Workflow", "Summarize what you are working on and whether you are blocked."),
        ("continue", "Keep going", "Workflow", "Please continue with the current task."),
        ("tests", "Run the tests", "Dev", "Run the test suite and report failures."),
        ("review", "Self-review", "Dev", "Review your recent changes for defects before moving on."),
    ]
    .into_iter()
    .map(|(key, label, category, prompt)| PaletteCommand {
        key: key.to_string(),
        label: label.to_string(),
        category: category.to_string(),
        prompt: prompt.to_string(),
    })
    .collect()
}

/// Parse a markdown palette.
///
/// `## Category` sets the current category; `### key | Label` starts a
/// command; following non-heading lines accumulate into its prompt.
/// Malformed command headers are skipped silently.
pub fn parse_markdown_palette(text: &str) -> Vec<PaletteCommand> {
    let mut commands: Vec<PaletteCommand> = Vec::new();
    let mut category = String::new();
    let mut current: Option<PaletteCommand> = None;

    let mut flush = |cmd: Option<PaletteCommand>, commands: &mut Vec<PaletteCommand>| {
        if let Some(mut cmd) = cmd {
            cmd.prompt = cmd.prompt.trim().to_string();
            commands.push(cmd);
        }
    };

    for line in text.lines() {
        if let Some(heading) = line.strip_prefix("### ") {
            flush(current.take(), &mut commands);
            let Some((key, label)) = heading.split_once('|') else {
                // Malformed command header: no key | label separator.
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            current = Some(PaletteCommand {
                key: key.to_string(),
                label: label.trim().to_string(),
                category: category.clone(),
                prompt: String::new(),
            });
        } else if let Some(heading) = line.strip_prefix("## ") {
            flush(current.take(), &mut commands);
            category = heading.trim().to_string();
        } else if let Some(cmd) = current.as_mut() {
            if !cmd.prompt.is_empty() {
                cmd.prompt.push('\n');
            }
            cmd.prompt.push_str(line);
        }
    }
    flush(current, &mut commands);
    commands
}

/// Resolve the effective palette for a project.
///
/// `explicit_file` is the configured `palette_file`, if any; `home_dir` and
/// `project_root` locate the discovered markdown palettes.
pub fn resolve_palette(
    config: &Config,
    home_config_dir: Option<&Path>,
    project_root: Option<&Path>,
    explicit_file: Option<&Path>,
) -> Vec<PaletteCommand> {
    let mut by_key: IndexMap<String, PaletteCommand> = IndexMap::new();

    let mut absorb = |commands: Vec<PaletteCommand>| {
        for cmd in commands {
            by_key.insert(cmd.key.clone(), cmd);
        }
    };

    absorb(seed_palette());
    absorb(config.palette.iter().cloned().map(Into::into).collect());

    let mut markdown_candidates = Vec::new();
    if let Some(dir) = home_config_dir {
        markdown_candidates.push(dir.join("ntm").join("command_palette.md"));
    }
    if let Some(root) = project_root {
        markdown_candidates.push(root.join("command_palette.md"));
    }
    for candidate in markdown_candidates {
        if let Ok(text) = std::fs::read_to_string(&candidate) {
            absorb(parse_markdown_palette(&text));
        }
    }

    if let Some(path) = explicit_file {
        match std::fs::read_to_string(path) {
            Ok(text) => absorb(parse_markdown_palette(&text)),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "palette_file unreadable"),
        }
    }

    by_key.into_values().collect()
}

#[cfg(test)]
#[path = "palette_tests.rs"]
mod tests;
