// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Small, idempotent text-level TOML edits.
//!
//! Used for writing palette state back into a config file without
//! disturbing anything the user wrote by hand. Both helpers are pure
//! string transforms so they compose with any persistence layer.

/// Replace the body of `[table]` in `contents`, or append the table when it
/// is absent. Calling twice with the same arguments yields the same result
/// as calling once.
pub fn upsert_toml_table(contents: &str, table: &str, body: &str) -> String {
    let header = format!("[{table}]");
    let body = body.trim_end();

    let mut out = String::with_capacity(contents.len() + body.len() + header.len() + 4);
    let mut lines = contents.lines().peekable();
    let mut replaced = false;

    while let Some(line) = lines.next() {
        if line.trim() == header {
            replaced = true;
            out.push_str(&header);
            out.push('\n');
            if !body.is_empty() {
                out.push_str(body);
                out.push('\n');
            }
            // Skip the previous body up to the next table header.
            while let Some(next) = lines.peek() {
                if next.trim_start().starts_with('[') {
                    break;
                }
                lines.next();
            }
        } else {
            out.push_str(line);
            out.push('\n');
        }
    }

    if !replaced {
        if !out.is_empty() && !out.ends_with("\n\n") {
            out.push('\n');
        }
        out.push_str(&header);
        out.push('\n');
        if !body.is_empty() {
            out.push_str(body);
            out.push('\n');
        }
    }
    out
}

/// Render a TOML string array from items: trimmed, de-duplicated preserving
/// first occurrence, each element quoted.
pub fn render_toml_string_array(items: &[String]) -> String {
    let mut seen = std::collections::HashSet::new();
    let quoted: Vec<String> = items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_string()))
        .map(|s| format!("{s:?}"))
        .collect();
    format!("[{}]", quoted.join(", "))
}

#[cfg(test)]
#[path = "toml_edit_tests.rs"]
mod tests;
