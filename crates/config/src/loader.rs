// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config loading: layer discovery, merge, safety-profile expansion.
//!
//! A missing config file is not an error; the loader falls back to full
//! defaults. Parse errors are fatal for the load (the caller keeps whatever
//! snapshot it had). Validation errors come back as a list so the caller
//! chooses whether to proceed.

use crate::env::apply_env;
use crate::types::{Config, PaletteEntry};
use crate::validate::{validate, ConfigError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use toml::Value;

/// Errors that abort a load.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: Box<toml::de::Error>,
    },
}

/// A loaded snapshot plus any validation findings.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub config: Config,
    pub validation_errors: Vec<ConfigError>,
}

/// Resolve the global config path.
///
/// `NTM_CONFIG` wins, then `$XDG_CONFIG_HOME/ntm/config.toml`, then the
/// platform config dir.
pub fn global_config_path() -> PathBuf {
    global_config_path_with(|name| std::env::var(name).ok())
}

pub(crate) fn global_config_path_with(get_env: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(path) = get_env("NTM_CONFIG").filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    if let Some(xdg) = get_env("XDG_CONFIG_HOME").filter(|p| !p.is_empty()) {
        return PathBuf::from(xdg).join("ntm").join("config.toml");
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ntm")
        .join("config.toml")
}

/// Walk from `start` upward; the first ancestor containing
/// `.ntm/config.toml` is the project root.
pub fn discover_project_root(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        if current.join(".ntm").join("config.toml").is_file() {
            return Some(current.to_path_buf());
        }
        dir = current.parent();
    }
    None
}

/// Loads and merges the global and project layers.
#[derive(Debug, Clone)]
pub struct Loader {
    global_path: PathBuf,
    start_dir: PathBuf,
}

impl Loader {
    pub fn new(global_path: impl Into<PathBuf>, start_dir: impl Into<PathBuf>) -> Self {
        Self {
            global_path: global_path.into(),
            start_dir: start_dir.into(),
        }
    }

    /// Loader for the ambient environment: global path from env/platform,
    /// project discovery from the working directory.
    pub fn from_env() -> Self {
        let start = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::new(global_config_path(), start)
    }

    pub fn global_path(&self) -> &Path {
        &self.global_path
    }

    /// Paths the live-reload watcher should observe.
    pub fn watch_paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.global_path.clone()];
        if let Some(root) = discover_project_root(&self.start_dir) {
            paths.push(root.join(".ntm").join("config.toml"));
        }
        paths
    }

    /// Produce a fully merged, profile-expanded, env-overlaid snapshot.
    pub fn load(&self) -> Result<Loaded, LoadError> {
        let global = read_toml(&self.global_path)?.unwrap_or_else(empty_table);

        let project_root = discover_project_root(&self.start_dir);
        let project = match project_root.as_deref() {
            Some(root) => {
                read_toml(&root.join(".ntm").join("config.toml"))?.unwrap_or_else(empty_table)
            }
            None => empty_table(),
        };

        let (project, project_defaults) = sanitize_project_layer(project);
        let palette_state = merge_palette_state(&project, &global);
        let palette = merge_palette_entries(&project, &global);

        let merged = deep_merge(global, project);
        let mut config: Config = merged.try_into().map_err(|source| LoadError::Parse {
            path: self.global_path.clone(),
            source: Box::new(source),
        })?;

        config.palette_state = palette_state;
        config.palette = palette;
        config.project_defaults = project_defaults;
        config.project_root = project_root;

        apply_env(&mut config);
        apply_safety_profile(&mut config);

        let validation_errors = validate(&config);
        Ok(Loaded {
            config,
            validation_errors,
        })
    }
}

fn empty_table() -> Value {
    Value::Table(toml::map::Map::new())
}

fn read_toml(path: &Path) -> Result<Option<Value>, LoadError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(LoadError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let value = contents.parse::<Value>().map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source: Box::new(source),
    })?;
    Ok(Some(value))
}

/// Strip layers a project config may not provide and pull out runtime-only
/// fields.
///
/// `[agents]` is dropped entirely: launch command strings come from the
/// global layer only, so a cloned repository cannot inject commands into
/// the operator's panes. `[defaults] agents = { cc = 5 }` becomes the
/// runtime `project_defaults` map.
fn sanitize_project_layer(project: Value) -> (Value, HashMap<String, u32>) {
    let Value::Table(mut table) = project else {
        return (empty_table(), HashMap::new());
    };

    if table.remove("agents").is_some() {
        tracing::warn!("ignoring [agents] in project config (global-only table)");
    }

    let mut defaults = HashMap::new();
    if let Some(Value::Table(defaults_table)) = table.remove("defaults") {
        if let Some(Value::Table(agents)) = defaults_table.get("agents") {
            for (kind, count) in agents {
                if let Some(count) = count.as_integer().filter(|&c| c >= 0) {
                    defaults.insert(kind.clone(), count as u32);
                }
            }
        }
    }

    (Value::Table(table), defaults)
}

/// Merge `[palette_state]` lists: project entries precede global,
/// de-duplicated preserving first occurrence.
fn merge_palette_state(project: &Value, global: &Value) -> crate::types::PaletteStateConfig {
    let lists = |value: &Value, field: &str| -> Vec<String> {
        value
            .get("palette_state")
            .and_then(|t| t.get(field))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    };

    crate::types::PaletteStateConfig {
        pinned: dedup_first(lists(project, "pinned"), lists(global, "pinned")),
        recent: dedup_first(lists(project, "recent"), lists(global, "recent")),
    }
}

/// Merge `[[palette]]` entries, project first, de-duplicated by key.
fn merge_palette_entries(project: &Value, global: &Value) -> Vec<PaletteEntry> {
    let entries = |value: &Value| -> Vec<PaletteEntry> {
        value
            .get("palette")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.clone().try_into().ok())
                    .collect()
            })
            .unwrap_or_default()
    };

    let mut seen = std::collections::HashSet::new();
    entries(project)
        .into_iter()
        .chain(entries(global))
        .filter(|e: &PaletteEntry| seen.insert(e.key.clone()))
        .collect()
}

fn dedup_first(first: Vec<String>, second: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    first
        .into_iter()
        .chain(second)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

/// Recursive table merge; the overlay wins on scalars and arrays.
fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Table(mut base), Value::Table(overlay)) => {
            for (key, value) in overlay {
                let merged = match base.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                base.insert(key, merged);
            }
            Value::Table(base)
        }
        (_, overlay) => overlay,
    }
}

/// Fill profile-managed knobs the user left unset.
///
/// An explicit user value (file or env) always wins; the profile only
/// supplies defaults for `None` fields.
fn apply_safety_profile(config: &mut Config) {
    let (mode, redact_paths, redact_emails, dcg_override, strict) =
        match config.safety.profile.as_str() {
            "safe" => ("warn", true, false, true, true),
            "paranoid" => ("block", true, true, false, true),
            _ => ("off", false, false, true, false),
        };

    config
        .redaction
        .mode
        .get_or_insert_with(|| mode.to_string());
    config.privacy.redact_paths.get_or_insert(redact_paths);
    config.privacy.redact_emails.get_or_insert(redact_emails);
    config
        .integrations
        .dcg
        .allow_override
        .get_or_insert(dcg_override);
    config.preflight.strict.get_or_insert(strict);
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
