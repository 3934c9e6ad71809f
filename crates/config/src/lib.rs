// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ntm-config: typed, validated, live-reloaded configuration.
//!
//! Three layers feed one immutable [`Config`] snapshot, in precedence order
//! environment > project (`.ntm/config.toml`, discovered by walking parent
//! directories) > global (user config path) > built-in defaults. Snapshots
//! are published atomically; readers hold an `Arc<Config>` and re-read on
//! each change event they care about.

pub mod env;
pub mod loader;
pub mod palette;
pub mod toml_edit;
pub mod types;
pub mod validate;
pub mod watcher;

pub use env::apply_env;
pub use loader::{discover_project_root, global_config_path, LoadError, Loaded, Loader};
pub use palette::{parse_markdown_palette, resolve_palette, PaletteCommand};
pub use toml_edit::{render_toml_string_array, upsert_toml_table};
pub use types::*;
pub use validate::{validate, ConfigError};
pub use watcher::{ConfigHandle, ConfigWatcher};
