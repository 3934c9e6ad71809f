// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI subcommands. Each is a thin dispatcher into the library crates.

pub mod config;
pub mod kill;
pub mod list;
pub mod monitor;
pub mod send;
pub mod spawn;
pub mod status;

use ntm_config::{Loaded, Loader};

/// Load configuration from the ambient environment, logging (but not
/// failing on) validation findings.
pub(crate) fn load_config() -> anyhow::Result<Loaded> {
    let loaded = Loader::from_env().load()?;
    for err in &loaded.validation_errors {
        tracing::warn!(%err, "config validation");
    }
    Ok(loaded)
}
