// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ntm kill`: tear a session down.

use clap::Args;
use ntm_adapters::{MuxAdapter, TmuxClient};
use ntm_core::{BusEvent, EventType, SessionName};
use ntm_engine::default_emitter;

#[derive(Args)]
pub struct KillArgs {
    /// Session to kill
    pub session: String,
}

pub async fn run(args: KillArgs) -> anyhow::Result<()> {
    let session = SessionName::new(&args.session)?;
    let loaded = super::load_config()?;

    let mux = TmuxClient::from_config(&loaded.config.tmux);
    mux.kill_session(session.as_str()).await?;
    default_emitter().emit(BusEvent::new(EventType::SessionKilled, session.as_str()));

    // Drop any persisted mail identities for the session.
    let store = ntm_adapters::IdentityStore::new(super::spawn::identity_store_path());
    if let Err(e) = store.forget(session.as_str()) {
        tracing::debug!(error = %e, "identity cleanup failed");
    }

    println!("session {} killed", session);
    Ok(())
}
