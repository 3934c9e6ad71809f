// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ntm send`: deliver one line of input to a pane.

use clap::Args;
use ntm_adapters::{MuxAdapter, TmuxClient};
use ntm_core::SessionName;

#[derive(Args)]
pub struct SendArgs {
    /// Session holding the pane
    pub session: String,

    /// Pane index inside the session
    pub index: u32,

    /// Text to send
    pub text: String,

    /// Send the keys without a trailing Enter
    #[arg(long, default_value_t = false)]
    pub no_enter: bool,
}

pub async fn run(args: SendArgs) -> anyhow::Result<()> {
    let session = SessionName::new(&args.session)?;
    let loaded = super::load_config()?;

    let mux = TmuxClient::from_config(&loaded.config.tmux);
    let target = format!("{}:{}", session, args.index);
    if args.no_enter {
        mux.send_literal(&target, &args.text).await?;
    } else {
        mux.send_line(&target, &args.text).await?;
    }
    Ok(())
}
