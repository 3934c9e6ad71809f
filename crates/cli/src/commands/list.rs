// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ntm list`: show a session's panes and their agent identities.

use clap::Args;
use ntm_adapters::{MuxAdapter, TmuxClient};
use ntm_core::{PaneTitle, SessionName};

#[derive(Args)]
pub struct ListArgs {
    /// Session to list
    pub session: String,
}

pub async fn run(args: ListArgs) -> anyhow::Result<()> {
    let session = SessionName::new(&args.session)?;
    let loaded = super::load_config()?;

    let mux = TmuxClient::from_config(&loaded.config.tmux);
    let panes = mux.list_panes(session.as_str()).await?;

    for pane in &panes {
        match PaneTitle::parse(&pane.title) {
            Ok(title) => {
                let variant = title.variant.as_deref().unwrap_or("-");
                println!(
                    "{}\t{}\tkind={}\tindex={}\tvariant={}\tpid={}",
                    pane.index, pane.title, title.kind, title.index, variant, pane.shell_pid
                );
            }
            Err(_) => {
                println!("{}\t{}\t(user shell)\tpid={}", pane.index, pane.title, pane.shell_pid);
            }
        }
    }
    Ok(())
}
