// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ntm status`: one-shot view of a session and its configuration.

use clap::Args;
use ntm_adapters::{CaptureRange, MuxAdapter, TmuxClient};
use ntm_core::{parse_session_label, PaneTitle, SessionName};
use ntm_engine::parse_context_usage;

#[derive(Args)]
pub struct StatusArgs {
    /// Session to inspect
    pub session: String,
}

pub async fn run(args: StatusArgs) -> anyhow::Result<()> {
    let session = SessionName::new(&args.session)?;
    let loaded = super::load_config()?;
    let config = &loaded.config;

    let (base, label) = parse_session_label(session.as_str());
    println!("session: {session}");
    println!("  base: {base}");
    if let Some(label) = label {
        println!("  label: {label}");
    }
    println!(
        "  project dir: {}",
        session.project_dir(&config.projects_base()).display()
    );
    println!("  safety profile: {}", config.safety.profile);

    if !loaded.validation_errors.is_empty() {
        println!("  config findings:");
        for err in &loaded.validation_errors {
            println!("    - {err}");
        }
    }

    let mux = TmuxClient::from_config(&config.tmux);
    if !mux.has_session(session.as_str()).await? {
        println!("  (session not running)");
        return Ok(());
    }

    let panes = mux.list_panes(session.as_str()).await?;
    println!("  panes: {}", panes.len());
    for pane in &panes {
        let target = format!("{}:{}", session, pane.index);
        let usage = match mux.capture_pane(&target, CaptureRange::LastLines(50)).await {
            Ok(snapshot) => snapshot
                .lines()
                .rev()
                .find_map(parse_context_usage)
                .map(|u| format!("{:.0}%", u * 100.0))
                .unwrap_or_else(|| "-".to_string()),
            Err(_) => "-".to_string(),
        };
        match PaneTitle::parse(&pane.title) {
            Ok(title) => println!(
                "    [{}] {} kind={} context={}",
                pane.index, pane.title, title.kind, usage
            ),
            Err(_) => println!("    [{}] {} (user shell)", pane.index, pane.title),
        }
    }
    Ok(())
}
