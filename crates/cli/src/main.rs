// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ntm: fleet orchestration for interactive coding agents in tmux.

mod actions;
mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ntm", version, about = "Named Tmux Manager: agent fleet orchestrator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a session and spawn agents into it
    Spawn(commands::spawn::SpawnArgs),
    /// Run the resident control plane for a session
    Monitor(commands::monitor::MonitorArgs),
    /// Kill a session and everything in it
    Kill(commands::kill::KillArgs),
    /// List a session's panes
    List(commands::list::ListArgs),
    /// Send a line of input to one pane
    Send(commands::send::SendArgs),
    /// Show session and configuration status
    Status(commands::status::StatusArgs),
    /// Configuration inspection
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ntm=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Spawn(args) => commands::spawn::run(args).await,
        Command::Monitor(args) => commands::monitor::run(args).await,
        Command::Kill(args) => commands::kill::run(args).await,
        Command::List(args) => commands::list::run(args).await,
        Command::Send(args) => commands::send::run(args).await,
        Command::Status(args) => commands::status::run(args).await,
        Command::Config(command) => commands::config::run(command).await,
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
