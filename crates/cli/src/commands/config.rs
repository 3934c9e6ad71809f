// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ntm config`: inspect and validate the merged configuration.

use clap::Subcommand;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Run all validators against the merged configuration
    Validate,
    /// Print the merged configuration as TOML
    Show,
}

pub async fn run(command: ConfigCommand) -> anyhow::Result<()> {
    let loaded = super::load_config()?;
    match command {
        ConfigCommand::Validate => {
            if loaded.validation_errors.is_empty() {
                println!("configuration is valid");
            } else {
                for err in &loaded.validation_errors {
                    println!("{err}");
                }
                anyhow::bail!("{} validation finding(s)", loaded.validation_errors.len());
            }
        }
        ConfigCommand::Show => {
            let rendered = toml::to_string_pretty(&loaded.config)?;
            print!("{rendered}");
        }
    }
    Ok(())
}
