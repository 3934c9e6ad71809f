// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provider accounts and next-account selection for quota rotation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Agent provider backing an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Claude,
    Codex,
    Gemini,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Claude => "claude",
            Provider::Codex => "codex",
            Provider::Gemini => "gemini",
        }
    }

    pub fn parse(s: &str) -> Option<Provider> {
        match s {
            "claude" => Some(Provider::Claude),
            "codex" => Some(Provider::Codex),
            "gemini" => Some(Provider::Gemini),
            _ => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single login usable by agents of one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub provider: Provider,
    pub email: String,
    #[serde(default)]
    pub alias: Option<String>,
    /// Lower value wins when ordering candidates.
    #[serde(default)]
    pub priority: i32,
}

/// Ordered list of accounts across providers.
///
/// The roster preserves configuration order; `suggest_next_account` walks it
/// front to back, so position in the config file is the rotation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRoster {
    #[serde(default)]
    pub accounts: Vec<Account>,
}

impl AccountRoster {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }

    /// First account of `provider` whose email differs from `current`.
    ///
    /// Returns `None` when the provider has no other account; the current
    /// account is never suggested back.
    pub fn suggest_next_account(&self, provider: Provider, current: &str) -> Option<&Account> {
        self.accounts
            .iter()
            .filter(|a| a.provider == provider)
            .find(|a| a.email != current)
    }

    /// All accounts of one provider, in roster order.
    pub fn for_provider(&self, provider: Provider) -> impl Iterator<Item = &Account> {
        self.accounts.iter().filter(move |a| a.provider == provider)
    }

    /// Look up an account by email.
    pub fn by_email(&self, email: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.email == email)
    }
}

#[cfg(test)]
#[path = "account_tests.rs"]
mod tests;
