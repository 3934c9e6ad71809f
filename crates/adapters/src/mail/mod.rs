// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent-mail client: registration, messaging, file reservations.

mod client;
mod identity;

pub use client::MailClient;
pub use identity::{AgentIdentity, IdentityStore};

use thiserror::Error;

/// Timeout class per operation: short for interactive calls, long for
/// searches, summaries and bulk reservation work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutClass {
    Short,
    Long,
}

/// Errors from mail operations.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("agent mail is disabled")]
    Disabled,
    #[error("{method} failed with status {status}: {cause}")]
    Api {
        method: String,
        status: u16,
        cause: String,
    },
    #[error("{method} request failed: {source}")]
    Transport {
        method: String,
        source: reqwest::Error,
    },
    #[error("{method} returned malformed payload: {detail}")]
    BadPayload { method: String, detail: String },
    #[error("identity for session {session:?} is ambiguous without a project_key")]
    AmbiguousIdentity { session: String },
    #[error("no identity registered for session {session:?}")]
    UnknownIdentity { session: String },
    #[error("identity store: {0}")]
    Store(#[from] std::io::Error),
}
