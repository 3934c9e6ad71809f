// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ntm-adapters: process-boundary adapters for the NTM control plane.
//!
//! Everything here talks to something outside the process: the terminal
//! multiplexer, pane-output FIFOs, `/proc`, the agent-mail server, and
//! webhook endpoints. The engine consumes these through narrow traits so
//! tests can substitute fakes.

pub mod env;
pub mod mail;
pub mod mux;
pub mod pidmap;
pub mod stream;
pub mod webhook;

pub use mail::{AgentIdentity, IdentityStore, MailClient, MailError, TimeoutClass};
pub use mux::{CaptureRange, MuxAdapter, MuxError, TmuxClient};
pub use pidmap::{parse_stat_line, PidMap, ProcessTable};
pub use stream::{StreamConfig, StreamManager, StreamStats};
pub use webhook::{WebhookDispatcher, WebhookError, WebhookFormatter};

#[cfg(any(test, feature = "test-support"))]
pub use mux::FakeMux;
