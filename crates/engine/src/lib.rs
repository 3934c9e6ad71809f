// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ntm-engine: the runtime control plane.
//!
//! Admission (spawn pacer), observation (triage, PID map consumers),
//! reaction (context and account rotation, file-reservation upkeep) and the
//! pub/sub spine that connects them. Everything takes injected adapters so
//! tests run against fakes.

pub mod bus;
pub mod pacer;
pub mod reservation;
pub mod rotation;
pub mod triage;

pub use bus::{default_bus, default_emitter, Emitter, EventBus};
pub use pacer::{PacerError, PacerStats, SpawnPacer, SpawnPermit};
pub use reservation::{
    ConflictCallback, ConflictDecision, FileReservationWatcher, ProjectReservations,
    ReservationApi,
};
pub use rotation::account::{AccountRotationEngine, PaneAccount, RotationActions};
pub use rotation::context::{parse_context_usage, ContextPacker, ContextRotationSupervisor};
pub use triage::{Alert, Classification, HealthMonitor, PaneState, TriageAction, Verdict};
