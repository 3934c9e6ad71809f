// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ntm-core: Core library for the NTM (Named Tmux Manager) orchestrator

pub mod account;
pub mod clock;
pub mod duration;
pub mod event;
pub mod pane;
pub mod reservation;
pub mod session;
pub mod stream;

pub use account::{Account, AccountRoster, Provider};
pub use clock::{Clock, FakeClock, SystemClock};
pub use duration::parse_duration;
pub use event::{BusEvent, EventType, Severity};
pub use pane::{AgentKind, PaneInfo, PaneRef, PaneTitle, PaneTitleError};
pub use reservation::{FileReservation, ReservationConflict, ReservationOutcome};
pub use session::{
    format_session_name, parse_session_label, project_dir, validate_label, validate_session_name,
    SessionName, SessionNameError,
};
pub use stream::StreamEvent;
