// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-reservation records as brokered by the mail server.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// A claim on one or more file paths.
///
/// Two exclusive reservations never overlap in matched path set while both
/// are unreleased; the server enforces this and reports conflicts back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReservation {
    pub id: u64,
    pub path_pattern: String,
    pub agent_name: String,
    pub exclusive: bool,
    #[serde(default)]
    pub reason: Option<String>,
    pub created_ts: SystemTime,
    pub expires_ts: SystemTime,
    #[serde(default)]
    pub released_ts: Option<SystemTime>,
}

impl FileReservation {
    /// A reservation is active while it is neither released nor expired.
    pub fn is_active(&self, now: SystemTime) -> bool {
        self.released_ts.is_none() && self.expires_ts > now
    }
}

/// One conflicting path with the agents currently holding it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationConflict {
    pub path: String,
    pub holders: Vec<String>,
}

/// Result of a reservation request.
///
/// Granted and conflicting paths partition the request: every requested path
/// lands in exactly one of the two lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationOutcome {
    pub granted: Vec<String>,
    pub conflicts: Vec<ReservationConflict>,
}

impl ReservationOutcome {
    pub fn all_granted(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Total number of paths accounted for (granted + conflicting).
    pub fn total(&self) -> usize {
        self.granted.len() + self.conflicts.len()
    }
}

#[cfg(test)]
#[path = "reservation_tests.rs"]
mod tests;
