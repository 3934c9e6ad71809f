// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bus event types.
//!
//! Event types form a closed set; subscribers match on [`EventType`] and
//! webhook consumers additionally read the pane/agent/message/details
//! payload fields.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::SystemTime;

/// The closed set of lifecycle event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "session.created")]
    SessionCreated,
    #[serde(rename = "session.killed")]
    SessionKilled,
    #[serde(rename = "session.ended")]
    SessionEnded,
    #[serde(rename = "agent.started")]
    AgentStarted,
    #[serde(rename = "agent.stopped")]
    AgentStopped,
    #[serde(rename = "agent.error")]
    AgentError,
    #[serde(rename = "agent.crashed")]
    AgentCrashed,
    #[serde(rename = "agent.restarted")]
    AgentRestarted,
    #[serde(rename = "agent.idle")]
    AgentIdle,
    #[serde(rename = "agent.busy")]
    AgentBusy,
    #[serde(rename = "agent.rate_limit")]
    AgentRateLimit,
    #[serde(rename = "agent.completed")]
    AgentCompleted,
    #[serde(rename = "rotation.needed")]
    RotationNeeded,
    #[serde(rename = "health.degraded")]
    HealthDegraded,
    #[serde(rename = "bead.assigned")]
    BeadAssigned,
    #[serde(rename = "bead.completed")]
    BeadCompleted,
    #[serde(rename = "bead.failed")]
    BeadFailed,
}

/// Severity classification used by webhook filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl EventType {
    /// All event types, in declaration order.
    pub const ALL: [EventType; 17] = [
        EventType::SessionCreated,
        EventType::SessionKilled,
        EventType::SessionEnded,
        EventType::AgentStarted,
        EventType::AgentStopped,
        EventType::AgentError,
        EventType::AgentCrashed,
        EventType::AgentRestarted,
        EventType::AgentIdle,
        EventType::AgentBusy,
        EventType::AgentRateLimit,
        EventType::AgentCompleted,
        EventType::RotationNeeded,
        EventType::HealthDegraded,
        EventType::BeadAssigned,
        EventType::BeadCompleted,
        EventType::BeadFailed,
    ];

    /// Wire name, e.g. `agent.started`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::SessionCreated => "session.created",
            EventType::SessionKilled => "session.killed",
            EventType::SessionEnded => "session.ended",
            EventType::AgentStarted => "agent.started",
            EventType::AgentStopped => "agent.stopped",
            EventType::AgentError => "agent.error",
            EventType::AgentCrashed => "agent.crashed",
            EventType::AgentRestarted => "agent.restarted",
            EventType::AgentIdle => "agent.idle",
            EventType::AgentBusy => "agent.busy",
            EventType::AgentRateLimit => "agent.rate_limit",
            EventType::AgentCompleted => "agent.completed",
            EventType::RotationNeeded => "rotation.needed",
            EventType::HealthDegraded => "health.degraded",
            EventType::BeadAssigned => "bead.assigned",
            EventType::BeadCompleted => "bead.completed",
            EventType::BeadFailed => "bead.failed",
        }
    }

    /// Parse a wire name. Unknown names are rejected (the set is closed).
    pub fn parse(s: &str) -> Option<EventType> {
        EventType::ALL.iter().copied().find(|t| t.as_str() == s)
    }

    /// Severity used by webhook filtering.
    pub fn severity(&self) -> Severity {
        match self {
            EventType::AgentCrashed | EventType::AgentError | EventType::BeadFailed => {
                Severity::Critical
            }
            EventType::AgentRateLimit
            | EventType::RotationNeeded
            | EventType::HealthDegraded
            | EventType::AgentIdle => Severity::Warning,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// A lifecycle event published on the bus.
///
/// Every event carries its type, timestamp and originating session. The
/// webhook payload fields (`pane`, `agent`, `message`, `details`) are
/// optional and empty for events that don't concern a single pane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub timestamp: SystemTime,
    pub session: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pane: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub details: HashMap<String, String>,
}

impl BusEvent {
    pub fn new(event_type: EventType, session: impl Into<String>) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            session: session.into(),
            pane: None,
            agent: None,
            message: None,
            details: HashMap::new(),
        }
    }

    pub fn with_pane(mut self, pane: impl Into<String>) -> Self {
        self.pane = Some(pane.into());
        self
    }

    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.event_type.severity()
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
