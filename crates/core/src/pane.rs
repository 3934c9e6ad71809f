// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pane identity: agent kinds and the pane-title grammar.
//!
//! A pane title encodes the agent identity the orchestrator assigned at
//! spawn time: `<base>__<kind>_<index>[_<variant>][[tag,...]]`. The title is
//! authoritative for the agent kind; the binary actually running in the pane
//! is not consulted.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Kind of agent hosted in a pane.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Claude,
    Codex,
    Gemini,
    User,
    /// Plugin-registered agent, identified by its plugin key.
    Plugin(String),
}

impl AgentKind {
    /// Short code used in pane titles (`cc`, `cod`, `gmi`, `user`, plugin key).
    pub fn code(&self) -> &str {
        match self {
            AgentKind::Claude => "cc",
            AgentKind::Codex => "cod",
            AgentKind::Gemini => "gmi",
            AgentKind::User => "user",
            AgentKind::Plugin(key) => key,
        }
    }

    /// Parse a short code back into a kind. Unknown codes become plugins.
    pub fn from_code(code: &str) -> Self {
        match code {
            "cc" => AgentKind::Claude,
            "cod" => AgentKind::Codex,
            "gmi" => AgentKind::Gemini,
            "user" => AgentKind::User,
            other => AgentKind::Plugin(other.to_string()),
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A pane located by session and index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaneRef {
    pub session: String,
    pub index: u32,
}

impl PaneRef {
    pub fn new(session: impl Into<String>, index: u32) -> Self {
        Self {
            session: session.into(),
            index,
        }
    }
}

impl fmt::Display for PaneRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.session, self.index)
    }
}

/// Pane metadata as reported by the multiplexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaneInfo {
    /// Multiplexer-assigned pane id (e.g. `%12`).
    pub id: String,
    pub index: u32,
    pub title: String,
    pub shell_pid: u32,
}

impl PaneInfo {
    /// Stable key for this pane: the title when set, else `session:index`.
    pub fn pane_key(&self, session: &str) -> String {
        if self.title.is_empty() {
            format!("{}:{}", session, self.index)
        } else {
            self.title.clone()
        }
    }
}

/// Errors from pane-title parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaneTitleError {
    #[error("missing '__' separator in pane title: {0:?}")]
    MissingSeparator(String),
    #[error("missing agent index in pane title: {0:?}")]
    MissingIndex(String),
    #[error("invalid agent index {1:?} in pane title: {0:?}")]
    BadIndex(String, String),
    #[error("unterminated tag list in pane title: {0:?}")]
    UnterminatedTags(String),
}

/// Parsed agent pane title.
///
/// Grammar: `<BASE>__<KIND>_<INDEX>(_<VARIANT>)?(\[<TAG>(,<TAG>)*\])?`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaneTitle {
    pub session_base: String,
    pub kind: AgentKind,
    pub index: u32,
    /// Model alias, e.g. `opus`.
    pub variant: Option<String>,
    /// Ordered tags; duplicates preserved as written.
    pub tags: Vec<String>,
}

impl PaneTitle {
    pub fn new(session_base: impl Into<String>, kind: AgentKind, index: u32) -> Self {
        Self {
            session_base: session_base.into(),
            kind,
            index,
            variant: None,
            tags: Vec::new(),
        }
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Parse a pane title. The base is everything before the *last* `__`,
    /// since a session base may itself contain underscores.
    pub fn parse(title: &str) -> Result<Self, PaneTitleError> {
        let (head, tags) = match title.find('[') {
            Some(open) => {
                let Some(rest) = title[open..].strip_prefix('[').and_then(|t| t.strip_suffix(']'))
                else {
                    return Err(PaneTitleError::UnterminatedTags(title.to_string()));
                };
                let tags = rest
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect();
                (&title[..open], tags)
            }
            None => (title, Vec::new()),
        };

        let sep = head
            .rfind("__")
            .ok_or_else(|| PaneTitleError::MissingSeparator(title.to_string()))?;
        let base = &head[..sep];
        let rest = &head[sep + 2..];

        let mut parts = rest.splitn(3, '_');
        let code = parts.next().unwrap_or_default();
        let index_str = parts
            .next()
            .ok_or_else(|| PaneTitleError::MissingIndex(title.to_string()))?;
        let index: u32 = index_str
            .parse()
            .map_err(|_| PaneTitleError::BadIndex(title.to_string(), index_str.to_string()))?;
        let variant = parts.next().filter(|v| !v.is_empty()).map(str::to_string);

        Ok(Self {
            session_base: base.to_string(),
            kind: AgentKind::from_code(code),
            index,
            variant,
            tags,
        })
    }
}

impl fmt::Display for PaneTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}__{}_{}", self.session_base, self.kind.code(), self.index)?;
        if let Some(ref variant) = self.variant {
            write!(f, "_{variant}")?;
        }
        if !self.tags.is_empty() {
            write!(f, "[{}]", self.tags.join(","))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "pane_tests.rs"]
mod tests;
