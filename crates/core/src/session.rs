// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session-name grammar and project-directory resolution.
//!
//! A session name is `BASE` or `BASE--LABEL`. The base identifies the
//! project; every label of one base maps to the same project directory, so
//! `myproj` and `myproj--frontend` share a checkout.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Separator between a session base and its label.
pub const LABEL_SEPARATOR: &str = "--";

/// Maximum length of a session label.
pub const MAX_LABEL_LEN: usize = 50;

/// Errors from session-name validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionNameError {
    #[error("empty session name")]
    Empty,
    #[error("session name must start with a letter or digit: {0:?}")]
    BadLeadingChar(String),
    #[error("invalid character {1:?} in session name {0:?}")]
    BadChar(String, char),
    #[error("label too long ({0} chars, max {MAX_LABEL_LEN})")]
    LabelTooLong(usize),
    #[error("label must not contain the {LABEL_SEPARATOR:?} separator: {0:?}")]
    LabelContainsSeparator(String),
}

/// Split a session name into `(base, label)`.
///
/// The label is everything after the first `--`. A name without the
/// separator has no label.
pub fn parse_session_label(name: &str) -> (&str, Option<&str>) {
    match name.split_once(LABEL_SEPARATOR) {
        Some((base, label)) => (base, Some(label)),
        None => (name, None),
    }
}

/// Join a base and an optional label back into a session name.
pub fn format_session_name(base: &str, label: Option<&str>) -> String {
    match label {
        Some(label) => format!("{base}{LABEL_SEPARATOR}{label}"),
        None => base.to_string(),
    }
}

fn validate_word(word: &str, full: &str) -> Result<(), SessionNameError> {
    let mut chars = word.chars();
    match chars.next() {
        None => return Err(SessionNameError::Empty),
        Some(c) if !c.is_ascii_alphanumeric() => {
            return Err(SessionNameError::BadLeadingChar(full.to_string()))
        }
        Some(_) => {}
    }
    for c in chars {
        if !c.is_ascii_alphanumeric() && c != '_' && c != '-' {
            return Err(SessionNameError::BadChar(full.to_string(), c));
        }
    }
    Ok(())
}

/// Validate a label on its own (charset, length, no embedded separator).
pub fn validate_label(label: &str) -> Result<(), SessionNameError> {
    if label.contains(LABEL_SEPARATOR) {
        return Err(SessionNameError::LabelContainsSeparator(label.to_string()));
    }
    if label.len() > MAX_LABEL_LEN {
        return Err(SessionNameError::LabelTooLong(label.len()));
    }
    validate_word(label, label)
}

/// Validate a full session name (`BASE` or `BASE--LABEL`).
pub fn validate_session_name(name: &str) -> Result<(), SessionNameError> {
    let (base, label) = parse_session_label(name);
    validate_word(base, name)?;
    if let Some(label) = label {
        validate_label(label)?;
    }
    Ok(())
}

/// Resolve the project directory for a session name.
///
/// All labels of one base share the base's directory.
pub fn project_dir(projects_base: &Path, name: &str) -> PathBuf {
    let (base, _) = parse_session_label(name);
    projects_base.join(base)
}

/// A validated session name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionName(String);

impl SessionName {
    /// Parse and validate a session name.
    pub fn new(name: impl Into<String>) -> Result<Self, SessionNameError> {
        let name = name.into();
        validate_session_name(&name)?;
        Ok(Self(name))
    }

    /// The full name, including any label.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The base (project-identifying) part.
    pub fn base(&self) -> &str {
        parse_session_label(&self.0).0
    }

    /// The label, if any.
    pub fn label(&self) -> Option<&str> {
        parse_session_label(&self.0).1
    }

    /// The project directory under `projects_base`.
    pub fn project_dir(&self, projects_base: &Path) -> PathBuf {
        project_dir(projects_base, &self.0)
    }
}

impl fmt::Display for SessionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for SessionName {
    type Err = SessionNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
