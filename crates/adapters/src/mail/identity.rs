// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted mail identities.
//!
//! The server assigns each registered pane an agent name (e.g. `BlueLake`).
//! Identities are stored per `(session, project_key)` so a session working
//! across several projects keeps distinct names; loading without a
//! project_key is strict and refuses to guess between candidates.

use super::MailError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A pane's logical identity in the mail system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentIdentity {
    pub project_key: String,
    pub agent_name: String,
    pub program: String,
    #[serde(default)]
    pub model: Option<String>,
}

impl AgentIdentity {
    pub fn new(project_key: impl Into<String>, agent_name: impl Into<String>) -> Self {
        Self {
            project_key: project_key.into(),
            agent_name: agent_name.into(),
            program: "ntm".to_string(),
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

type IdentityMap = HashMap<String, HashMap<String, AgentIdentity>>;

/// JSON-file backed identity persistence.
#[derive(Debug, Clone)]
pub struct IdentityStore {
    path: PathBuf,
}

impl IdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_map(&self) -> Result<IdentityMap, MailError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(IdentityMap::new()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&contents).map_err(|e| MailError::BadPayload {
            method: "identity_store".to_string(),
            detail: e.to_string(),
        })
    }

    fn save_map(&self, map: &IdentityMap) -> Result<(), MailError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(map).map_err(|e| MailError::BadPayload {
            method: "identity_store".to_string(),
            detail: e.to_string(),
        })?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }

    /// Record an identity for a session.
    pub fn save(&self, session: &str, identity: &AgentIdentity) -> Result<(), MailError> {
        let mut map = self.load_map()?;
        map.entry(session.to_string())
            .or_default()
            .insert(identity.project_key.clone(), identity.clone());
        self.save_map(&map)
    }

    /// Load an identity.
    ///
    /// With a `project_key` the lookup is exact. Without one, the session
    /// must have exactly one identity; several candidates produce
    /// [`MailError::AmbiguousIdentity`] rather than a guess.
    pub fn load(
        &self,
        session: &str,
        project_key: Option<&str>,
    ) -> Result<AgentIdentity, MailError> {
        let map = self.load_map()?;
        let per_project = map.get(session).ok_or_else(|| MailError::UnknownIdentity {
            session: session.to_string(),
        })?;

        match project_key {
            Some(key) => per_project
                .get(key)
                .cloned()
                .ok_or_else(|| MailError::UnknownIdentity {
                    session: session.to_string(),
                }),
            None => {
                let mut identities = per_project.values();
                match (identities.next(), identities.next()) {
                    (Some(only), None) => Ok(only.clone()),
                    (Some(_), Some(_)) => Err(MailError::AmbiguousIdentity {
                        session: session.to_string(),
                    }),
                    (None, _) => Err(MailError::UnknownIdentity {
                        session: session.to_string(),
                    }),
                }
            }
        }
    }

    /// Remove a session's identities (e.g. on teardown).
    pub fn forget(&self, session: &str) -> Result<(), MailError> {
        let mut map = self.load_map()?;
        if map.remove(session).is_some() {
            self.save_map(&map)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
