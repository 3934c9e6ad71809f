// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON-RPC-over-HTTP mail client.
//!
//! Tool invocations go through `tools/call`; a small REST surface carries
//! overseer sends and the reservation-listing resource read. Short calls
//! get the short timeout class; search, summarize and reservation listing
//! get the long one.

use super::{MailError, TimeoutClass};
use ntm_config::AgentMailConfig;
use ntm_core::reservation::{ReservationConflict, ReservationOutcome};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Client for the agent-mail server.
#[derive(Clone)]
pub struct MailClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    short_timeout: Duration,
    long_timeout: Duration,
    enabled: bool,
    next_id: Arc<AtomicU64>,
}

impl MailClient {
    pub fn new(config: &AgentMailConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            short_timeout: config.short_timeout(),
            long_timeout: config.long_timeout(),
            enabled: config.enabled,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    fn timeout_for(&self, class: TimeoutClass) -> Duration {
        match class {
            TimeoutClass::Short => self.short_timeout,
            TimeoutClass::Long => self.long_timeout,
        }
    }

    /// Invoke an MCP-style tool and return its result value.
    pub async fn call_tool(
        &self,
        method: &str,
        arguments: Value,
        class: TimeoutClass,
    ) -> Result<Value, MailError> {
        if !self.enabled {
            return Err(MailError::Disabled);
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": { "name": method, "arguments": arguments },
        });

        let mut request = self
            .http
            .post(format!("{}/rpc", self.base_url))
            .timeout(self.timeout_for(class))
            .json(&body);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|source| MailError::Transport {
            method: method.to_string(),
            source,
        })?;

        let status = response.status().as_u16();
        let payload: Value = response.json().await.map_err(|source| MailError::Transport {
            method: method.to_string(),
            source,
        })?;

        if let Some(error) = payload.get("error") {
            let cause = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string();
            return Err(MailError::Api {
                method: method.to_string(),
                status,
                cause,
            });
        }
        if status >= 400 {
            return Err(MailError::Api {
                method: method.to_string(),
                status,
                cause: payload.to_string(),
            });
        }

        payload
            .get("result")
            .cloned()
            .ok_or_else(|| MailError::BadPayload {
                method: method.to_string(),
                detail: "missing result".to_string(),
            })
    }

    // -- project / identity --

    pub async fn ensure_project(&self, project_key: &str) -> Result<Value, MailError> {
        self.call_tool(
            "ensure_project",
            json!({ "project_key": project_key }),
            TimeoutClass::Short,
        )
        .await
    }

    /// Register a pane as an agent; returns the server-assigned agent name.
    pub async fn register_agent(
        &self,
        project_key: &str,
        program: &str,
        model: Option<&str>,
    ) -> Result<String, MailError> {
        let result = self
            .call_tool(
                "register_agent",
                json!({
                    "project_key": project_key,
                    "program": program,
                    "model": model,
                }),
                TimeoutClass::Short,
            )
            .await?;
        result
            .get("agent_name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| MailError::BadPayload {
                method: "register_agent".to_string(),
                detail: "missing agent_name".to_string(),
            })
    }

    pub async fn create_agent_identity(
        &self,
        project_key: &str,
        agent_name: &str,
    ) -> Result<Value, MailError> {
        self.call_tool(
            "create_agent_identity",
            json!({ "project_key": project_key, "agent_name": agent_name }),
            TimeoutClass::Short,
        )
        .await
    }

    pub async fn whois(&self, project_key: &str, agent_name: &str) -> Result<Value, MailError> {
        self.call_tool(
            "whois",
            json!({ "project_key": project_key, "agent_name": agent_name }),
            TimeoutClass::Short,
        )
        .await
    }

    // -- messaging --

    pub async fn send_message(
        &self,
        project_key: &str,
        from: &str,
        to: &[String],
        subject: &str,
        body: &str,
    ) -> Result<Value, MailError> {
        self.call_tool(
            "send_message",
            json!({
                "project_key": project_key,
                "from": from,
                "to": to,
                "subject": subject,
                "body": body,
            }),
            TimeoutClass::Short,
        )
        .await
    }

    pub async fn reply_message(
        &self,
        project_key: &str,
        from: &str,
        message_id: &str,
        body: &str,
    ) -> Result<Value, MailError> {
        self.call_tool(
            "reply_message",
            json!({
                "project_key": project_key,
                "from": from,
                "message_id": message_id,
                "body": body,
            }),
            TimeoutClass::Short,
        )
        .await
    }

    pub async fn fetch_inbox(
        &self,
        project_key: &str,
        agent_name: &str,
        limit: u32,
    ) -> Result<Value, MailError> {
        self.call_tool(
            "fetch_inbox",
            json!({
                "project_key": project_key,
                "agent_name": agent_name,
                "limit": limit,
            }),
            TimeoutClass::Short,
        )
        .await
    }

    pub async fn mark_message_read(
        &self,
        project_key: &str,
        agent_name: &str,
        message_id: &str,
    ) -> Result<Value, MailError> {
        self.call_tool(
            "mark_message_read",
            json!({
                "project_key": project_key,
                "agent_name": agent_name,
                "message_id": message_id,
            }),
            TimeoutClass::Short,
        )
        .await
    }

    pub async fn acknowledge_message(
        &self,
        project_key: &str,
        agent_name: &str,
        message_id: &str,
    ) -> Result<Value, MailError> {
        self.call_tool(
            "acknowledge_message",
            json!({
                "project_key": project_key,
                "agent_name": agent_name,
                "message_id": message_id,
            }),
            TimeoutClass::Short,
        )
        .await
    }

    // -- contacts --

    pub async fn request_contact(
        &self,
        project_key: &str,
        from: &str,
        to: &str,
    ) -> Result<Value, MailError> {
        self.call_tool(
            "request_contact",
            json!({ "project_key": project_key, "from": from, "to": to }),
            TimeoutClass::Short,
        )
        .await
    }

    pub async fn respond_contact(
        &self,
        project_key: &str,
        agent_name: &str,
        request_id: &str,
        accept: bool,
    ) -> Result<Value, MailError> {
        self.call_tool(
            "respond_contact",
            json!({
                "project_key": project_key,
                "agent_name": agent_name,
                "request_id": request_id,
                "accept": accept,
            }),
            TimeoutClass::Short,
        )
        .await
    }

    pub async fn list_contacts(
        &self,
        project_key: &str,
        agent_name: &str,
    ) -> Result<Value, MailError> {
        self.call_tool(
            "list_contacts",
            json!({ "project_key": project_key, "agent_name": agent_name }),
            TimeoutClass::Short,
        )
        .await
    }

    // -- search / summarize (long) --

    pub async fn search_messages(
        &self,
        project_key: &str,
        query: &str,
        limit: u32,
    ) -> Result<Value, MailError> {
        self.call_tool(
            "search_messages",
            json!({ "project_key": project_key, "query": query, "limit": limit }),
            TimeoutClass::Long,
        )
        .await
    }

    pub async fn summarize_thread(
        &self,
        project_key: &str,
        thread_id: &str,
    ) -> Result<Value, MailError> {
        self.call_tool(
            "summarize_thread",
            json!({ "project_key": project_key, "thread_id": thread_id }),
            TimeoutClass::Long,
        )
        .await
    }

    // -- reservations --

    /// Request file reservations. The outcome partitions the request into
    /// granted paths and conflicts; conflicts are data, not an error.
    pub async fn file_reservation_paths(
        &self,
        project_key: &str,
        agent_name: &str,
        paths: &[String],
        exclusive: bool,
        ttl_minutes: u64,
        reason: &str,
    ) -> Result<ReservationOutcome, MailError> {
        let result = self
            .call_tool(
                "file_reservation_paths",
                json!({
                    "project_key": project_key,
                    "agent_name": agent_name,
                    "paths": paths,
                    "exclusive": exclusive,
                    "ttl_minutes": ttl_minutes,
                    "reason": reason,
                }),
                TimeoutClass::Long,
            )
            .await?;
        parse_reservation_outcome(&result)
    }

    pub async fn release_file_reservations(
        &self,
        project_key: &str,
        agent_name: &str,
        paths: &[String],
    ) -> Result<Value, MailError> {
        self.call_tool(
            "release_file_reservations",
            json!({
                "project_key": project_key,
                "agent_name": agent_name,
                "paths": paths,
            }),
            TimeoutClass::Short,
        )
        .await
    }

    pub async fn renew_file_reservations(
        &self,
        project_key: &str,
        agent_name: &str,
        paths: &[String],
        ttl_minutes: u64,
    ) -> Result<Value, MailError> {
        self.call_tool(
            "renew_file_reservations",
            json!({
                "project_key": project_key,
                "agent_name": agent_name,
                "paths": paths,
                "ttl_minutes": ttl_minutes,
            }),
            TimeoutClass::Short,
        )
        .await
    }

    /// Break a stale reservation with a justification; optionally notify
    /// the previous holder.
    pub async fn force_release_file_reservation(
        &self,
        project_key: &str,
        agent_name: &str,
        path: &str,
        justification: &str,
        notify_holder: bool,
    ) -> Result<Value, MailError> {
        self.call_tool(
            "force_release_file_reservation",
            json!({
                "project_key": project_key,
                "agent_name": agent_name,
                "path": path,
                "justification": justification,
                "notify_holder": notify_holder,
            }),
            TimeoutClass::Short,
        )
        .await
    }

    /// List reservations via the resource endpoint, falling back to the
    /// tool call when the server predates the resource.
    pub async fn list_reservations(&self, project_key: &str) -> Result<Value, MailError> {
        if !self.enabled {
            return Err(MailError::Disabled);
        }
        let url = format!(
            "{}/resources/file_reservations?project_key={}",
            self.base_url, project_key
        );
        let mut request = self.http.get(&url).timeout(self.long_timeout);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }
        match request.send().await {
            Ok(response) if response.status().is_success() => {
                response.json().await.map_err(|source| MailError::Transport {
                    method: "list_reservations".to_string(),
                    source,
                })
            }
            Ok(_) | Err(_) => {
                self.call_tool(
                    "list_file_reservations",
                    json!({ "project_key": project_key }),
                    TimeoutClass::Long,
                )
                .await
            }
        }
    }

    // -- session macros --

    pub async fn macro_start_session(
        &self,
        project_key: &str,
        agent_name: &str,
    ) -> Result<Value, MailError> {
        self.call_tool(
            "macro_start_session",
            json!({ "project_key": project_key, "agent_name": agent_name }),
            TimeoutClass::Short,
        )
        .await
    }

    pub async fn macro_handshake(
        &self,
        project_key: &str,
        from: &str,
        to: &str,
    ) -> Result<Value, MailError> {
        self.call_tool(
            "macro_handshake",
            json!({ "project_key": project_key, "from": from, "to": to }),
            TimeoutClass::Short,
        )
        .await
    }

    // -- overseer REST surface --

    /// Operator message to one agent, outside the tool surface.
    pub async fn overseer_send(
        &self,
        project_key: &str,
        to: &str,
        message: &str,
    ) -> Result<(), MailError> {
        if !self.enabled {
            return Err(MailError::Disabled);
        }
        let mut request = self
            .http
            .post(format!("{}/api/overseer/send", self.base_url))
            .timeout(self.short_timeout)
            .json(&json!({
                "project_key": project_key,
                "to": to,
                "message": message,
            }));
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(|source| MailError::Transport {
            method: "overseer_send".to_string(),
            source,
        })?;
        if !response.status().is_success() {
            return Err(MailError::Api {
                method: "overseer_send".to_string(),
                status: response.status().as_u16(),
                cause: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }
}

/// Parse a reservation result into the granted/conflict partition.
pub(crate) fn parse_reservation_outcome(result: &Value) -> Result<ReservationOutcome, MailError> {
    let granted = result
        .get("granted")
        .and_then(Value::as_array)
        .map(|paths| {
            paths
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let conflicts = result
        .get("conflicts")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let path = entry.get("path")?.as_str()?.to_string();
                    let holders = entry
                        .get("holders")
                        .and_then(Value::as_array)
                        .map(|h| {
                            h.iter()
                                .filter_map(Value::as_str)
                                .map(str::to_string)
                                .collect()
                        })
                        .unwrap_or_default();
                    Some(ReservationConflict { path, holders })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(ReservationOutcome { granted, conflicts })
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
