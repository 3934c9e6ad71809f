// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Webhook manifest loading and event dispatch.
//!
//! Webhooks live in a per-project YAML file with `${ENV}` interpolation.
//! Each entry filters by event type, session glob, agent type and severity,
//! renders one of four formatter payloads, and POSTs with exponential
//! backoff. A manifest that fails to decode on reload leaves the previous
//! set active; on the initial load it is a hard error.

use ntm_core::{parse_duration, BusEvent, EventType};
use notify::{RecursiveMode, Watcher};
use parking_lot::RwLock;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Debounce window for manifest reloads.
const RELOAD_DEBOUNCE: Duration = Duration::from_millis(500);

/// Base delay for delivery retries.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Errors from webhook configuration and delivery.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("missing environment variables in webhook file: {}", .0.join(", "))]
    MissingEnv(Vec<String>),
    #[error("failed to decode webhook file: {0}")]
    Decode(#[from] serde_yaml::Error),
    #[error("webhook {name:?}: url must be https (or http to localhost): {url}")]
    InsecureUrl { name: String, url: String },
    #[error("webhook {name:?}: unknown event type {event:?}")]
    UnknownEvent { name: String, event: String },
    #[error("webhook {name:?}: invalid timeout: {detail}")]
    BadTimeout { name: String, detail: String },
    #[error("webhook {name:?}: invalid session glob: {detail}")]
    BadGlob { name: String, detail: String },
}

/// Payload formatter per endpoint flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookFormatter {
    Json,
    Slack,
    Discord,
    Teams,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FilterSpec {
    #[serde(default)]
    session: Option<String>,
    #[serde(default)]
    agent_types: Vec<String>,
    #[serde(default)]
    severities: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RetrySpec {
    #[serde(default = "default_max_attempts")]
    max_attempts: u32,
    #[serde(default = "default_backoff")]
    backoff: String,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff() -> String {
    "exponential".to_string()
}

impl Default for RetrySpec {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff: default_backoff(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct WebhookSpec {
    name: String,
    url: String,
    events: Vec<String>,
    #[serde(default = "default_formatter")]
    formatter: WebhookFormatter,
    #[serde(default)]
    filter: FilterSpec,
    #[serde(default)]
    retry: RetrySpec,
    #[serde(default)]
    timeout: Option<String>,
    #[serde(default)]
    secret: Option<String>,
}

fn default_formatter() -> WebhookFormatter {
    WebhookFormatter::Json
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestSpec {
    #[serde(default)]
    webhooks: Vec<WebhookSpec>,
}

/// A validated webhook entry.
#[derive(Debug, Clone)]
pub struct Webhook {
    pub name: String,
    pub url: String,
    pub events: Vec<EventType>,
    pub formatter: WebhookFormatter,
    pub session_glob: Option<glob::Pattern>,
    pub agent_types: Vec<String>,
    pub severities: Vec<String>,
    pub max_attempts: u32,
    pub timeout: Duration,
    pub secret: Option<String>,
}

impl Webhook {
    /// Whether this webhook wants the event.
    pub fn matches(&self, event: &BusEvent) -> bool {
        if !self.events.contains(&event.event_type) {
            return false;
        }
        if let Some(ref pattern) = self.session_glob {
            if !pattern.matches(&event.session) {
                return false;
            }
        }
        if !self.agent_types.is_empty() {
            match event.agent.as_deref() {
                Some(agent) if self.agent_types.iter().any(|a| a == agent) => {}
                _ => return false,
            }
        }
        if !self.severities.is_empty() {
            let severity = event.severity().to_string();
            if !self.severities.iter().any(|s| *s == severity) {
                return false;
            }
        }
        true
    }
}

/// Interpolate `${VAR}` references; every missing variable is collected and
/// reported together.
fn interpolate_env(
    contents: &str,
    get_env: &dyn Fn(&str) -> Option<String>,
) -> Result<String, WebhookError> {
    let mut out = String::with_capacity(contents.len());
    let mut missing: Vec<String> = Vec::new();
    let mut rest = contents;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 2..];
        match tail.find('}') {
            Some(end) => {
                let var = &tail[..end];
                match get_env(var) {
                    Some(value) => out.push_str(&value),
                    None => {
                        if !missing.iter().any(|m| m == var) {
                            missing.push(var.to_string());
                        }
                    }
                }
                rest = &tail[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);

    if missing.is_empty() {
        Ok(out)
    } else {
        Err(WebhookError::MissingEnv(missing))
    }
}

fn is_localhost(url: &str) -> bool {
    let after_scheme = url.strip_prefix("http://").unwrap_or(url);
    let host = after_scheme
        .split(['/', ':'])
        .next()
        .unwrap_or_default();
    host == "localhost" || host == "127.0.0.1"
}

fn validate_spec(spec: WebhookSpec) -> Result<Webhook, WebhookError> {
    let https = spec.url.starts_with("https://");
    let local_http = spec.url.starts_with("http://") && is_localhost(&spec.url);
    if !https && !local_http {
        return Err(WebhookError::InsecureUrl {
            name: spec.name,
            url: spec.url,
        });
    }

    let mut events = Vec::with_capacity(spec.events.len());
    for event in &spec.events {
        match EventType::parse(event) {
            Some(parsed) => events.push(parsed),
            None => {
                return Err(WebhookError::UnknownEvent {
                    name: spec.name,
                    event: event.clone(),
                })
            }
        }
    }

    let session_glob = match spec.filter.session.as_deref() {
        Some(pattern) => Some(glob::Pattern::new(pattern).map_err(|e| WebhookError::BadGlob {
            name: spec.name.clone(),
            detail: e.to_string(),
        })?),
        None => None,
    };

    let timeout = match spec.timeout.as_deref() {
        Some(text) => parse_duration(text).map_err(|detail| WebhookError::BadTimeout {
            name: spec.name.clone(),
            detail,
        })?,
        None => Duration::from_secs(10),
    };

    Ok(Webhook {
        name: spec.name,
        url: spec.url,
        events,
        formatter: spec.formatter,
        session_glob,
        agent_types: spec.filter.agent_types,
        severities: spec.filter.severities,
        max_attempts: spec.retry.max_attempts.max(1),
        timeout,
        secret: spec.secret,
    })
}

/// Load and validate a manifest. A missing file is an empty set.
pub fn load_manifest(path: &Path) -> Result<Vec<Webhook>, WebhookError> {
    load_manifest_with(path, &|name| std::env::var(name).ok())
}

fn load_manifest_with(
    path: &Path,
    get_env: &dyn Fn(&str) -> Option<String>,
) -> Result<Vec<Webhook>, WebhookError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(WebhookError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let interpolated = interpolate_env(&contents, get_env)?;
    let manifest: ManifestSpec = serde_yaml::from_str(&interpolated)?;
    manifest.webhooks.into_iter().map(validate_spec).collect()
}

/// Render a per-formatter payload for one event.
pub fn render_payload(formatter: WebhookFormatter, event: &BusEvent) -> serde_json::Value {
    let summary = match (&event.pane, &event.message) {
        (Some(pane), Some(message)) => {
            format!("[{}] {} {}: {}", event.session, event.event_type, pane, message)
        }
        (Some(pane), None) => format!("[{}] {} {}", event.session, event.event_type, pane),
        (None, Some(message)) => format!("[{}] {}: {}", event.session, event.event_type, message),
        (None, None) => format!("[{}] {}", event.session, event.event_type),
    };

    match formatter {
        WebhookFormatter::Json => serde_json::to_value(event).unwrap_or_default(),
        WebhookFormatter::Slack => serde_json::json!({ "text": summary }),
        WebhookFormatter::Discord => serde_json::json!({ "content": summary }),
        WebhookFormatter::Teams => serde_json::json!({
            "title": event.event_type.to_string(),
            "text": summary,
        }),
    }
}

/// Dispatches bus events to the configured webhooks.
pub struct WebhookDispatcher {
    http: reqwest::Client,
    path: PathBuf,
    webhooks: Arc<RwLock<Vec<Webhook>>>,
}

impl WebhookDispatcher {
    /// Load the manifest at `path`. Decode failures here are hard errors;
    /// later reloads keep the previous set instead.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, WebhookError> {
        let path = path.into();
        let webhooks = load_manifest(&path)?;
        Ok(Self {
            http: reqwest::Client::new(),
            path,
            webhooks: Arc::new(RwLock::new(webhooks)),
        })
    }

    pub fn webhook_count(&self) -> usize {
        self.webhooks.read().len()
    }

    /// Re-read the manifest; on any failure the previous set stays.
    pub fn reload(&self) {
        match load_manifest(&self.path) {
            Ok(webhooks) => {
                tracing::info!(count = webhooks.len(), "webhook manifest reloaded");
                *self.webhooks.write() = webhooks;
            }
            Err(e) => {
                tracing::warn!(error = %e, "webhook reload failed; keeping previous set");
            }
        }
    }

    /// Deliver one event to every matching webhook, with retries.
    pub async fn dispatch(&self, event: &BusEvent) {
        let matching: Vec<Webhook> = self
            .webhooks
            .read()
            .iter()
            .filter(|w| w.matches(event))
            .cloned()
            .collect();

        for webhook in matching {
            let payload = render_payload(webhook.formatter, event);
            self.deliver(&webhook, &payload).await;
        }
    }

    async fn deliver(&self, webhook: &Webhook, payload: &serde_json::Value) {
        for attempt in 0..webhook.max_attempts {
            if attempt > 0 {
                let delay = RETRY_BASE_DELAY * 2u32.saturating_pow(attempt - 1);
                tokio::time::sleep(delay).await;
            }

            let mut request = self
                .http
                .post(&webhook.url)
                .timeout(webhook.timeout)
                .json(payload);
            if let Some(ref secret) = webhook.secret {
                request = request.header("X-Webhook-Secret", secret.as_str());
            }

            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(webhook = %webhook.name, "webhook delivered");
                    return;
                }
                Ok(response) => {
                    tracing::warn!(
                        webhook = %webhook.name,
                        status = response.status().as_u16(),
                        attempt = attempt + 1,
                        "webhook delivery rejected"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        webhook = %webhook.name,
                        error = %e,
                        attempt = attempt + 1,
                        "webhook delivery failed"
                    );
                }
            }
        }
        tracing::error!(
            webhook = %webhook.name,
            attempts = webhook.max_attempts,
            "webhook delivery gave up"
        );
    }

    /// Watch the manifest file and reload on change with a 500 ms debounce.
    ///
    /// Returns a guard; dropping it stops the watcher thread.
    pub fn spawn_watch(self: &Arc<Self>) -> Result<WebhookWatchGuard, notify::Error> {
        let (tx, rx) = mpsc::channel::<WatchSignal>();
        let event_tx = tx.clone();
        let mut watcher =
            notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                if res.is_ok() {
                    let _ = event_tx.send(WatchSignal::Changed);
                }
            })?;
        if let Some(dir) = self.path.parent().filter(|d| d.is_dir()) {
            watcher.watch(dir, RecursiveMode::NonRecursive)?;
        }

        let dispatcher = Arc::clone(self);
        let thread = std::thread::spawn(move || loop {
            match rx.recv() {
                Ok(WatchSignal::Changed) => {}
                Ok(WatchSignal::Stop) | Err(_) => return,
            }
            // Debounce the editor burst.
            loop {
                match rx.recv_timeout(RELOAD_DEBOUNCE) {
                    Ok(WatchSignal::Changed) => continue,
                    Ok(WatchSignal::Stop) => return,
                    Err(mpsc::RecvTimeoutError::Timeout) => break,
                    Err(mpsc::RecvTimeoutError::Disconnected) => return,
                }
            }
            dispatcher.reload();
        });

        Ok(WebhookWatchGuard {
            _watcher: watcher,
            stop_tx: tx,
            thread: Some(thread),
        })
    }
}

enum WatchSignal {
    Changed,
    Stop,
}

/// Keeps the manifest watcher alive.
pub struct WebhookWatchGuard {
    _watcher: notify::RecommendedWatcher,
    stop_tx: mpsc::Sender<WatchSignal>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl Drop for WebhookWatchGuard {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(WatchSignal::Stop);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod tests;
