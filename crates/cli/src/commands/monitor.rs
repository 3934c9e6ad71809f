// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ntm monitor`: the resident control plane for one session.
//!
//! Wires the whole composition: streamers feed the rotation supervisors
//! and the account engine, the PID map feeds triage, triage alerts and all
//! lifecycle events flow through the bus to the webhook dispatcher. Runs
//! until ctrl-c, then tears down leaf-first.

use crate::actions::MuxRotationActions;
use clap::Args;
use ntm_adapters::{
    pidmap, MailClient, MuxAdapter, PidMap, StreamConfig, StreamManager, TmuxClient,
    WebhookDispatcher,
};
use ntm_config::{Config, ConfigHandle, ConfigWatcher, Loader};
use ntm_core::clock::SystemClock;
use ntm_core::{AgentKind, BusEvent, EventType, PaneTitle, SessionName};
use ntm_engine::{
    AccountRotationEngine, Alert, ConflictDecision, ContextRotationSupervisor, EventBus,
    FileReservationWatcher, HealthMonitor, PaneAccount, ProjectReservations, TriageAction,
    Verdict,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Args)]
pub struct MonitorArgs {
    /// Session to monitor
    pub session: String,
}

pub async fn run(args: MonitorArgs) -> anyhow::Result<()> {
    let session = SessionName::new(&args.session)?;
    let loaded = super::load_config()?;
    let handle = ConfigHandle::new(loaded.config);
    let config = handle.current();

    let mux = TmuxClient::from_config(&config.tmux);
    anyhow::ensure!(
        mux.has_session(session.as_str()).await?,
        "session {} does not exist",
        session
    );

    let cancel = CancellationToken::new();

    // Bus and emitter: the spine everything publishes into.
    let bus = Arc::new(EventBus::default());
    let emitter = Arc::new(ntm_engine::Emitter::new(
        Arc::clone(&bus),
        ntm_engine::bus::DEFAULT_EMITTER_BUFFER,
    ));

    // Webhooks subscribe before anything can emit.
    let webhook_guard = wire_webhooks(&config, &bus)?;

    // Live config reload republishes the snapshot handle.
    let config_watcher = ConfigWatcher::spawn(Loader::from_env(), handle.clone(), {
        move |snapshot| {
            tracing::info!(
                profile = %snapshot.safety.profile,
                "configuration snapshot updated"
            );
        }
    })?;

    // Pane inventory.
    let panes = mux.list_panes(session.as_str()).await?;
    let agent_panes: Vec<(String, PaneTitle)> = panes
        .iter()
        .filter_map(|p| {
            PaneTitle::parse(&p.title)
                .ok()
                .map(|title| (format!("{}:{}", session.as_str(), p.index), title))
        })
        .collect();
    tracing::info!(
        total = panes.len(),
        agents = agent_panes.len(),
        "monitoring session"
    );

    // Streamers.
    let (stream_manager, mut stream_rx) = StreamManager::new(
        mux.clone(),
        StreamConfig {
            fifo_dir: config
                .cleanup
                .fifo_dir
                .clone()
                .unwrap_or_else(std::env::temp_dir),
            ..StreamConfig::default()
        },
    );
    for (target, _) in &agent_panes {
        stream_manager.start_stream(target);
    }

    // Rotation supervisors.
    let rotation_actions = Arc::new(MuxRotationActions::new(
        mux.clone(),
        config.agents.clone(),
        config.accounts.claude.switch_helper.clone(),
    ));
    let context_rotation = ContextRotationSupervisor::new(
        config.context_rotation.clone(),
        config.recovery.clone(),
        config.agents.clone(),
        mux.clone(),
        Arc::clone(&emitter),
        Vec::new(),
    );
    let account_rotation = AccountRotationEngine::new(
        config.rotation.clone(),
        config.accounts.roster(),
        Arc::clone(&rotation_actions),
        Arc::clone(&emitter),
    );
    for (target, title) in &agent_panes {
        context_rotation.register_pane(target, session.as_str(), title.kind.clone());
        rotation_actions.track_pane(target, title.kind.clone());
        if let Some(account) = account_for_kind(&config, &title.kind) {
            account_rotation.register_pane(target, session.as_str(), account);
        }
    }

    // PID map + triage.
    let pid_map = PidMap::new();
    let pidmap_task = pidmap::spawn_refresh_loop(
        pid_map.clone(),
        mux.clone(),
        session.as_str().to_string(),
        ntm_adapters::env::pidmap_refresh_interval(),
        cancel.clone(),
    );
    let (monitor, mut alerts) = HealthMonitor::new(
        config.integrations.process_triage.clone(),
        SystemClock,
    );
    let triage_task = spawn_triage_loop(
        Arc::clone(&monitor),
        mux.clone(),
        pid_map.clone(),
        session.as_str().to_string(),
        handle.clone(),
        cancel.clone(),
    );

    // Alert fan-out to the bus.
    let alert_task = {
        let emitter = Arc::clone(&emitter);
        let session_name = session.as_str().to_string();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    alert = alerts.recv() => {
                        let Some(alert) = alert else { return };
                        emitter.emit(alert_event(&session_name, &alert));
                    }
                }
            }
        })
    };

    // File reservations, one watcher per agent pane.
    let mut reservation_tasks = Vec::new();
    if config.file_reservation.enabled && config.agent_mail.enabled {
        let mail = MailClient::new(&config.agent_mail);
        let project_key = session
            .project_dir(&config.projects_base())
            .to_string_lossy()
            .to_string();
        for (target, title) in &agent_panes {
            let api = ProjectReservations::new(
                mail.clone(),
                project_key.clone(),
                format!("{}_{}", title.kind.code(), title.index),
            );
            let watcher = FileReservationWatcher::new(
                config.file_reservation.clone(),
                mux.clone(),
                api,
                target.clone(),
                Arc::new(|conflict| {
                    tracing::info!(path = %conflict.path, holders = ?conflict.holders, "reservation conflict");
                    ConflictDecision::Skip
                }),
            );
            reservation_tasks.push(tokio::spawn(watcher.run(cancel.clone())));
        }
    }

    // Stream event pump: output drives both rotation engines.
    let pump_task = {
        let context_rotation = Arc::clone(&context_rotation);
        let account_rotation = Arc::clone(&account_rotation);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    event = stream_rx.recv() => {
                        let Some(event) = event else { return };
                        context_rotation.observe(&event);
                        account_rotation.observe(&event);
                    }
                }
            }
        })
    };

    tracing::info!("control plane running; ctrl-c to stop");
    tokio::signal::ctrl_c().await?;

    // Teardown, leaf-first: reservations and pumps before streamers, the
    // config watcher last.
    tracing::info!("shutting down");
    cancel.cancel();
    for task in reservation_tasks {
        let _ = task.await;
    }
    let _ = pump_task.await;
    let _ = alert_task.await;
    let _ = triage_task.await;
    let _ = pidmap_task.await;
    stream_manager.stop_all().await;
    drop(webhook_guard);
    config_watcher.stop();
    emitter.emit(BusEvent::new(EventType::SessionEnded, session.as_str()));

    Ok(())
}

fn wire_webhooks(
    config: &Config,
    bus: &Arc<EventBus>,
) -> anyhow::Result<Option<ntm_adapters::webhook::WebhookWatchGuard>> {
    if !config.notifications.webhook.enabled {
        return Ok(None);
    }
    let manifest = config
        .notifications
        .webhook
        .file
        .clone()
        .or_else(|| {
            config
                .project_root
                .as_ref()
                .map(|root| root.join(".ntm").join("webhooks.yaml"))
        });
    let Some(manifest) = manifest else {
        return Ok(None);
    };

    let dispatcher = Arc::new(WebhookDispatcher::new(manifest)?);
    let guard = dispatcher.spawn_watch()?;
    let subscriber = Arc::clone(&dispatcher);
    bus.subscribe_all(move |event| {
        let dispatcher = Arc::clone(&subscriber);
        async move {
            dispatcher.dispatch(&event).await;
        }
    });
    Ok(Some(guard))
}

fn account_for_kind(config: &Config, kind: &AgentKind) -> Option<PaneAccount> {
    let provider = match kind {
        AgentKind::Claude => ntm_core::account::Provider::Claude,
        AgentKind::Codex => ntm_core::account::Provider::Codex,
        AgentKind::Gemini => ntm_core::account::Provider::Gemini,
        _ => return None,
    };
    config
        .accounts
        .accounts
        .iter()
        .find(|a| a.provider == provider)
        .map(|a| PaneAccount {
            provider,
            email: a.email.clone(),
        })
}

fn alert_event(session: &str, alert: &Alert) -> BusEvent {
    match alert {
        Alert::Stuck { pane_key, dwell } => {
            BusEvent::new(EventType::HealthDegraded, session)
                .with_pane(pane_key.clone())
                .with_message(format!("stuck for {}s", dwell.as_secs()))
        }
        Alert::Idle { pane_key, dwell } => BusEvent::new(EventType::AgentIdle, session)
            .with_pane(pane_key.clone())
            .with_message(format!("idle for {}s", dwell.as_secs())),
        Alert::Zombie { pane_key } => BusEvent::new(EventType::HealthDegraded, session)
            .with_pane(pane_key.clone())
            .with_message("zombie process".to_string()),
    }
}

/// Periodic triage: refresh verdicts per pane and apply configured actions.
fn spawn_triage_loop(
    monitor: Arc<HealthMonitor<SystemClock>>,
    mux: TmuxClient,
    pid_map: PidMap,
    session: String,
    handle: ConfigHandle,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let config = handle.current();
            let triage = &config.integrations.process_triage;
            let interval = triage.check_interval();
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(interval) => {}
            }
            if !triage.enabled {
                continue;
            }

            for pane_key in pid_map.pane_keys() {
                let pid = pid_map.shell_pid(&pane_key);
                let verdict = match (triage.binary.is_empty(), pid) {
                    (false, Some(pid)) => external_verdict(&triage.binary, pid).await,
                    _ => None,
                };
                monitor.observe(&pane_key, verdict, pid);
            }

            for action in monitor.check() {
                match action {
                    TriageAction::KillPane { pane_key } => {
                        tracing::warn!(%pane_key, "killing stuck pane");
                        match resolve_target(&mux, &session, &pane_key).await {
                            Some(target) => {
                                if let Err(e) = mux.kill_pane(&target).await {
                                    tracing::warn!(%pane_key, error = %e, "kill pane failed");
                                }
                            }
                            None => {
                                tracing::warn!(%pane_key, "pane not found for kill");
                            }
                        }
                    }
                }
            }
        }
    })
}

/// Resolve a pane key (title, or `session:index`) to a tmux target.
async fn resolve_target(mux: &TmuxClient, session: &str, pane_key: &str) -> Option<String> {
    if pane_key.starts_with(&format!("{session}:")) {
        return Some(pane_key.to_string());
    }
    let panes = mux.list_panes(session).await.ok()?;
    panes
        .iter()
        .find(|p| p.title == pane_key)
        .map(|p| format!("{session}:{}", p.index))
}

/// Ask the external triage binary to classify a PID.
async fn external_verdict(binary: &str, pid: u32) -> Option<Verdict> {
    let output = tokio::process::Command::new(binary)
        .arg(pid.to_string())
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    Verdict::parse(&String::from_utf8_lossy(&output.stdout))
}
