// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ntm spawn`: create a session and launch agents through the pacer.

use anyhow::Context;
use clap::Args;
use ntm_adapters::{MailClient, MuxAdapter, TmuxClient};
use ntm_config::Config;
use ntm_core::{AgentKind, BusEvent, EventType, PaneTitle, SessionName};
use ntm_engine::{default_emitter, SpawnPacer};
use std::sync::Arc;

#[derive(Args)]
pub struct SpawnArgs {
    /// Session name (`base` or `base--label`)
    pub session: String,

    /// Claude agents to spawn
    #[arg(long, default_value_t = 0)]
    pub cc: u32,

    /// Codex agents to spawn
    #[arg(long, default_value_t = 0)]
    pub cod: u32,

    /// Gemini agents to spawn
    #[arg(long, default_value_t = 0)]
    pub gmi: u32,

    /// Model variant recorded in pane titles (e.g. `opus`)
    #[arg(long)]
    pub variant: Option<String>,

    /// Register each agent pane with the mail server
    #[arg(long, default_value_t = false)]
    pub register: bool,
}

pub async fn run(args: SpawnArgs) -> anyhow::Result<()> {
    let session = SessionName::new(&args.session)?;

    let loaded = super::load_config()?;
    let config = loaded.config;

    let mut requests: Vec<(AgentKind, u32)> = vec![
        (AgentKind::Claude, args.cc),
        (AgentKind::Codex, args.cod),
        (AgentKind::Gemini, args.gmi),
    ];
    // Project-level defaults apply when nothing was asked explicitly.
    if requests.iter().all(|(_, n)| *n == 0) {
        for (kind, count) in &config.project_defaults {
            requests.push((AgentKind::from_code(kind), *count));
        }
    }
    let total: u32 = requests.iter().map(|(_, n)| n).sum();
    anyhow::ensure!(total > 0, "nothing to spawn: pass --cc/--cod/--gmi counts");

    let mux = TmuxClient::from_config(&config.tmux);
    let project_dir = session.project_dir(&config.projects_base());
    std::fs::create_dir_all(&project_dir)
        .with_context(|| format!("creating project dir {}", project_dir.display()))?;

    if !mux.has_session(session.as_str()).await? {
        mux.create_session(session.as_str(), &project_dir).await?;
        default_emitter().emit(BusEvent::new(EventType::SessionCreated, session.as_str()));
    }

    let pacer = Arc::new(SpawnPacer::new(
        config.spawn_pacing.clone(),
        config.projects_base(),
    ));

    let mail = config.agent_mail.enabled.then(|| MailClient::new(&config.agent_mail));
    let mut index = next_free_index(&mux, session.as_str()).await?;

    for (kind, count) in requests {
        for _ in 0..count {
            let title = spawn_one(
                &mux,
                &pacer,
                &config,
                &session,
                &project_dir,
                &kind,
                index,
                args.variant.as_deref(),
            )
            .await?;
            tracing::info!(%title, "agent spawned");

            if args.register {
                if let Some(ref mail) = mail {
                    register_agent(mail, &project_dir, &session, &kind).await;
                }
            }
            index += 1;
        }
    }

    println!("session {} ready", session);
    Ok(())
}

async fn next_free_index(mux: &TmuxClient, session: &str) -> anyhow::Result<u32> {
    let panes = mux.list_panes(session).await?;
    Ok(panes
        .iter()
        .filter_map(|p| PaneTitle::parse(&p.title).ok())
        .map(|t| t.index + 1)
        .max()
        .unwrap_or(1))
}

#[allow(clippy::too_many_arguments)]
async fn spawn_one(
    mux: &TmuxClient,
    pacer: &Arc<SpawnPacer>,
    config: &Config,
    session: &SessionName,
    project_dir: &std::path::Path,
    kind: &AgentKind,
    index: u32,
    variant: Option<&str>,
) -> anyhow::Result<PaneTitle> {
    let command = config
        .agents
        .command_for(kind)
        .ok_or_else(|| anyhow::anyhow!("no launch command configured for agent kind {kind}"))?
        .to_string();

    let mut title = PaneTitle::new(session.base(), kind.clone(), index);
    if let Some(variant) = variant {
        title = title.with_variant(variant);
    }

    let emitter = default_emitter();
    let session_name = session.as_str().to_string();
    let title_text = title.to_string();

    let result = pacer
        .run_spawn(kind, || {
            let command = command.clone();
            let title_text = title_text.clone();
            async move {
                let pane_id = mux
                    .split_window(session.as_str(), project_dir)
                    .await
                    .map_err(|e| e.to_string())?;
                mux.set_pane_title(&pane_id, &title_text)
                    .await
                    .map_err(|e| e.to_string())?;
                mux.send_line(&pane_id, &command)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok::<_, String>(pane_id)
            }
        })
        .await;

    match result {
        Ok(pane_id) => {
            emitter.emit(
                BusEvent::new(EventType::AgentStarted, &session_name)
                    .with_pane(title_text)
                    .with_agent(kind.code())
                    .with_detail("pane_id", pane_id),
            );
            Ok(title)
        }
        Err(e) => {
            emitter.emit(
                BusEvent::new(EventType::AgentError, &session_name)
                    .with_agent(kind.code())
                    .with_message(e.to_string()),
            );
            Err(e.into())
        }
    }
}

async fn register_agent(
    mail: &MailClient,
    project_dir: &std::path::Path,
    session: &SessionName,
    kind: &AgentKind,
) {
    let project_key = project_dir.to_string_lossy();
    if let Err(e) = mail.ensure_project(&project_key).await {
        tracing::warn!(error = %e, "mail: ensure_project failed");
        return;
    }
    match mail.register_agent(&project_key, "ntm", Some(kind.code())).await {
        Ok(agent_name) => {
            tracing::info!(%agent_name, "registered with agent mail");
            let store = ntm_adapters::IdentityStore::new(identity_store_path());
            let identity =
                ntm_adapters::AgentIdentity::new(project_key.to_string(), agent_name)
                    .with_model(kind.code());
            if let Err(e) = store.save(session.as_str(), &identity) {
                tracing::warn!(error = %e, "identity persistence failed");
            }
        }
        Err(e) => tracing::warn!(error = %e, "mail: register_agent failed"),
    }
}

pub(crate) fn identity_store_path() -> std::path::PathBuf {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("ntm")
        .join("identities.json")
}
