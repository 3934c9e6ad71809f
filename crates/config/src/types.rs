// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The configuration tree.
//!
//! Every field is defaulted so a missing config file yields a complete,
//! usable snapshot. Knobs managed by the safety-profile overlay are
//! `Option`s at this layer: `None` means "the user did not set it" and the
//! profile may fill it in; accessors resolve the effective value.

use indexmap::IndexMap;
use ntm_core::account::Account;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Full configuration snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base directory under which session project checkouts live.
    pub projects_base: Option<PathBuf>,

    pub agents: AgentsConfig,
    pub tmux: TmuxConfig,
    pub agent_mail: AgentMailConfig,
    pub integrations: IntegrationsConfig,
    pub models: ModelsConfig,
    pub alerts: AlertsConfig,
    pub checkpoints: CheckpointsConfig,
    pub notifications: NotificationsConfig,
    pub resilience: ResilienceConfig,
    pub health: HealthConfig,
    pub scanner: ScannerConfig,
    pub cass: CassConfig,
    pub accounts: AccountsConfig,
    pub rotation: RotationConfig,
    pub gemini_setup: GeminiSetupConfig,
    pub context_rotation: ContextRotationConfig,
    pub recovery: RecoveryConfig,
    pub cleanup: CleanupConfig,
    pub file_reservation: FileReservationConfig,
    pub memory: MemoryConfig,
    pub assign: AssignConfig,
    pub ensemble: EnsembleConfig,
    pub swarm: SwarmConfig,
    pub spawn_pacing: SpawnPacingConfig,
    pub safety: SafetyConfig,
    pub preflight: PreflightConfig,
    pub redaction: RedactionConfig,
    pub privacy: PrivacyConfig,
    pub robot: RobotConfig,
    pub palette: Vec<PaletteEntry>,
    pub palette_state: PaletteStateConfig,

    /// Per-kind default agent counts from the project layer
    /// (`[defaults] agents = { cc = 5 }`). Runtime-only; never written back.
    #[serde(skip)]
    pub project_defaults: HashMap<String, u32>,

    /// Project root discovered during load. Runtime-only.
    #[serde(skip)]
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Effective projects base: configured value or `~/projects`.
    pub fn projects_base(&self) -> PathBuf {
        self.projects_base.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("projects")
        })
    }
}

/// Agent launch command strings. Read only from the global layer: a project
/// config cannot inject commands into the operator's shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentsConfig {
    pub claude: String,
    pub codex: String,
    pub gemini: String,
    pub user: String,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            claude: "claude".to_string(),
            codex: "codex".to_string(),
            gemini: "gemini".to_string(),
            user: String::new(),
        }
    }
}

impl AgentsConfig {
    /// Launch command for an agent kind; plugin kinds have no built-in command.
    pub fn command_for(&self, kind: &ntm_core::AgentKind) -> Option<&str> {
        use ntm_core::AgentKind;
        let cmd = match kind {
            AgentKind::Claude => &self.claude,
            AgentKind::Codex => &self.codex,
            AgentKind::Gemini => &self.gemini,
            AgentKind::User => &self.user,
            AgentKind::Plugin(_) => return None,
        };
        (!cmd.is_empty()).then_some(cmd.as_str())
    }
}

/// Terminal-multiplexer invocation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TmuxConfig {
    pub binary: String,
    /// Optional `user@host` to run the multiplexer remotely over ssh.
    pub remote_host: Option<String>,
    /// Lines captured by default for capture-pane operations.
    pub capture_lines: u32,
}

impl Default for TmuxConfig {
    fn default() -> Self {
        Self {
            binary: "tmux".to_string(),
            remote_host: None,
            capture_lines: 200,
        }
    }
}

/// Agent-mail server connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentMailConfig {
    pub enabled: bool,
    pub url: String,
    pub token: Option<String>,
    pub short_timeout_secs: u64,
    pub long_timeout_secs: u64,
}

impl Default for AgentMailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "http://127.0.0.1:8765".to_string(),
            token: None,
            short_timeout_secs: 10,
            long_timeout_secs: 30,
        }
    }
}

impl AgentMailConfig {
    pub fn short_timeout(&self) -> Duration {
        Duration::from_secs(self.short_timeout_secs)
    }

    pub fn long_timeout(&self) -> Duration {
        Duration::from_secs(self.long_timeout_secs)
    }
}

/// External-tool integrations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationsConfig {
    pub dcg: DcgConfig,
    pub caam: ToggleConfig,
    pub rch: ToggleConfig,
    pub caut: ToggleConfig,
    pub process_triage: ProcessTriageConfig,
    pub rano: RanoConfig,
}

/// Generic enable/disable integration block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToggleConfig {
    pub enabled: bool,
}

/// Destructive-command-guard integration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DcgConfig {
    pub enabled: bool,
    /// Whether agents may override a block. `None` = profile decides.
    pub allow_override: Option<bool>,
}

impl DcgConfig {
    pub fn allow_override(&self) -> bool {
        self.allow_override.unwrap_or(true)
    }
}

/// Process-triage classifier settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessTriageConfig {
    pub enabled: bool,
    /// External triage binary; empty means internal heuristics only.
    pub binary: String,
    pub check_interval_secs: u64,
    pub idle_threshold_secs: u64,
    pub stuck_threshold_secs: u64,
    pub on_stuck: String,
    pub history_limit: usize,
    pub alert_buffer: usize,
}

impl Default for ProcessTriageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            binary: String::new(),
            check_interval_secs: 15,
            idle_threshold_secs: 120,
            stuck_threshold_secs: 300,
            on_stuck: "alert".to_string(),
            history_limit: 32,
            alert_buffer: 64,
        }
    }
}

impl ProcessTriageConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn idle_threshold(&self) -> Duration {
        Duration::from_secs(self.idle_threshold_secs)
    }

    pub fn stuck_threshold(&self) -> Duration {
        Duration::from_secs(self.stuck_threshold_secs)
    }
}

/// Network-activity observer integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RanoConfig {
    pub enabled: bool,
    pub poll_interval_ms: u64,
}

impl Default for RanoConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            poll_interval_ms: 1000,
        }
    }
}

/// Model aliases per provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub claude: ModelAliases,
    pub codex: ModelAliases,
    pub gemini: ModelAliases,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelAliases {
    pub default: String,
    pub aliases: IndexMap<String, String>,
}

impl ModelAliases {
    /// Resolve a variant name through the alias table.
    pub fn resolve<'a>(&'a self, variant: &'a str) -> &'a str {
        self.aliases.get(variant).map(String::as_str).unwrap_or(variant)
    }
}

/// Alert delivery settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    pub enabled: bool,
    pub buffer_size: usize,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            buffer_size: 64,
        }
    }
}

/// Checkpoint persistence (external; the core only knows the location).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointsConfig {
    pub enabled: bool,
    pub dir: Option<PathBuf>,
}

/// Notification sinks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    pub enabled: bool,
    pub desktop: ToggleConfig,
    pub webhook: WebhookNotifyConfig,
    pub shell: ShellNotifyConfig,
    pub log: LogNotifyConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookNotifyConfig {
    pub enabled: bool,
    /// Per-project webhook manifest; default `<project>/.ntm/webhooks.yaml`.
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellNotifyConfig {
    pub enabled: bool,
    pub command: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogNotifyConfig {
    pub enabled: bool,
    pub path: Option<PathBuf>,
}

/// Crash/rate-limit resilience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    pub restart_on_crash: bool,
    pub rate_limit: RateLimitResilienceConfig,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            restart_on_crash: true,
            rate_limit: RateLimitResilienceConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitResilienceConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl Default for RateLimitResilienceConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 2000,
        }
    }
}

/// Agent health checks (stall detection and restart pacing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub enabled: bool,
    pub check_interval_secs: u64,
    pub stall_threshold_secs: u64,
    pub restart_backoff_base_secs: u64,
    pub restart_backoff_max_secs: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval_secs: 30,
            stall_threshold_secs: 300,
            restart_backoff_base_secs: 5,
            restart_backoff_max_secs: 300,
        }
    }
}

/// Scanner binary defaults (`ubs`, `dcg`, ... are external collaborators).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub enabled: bool,
    pub defaults: ScannerDefaults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerDefaults {
    pub timeout_secs: u64,
    pub max_output_kb: u64,
}

impl Default for ScannerDefaults {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            max_output_kb: 512,
        }
    }
}

/// Cass (session-search) integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CassConfig {
    pub enabled: bool,
    pub binary: String,
    pub timeout_secs: u64,
    pub context: CassContextConfig,
    pub duplicates: CassDuplicatesConfig,
    pub search: CassSearchConfig,
    pub tui: ToggleConfig,
}

impl Default for CassConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            binary: "cass".to_string(),
            timeout_secs: 30,
            context: CassContextConfig::default(),
            duplicates: CassDuplicatesConfig::default(),
            search: CassSearchConfig::default(),
            tui: ToggleConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CassContextConfig {
    pub enabled: bool,
    /// Minimum relevance score for injected context, in `[0, 1]`.
    pub min_relevance: f64,
    /// Skip injection when context usage is already above this percent.
    pub skip_if_context_above: u32,
    pub prefer_same_project: bool,
}

impl Default for CassContextConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_relevance: 0.5,
            skip_if_context_above: 70,
            prefer_same_project: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CassDuplicatesConfig {
    pub enabled: bool,
    pub threshold: f64,
}

impl Default for CassDuplicatesConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: 0.9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CassSearchConfig {
    pub max_results: u32,
}

impl Default for CassSearchConfig {
    fn default() -> Self {
        Self { max_results: 20 }
    }
}

/// Provider account roster and auto-rotation switch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountsConfig {
    pub auto_rotate: bool,
    pub accounts: Vec<Account>,
    pub claude: ClaudeAccountsConfig,
}

impl AccountsConfig {
    /// The configured accounts as a rotation roster, in file order.
    pub fn roster(&self) -> ntm_core::account::AccountRoster {
        ntm_core::account::AccountRoster::new(self.accounts.clone())
    }
}

/// Claude-specific account switching.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaudeAccountsConfig {
    /// Helper command invoked to switch the active login out of band.
    pub switch_helper: Option<String>,
}

/// Account-rotation policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    pub enabled: bool,
    /// Restart on the current account (after a grace period) instead of
    /// switching credentials.
    pub prefer_restart: bool,
    pub reset_buffer_minutes: u64,
    pub account_cooldown_secs: u64,
    /// Pane-output patterns that indicate a rate limit or quota hit.
    pub patterns: Vec<String>,
    pub thresholds: RotationThresholds,
    pub dashboard: ToggleConfig,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            prefer_restart: false,
            reset_buffer_minutes: 5,
            account_cooldown_secs: 1800,
            patterns: vec![
                "rate limit".to_string(),
                "429".to_string(),
                "too many requests".to_string(),
                "quota exceeded".to_string(),
            ],
            thresholds: RotationThresholds::default(),
            dashboard: ToggleConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationThresholds {
    pub warn_percent: u32,
    pub rotate_percent: u32,
}

impl Default for RotationThresholds {
    fn default() -> Self {
        Self {
            warn_percent: 80,
            rotate_percent: 95,
        }
    }
}

/// Gemini onboarding knobs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSetupConfig {
    pub auto_pro: bool,
}

/// Context-window rotation thresholds and handoff behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextRotationConfig {
    pub enabled: bool,
    pub warning_threshold: f64,
    pub rotate_threshold: f64,
    pub summary_max_tokens: u32,
    pub try_compact_first: bool,
    pub compact_wait_secs: u64,
    pub require_confirm: bool,
    pub confirm_timeout_sec: u64,
    pub default_confirm_action: String,
    pub min_session_age_sec: u64,
}

impl Default for ContextRotationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            warning_threshold: 0.7,
            rotate_threshold: 0.85,
            summary_max_tokens: 2000,
            try_compact_first: true,
            compact_wait_secs: 60,
            require_confirm: false,
            confirm_timeout_sec: 30,
            default_confirm_action: "rotate".to_string(),
            min_session_age_sec: 300,
        }
    }
}

/// Handoff-summary assembly for rotation continuations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    pub enabled: bool,
    pub include_cm: bool,
    pub include_agent_mail: bool,
    pub include_beads: bool,
    pub max_tokens: u32,
    pub auto_inject: bool,
    pub stale_hours: u32,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            include_cm: false,
            include_agent_mail: true,
            include_beads: false,
            max_tokens: 4000,
            auto_inject: true,
            stale_hours: 24,
        }
    }
}

/// Workspace cleanup behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    pub kill_orphans: bool,
    /// Directory for streamer FIFOs; default is the OS temp dir.
    pub fifo_dir: Option<PathBuf>,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            kill_orphans: true,
            fifo_dir: None,
        }
    }
}

/// File-reservation watcher cadence and TTLs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileReservationConfig {
    pub enabled: bool,
    pub poll_interval_sec: u64,
    pub capture_lines: u32,
    pub default_ttl_min: u64,
    pub extend_on_activity: bool,
    /// Release reservations idle at least this long; 0 = never auto-release.
    pub auto_release_idle_minutes: u64,
}

impl Default for FileReservationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            poll_interval_sec: 15,
            capture_lines: 120,
            default_ttl_min: 30,
            extend_on_activity: true,
            auto_release_idle_minutes: 60,
        }
    }
}

/// Memory-rules context packer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub enabled: bool,
    pub rules_file: Option<PathBuf>,
}

/// Work-assignment strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignConfig {
    pub enabled: bool,
    pub strategy: String,
}

impl Default for AssignConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            strategy: "round_robin".to_string(),
        }
    }
}

/// Multi-candidate ensemble runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    pub enabled: bool,
    pub strategy: String,
    pub max_candidates: u32,
    pub synthesis: EnsembleSynthesisConfig,
    pub cache: EnsembleCacheConfig,
    pub budget: EnsembleBudgetConfig,
    pub early_stop: EnsembleEarlyStopConfig,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            strategy: "best_of_n".to_string(),
            max_candidates: 3,
            synthesis: EnsembleSynthesisConfig::default(),
            cache: EnsembleCacheConfig::default(),
            budget: EnsembleBudgetConfig::default(),
            early_stop: EnsembleEarlyStopConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleSynthesisConfig {
    pub model: String,
    pub max_tokens: u32,
}

impl Default for EnsembleSynthesisConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            max_tokens: 4000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleCacheConfig {
    pub enabled: bool,
    pub ttl_secs: u64,
}

impl Default for EnsembleCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleBudgetConfig {
    pub max_total_tokens: u64,
}

impl Default for EnsembleBudgetConfig {
    fn default() -> Self {
        Self {
            max_total_tokens: 200_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleEarlyStopConfig {
    pub enabled: bool,
    pub min_agreement: f64,
}

impl Default for EnsembleEarlyStopConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_agreement: 0.8,
        }
    }
}

/// Swarm-mode limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    pub enabled: bool,
    pub max_agents: u32,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_agents: 12,
        }
    }
}

/// Spawn pacing: admission control for agent launches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnPacingConfig {
    pub enabled: bool,
    pub max_concurrent_spawns: u32,
    pub max_spawns_per_second: f64,
    pub burst_size: u32,
    pub backpressure_threshold: usize,
    pub default_retries: u32,
    pub retry_delay_ms: u64,
    pub agent_caps: AgentCapsConfig,
    pub headroom: HeadroomConfig,
    pub backoff: BackoffConfig,
}

impl Default for SpawnPacingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_concurrent_spawns: 4,
            max_spawns_per_second: 2.0,
            burst_size: 4,
            backpressure_threshold: 64,
            default_retries: 2,
            retry_delay_ms: 500,
            agent_caps: AgentCapsConfig::default(),
            headroom: HeadroomConfig::default(),
            backoff: BackoffConfig::default(),
        }
    }
}

/// Per-kind spawn limits. Each kind has a concurrency cap, a sustained
/// rate, and a ramp-up delay spacing initial REPL warm-ups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentCapsConfig {
    pub claude_max_concurrent: u32,
    pub claude_rate_per_sec: f64,
    pub claude_ramp_up_delay_ms: u64,
    pub codex_max_concurrent: u32,
    pub codex_rate_per_sec: f64,
    pub codex_ramp_up_delay_ms: u64,
    pub gemini_max_concurrent: u32,
    pub gemini_rate_per_sec: f64,
    pub gemini_ramp_up_delay_ms: u64,
}

impl Default for AgentCapsConfig {
    fn default() -> Self {
        Self {
            claude_max_concurrent: 2,
            claude_rate_per_sec: 1.0,
            claude_ramp_up_delay_ms: 1500,
            codex_max_concurrent: 2,
            codex_rate_per_sec: 1.0,
            codex_ramp_up_delay_ms: 1000,
            gemini_max_concurrent: 2,
            gemini_rate_per_sec: 1.0,
            gemini_ramp_up_delay_ms: 1000,
        }
    }
}

/// Host-headroom thresholds sampled between admissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadroomConfig {
    pub enabled: bool,
    pub check_interval_ms: u64,
    pub min_free_ram_mb: u64,
    pub min_free_disk_mb: u64,
    pub max_load_avg: f64,
    pub max_open_files: u64,
}

impl Default for HeadroomConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval_ms: 2000,
            min_free_ram_mb: 1024,
            min_free_disk_mb: 2048,
            max_load_avg: 16.0,
            max_open_files: 8192,
        }
    }
}

/// Failure backoff and circuit breaker for spawn attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub initial_delay_ms: u64,
    pub multiplier: f64,
    pub max_delay_ms: u64,
    pub max_consecutive_failures: u32,
    pub global_pause_duration_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1000,
            multiplier: 2.0,
            max_delay_ms: 60_000,
            max_consecutive_failures: 5,
            global_pause_duration_ms: 30_000,
        }
    }
}

/// Safety-profile selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    pub profile: String,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            profile: "standard".to_string(),
        }
    }
}

/// Preflight checks before spawning into a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreflightConfig {
    /// Strict mode fails the spawn on any preflight warning.
    /// `None` = profile decides.
    pub strict: Option<bool>,
}

impl PreflightConfig {
    pub fn strict(&self) -> bool {
        self.strict.unwrap_or(false)
    }
}

/// Output redaction of secrets/tokens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactionConfig {
    /// `off`, `warn`, `redact` or `block`. `None` = profile decides.
    pub mode: Option<String>,
}

impl RedactionConfig {
    pub fn mode(&self) -> &str {
        self.mode.as_deref().unwrap_or("off")
    }
}

/// Privacy flags applied to logs and webhook payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacyConfig {
    /// `None` = profile decides.
    pub redact_paths: Option<bool>,
    pub redact_emails: Option<bool>,
}

impl PrivacyConfig {
    pub fn redact_paths(&self) -> bool {
        self.redact_paths.unwrap_or(false)
    }

    pub fn redact_emails(&self) -> bool {
        self.redact_emails.unwrap_or(false)
    }
}

/// Machine-readable ("robot") output mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub output: RobotOutputConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotOutputConfig {
    /// `json`, `toon` or `auto`; empty means `json`.
    pub format: String,
}

impl RobotOutputConfig {
    pub fn format(&self) -> &str {
        if self.format.is_empty() {
            "json"
        } else {
            &self.format
        }
    }
}

/// One `[[palette]]` command entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteEntry {
    pub key: String,
    pub label: String,
    pub category: String,
    pub prompt: String,
}

/// Persisted palette UI state. Arrays are kept as quoted, de-duplicated
/// strings when written back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteStateConfig {
    pub pinned: Vec<String>,
    pub recent: Vec<String>,
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
