//! Terminal watcher for a running Emergence simulation.
//!
//! Connects to the observer, follows the tick stream, and logs what a
//! person watching the dashboard would notice: connection phase changes,
//! each new tick, toast notifications, newly reached civilization
//! milestones, and agents stuck in a rule engine loop.
//!
//! Configuration is read from the YAML file named by
//! `EMERGENCE_WATCH_CONFIG`, falling back to `emergence-watch.yaml` in the
//! working directory, then to built-in defaults. Ctrl-C shuts down cleanly.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use anyhow::Context;
use emergence_telemetry::decisions::DecisionReport;
use emergence_telemetry::milestones::CivilizationMilestone;
use emergence_telemetry::sync::{Slot, SyncUpdate};
use emergence_telemetry::{TelemetryClient, TelemetryConfig};
use emergence_types::AgentId;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Config file used when `EMERGENCE_WATCH_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "emergence-watch.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the client
/// cannot be started. Connection and query failures are logged and retried,
/// never returned.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    init_logging(&config);

    info!(
        base_url = config.observer.base_url,
        stream_path = config.observer.stream_path,
        analytics_every_ticks = config.sync.analytics_every_ticks,
        "emergence-watch starting"
    );

    let client = TelemetryClient::connect(&config).context("failed to start telemetry client")?;
    let mut phases = client.connection().phase_changes();
    let mut frames = client.connection().subscribe();
    let mut updates = client.sync().subscribe();
    let mut tracker = Tracker::default();

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!(error = %e, "failed to listen for ctrl-c");
                }
                info!("shutdown requested");
                break;
            }
            changed = phases.changed() => {
                if changed.is_err() {
                    break;
                }
                let phase = *phases.borrow_and_update();
                info!(phase = %phase, "connection phase");
            }
            frame = frames.recv() => match frame {
                Ok(frame) => info!(
                    tick = frame.tick,
                    season = ?frame.season,
                    weather = ?frame.weather,
                    agents_alive = frame.agents_alive,
                    deaths = frame.deaths_this_tick,
                    actions = frame.actions_resolved,
                    "tick"
                ),
                Err(RecvError::Lagged(n)) => debug!(skipped = n, "watcher lagged behind ticks"),
                Err(RecvError::Closed) => break,
            },
            update = updates.recv() => match update {
                Ok(SyncUpdate::Toast(toast)) => info!(
                    category = toast.category.as_str(),
                    tick = toast.tick,
                    view = ?toast.target_view,
                    "{}",
                    toast.message
                ),
                Ok(SyncUpdate::Refreshed(Slot::Decisions)) => {
                    if let Some(report) = client.sync().decision_report().await {
                        tracker.report_decisions(&report);
                    }
                }
                Ok(SyncUpdate::Refreshed(slot)) if Slot::ANALYTICS.contains(&slot) => {
                    let milestones = client.sync().milestones().await;
                    tracker.report_milestones(&milestones);
                }
                Ok(SyncUpdate::Refreshed(_)) => {}
                Err(RecvError::Lagged(n)) => debug!(skipped = n, "watcher lagged behind sync updates"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    client.shutdown().await;
    Ok(())
}

/// Load the config file, or defaults when there is none.
fn load_config() -> anyhow::Result<TelemetryConfig> {
    let path = std::env::var("EMERGENCE_WATCH_CONFIG")
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);

    if path.exists() {
        TelemetryConfig::from_file(&path)
            .with_context(|| format!("failed to load {}", path.display()))
    } else {
        let mut config = TelemetryConfig::default();
        config.apply_env_overrides();
        Ok(config)
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the config level.
fn init_logging(config: &TelemetryConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// What has already been reported, so each thing is logged once.
#[derive(Debug, Default)]
struct Tracker {
    /// Milestones already logged, by tick, category, and label.
    milestones: BTreeSet<(u64, &'static str, String)>,
    /// Streak length last reported per stuck agent.
    stuck: BTreeMap<AgentId, u32>,
}

impl Tracker {
    /// Log milestones not seen before.
    fn report_milestones(&mut self, milestones: &[CivilizationMilestone]) {
        for milestone in milestones {
            let key = (milestone.tick, milestone.category.as_str(), milestone.label.clone());
            if self.milestones.insert(key) {
                info!(
                    tick = milestone.tick,
                    category = milestone.category.as_str(),
                    description = milestone.description,
                    "milestone: {}",
                    milestone.label
                );
            }
        }
    }

    /// Log cost totals and any agent whose loop is new or has grown.
    fn report_decisions(&mut self, report: &DecisionReport) {
        let stats = &report.stats;
        info!(
            decisions = stats.decision_count,
            total_cost_usd = %stats.total_cost,
            avg_cost_per_tick_usd = %stats.avg_cost_per_tick,
            llm = stats.sources.llm,
            rule_engine = stats.sources.rule_engine,
            prompt_tokens = stats.prompt_tokens,
            completion_tokens = stats.completion_tokens,
            "decision window"
        );

        let stuck = report.stuck_agents();
        self.stuck.retain(|agent_id, _| stuck.iter().any(|(id, _)| id == agent_id));
        for (agent_id, streak) in stuck {
            let previous = self.stuck.insert(agent_id, streak.count);
            if previous.is_none_or(|count| count < streak.count) {
                warn!(
                    agent_id = %agent_id,
                    streak = streak.count,
                    rule = streak.rule,
                    "agent stuck in rule engine loop"
                );
            }
        }
    }
}
