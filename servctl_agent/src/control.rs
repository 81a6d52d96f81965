//! Query and command surface consumed by the web layer. Every operation
//! returns a value; blocking work runs on tokio's blocking pool.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::warn;

use crate::broadcast::StatusHub;
use crate::config::AgentConfig;
use crate::error::ControlError;
use crate::logs::collect_logs;
use crate::metrics::{Sampler, SystemSampler};
use crate::process::{ProcessDetector, ProcessTable, SysinfoProcessTable};
use crate::state::SharedServerState;
use crate::status::{StatusAggregator, StatusSource};
use crate::supervisor::{CommandRunner, SupervisorClient, SystemCommandRunner};
use crate::types::{
    CommandResult, LogBundle, ServerState, StatusUpdate, SupervisorAction, SystemSnapshot,
};

pub struct ControlPlane {
    aggregator: Arc<StatusAggregator>,
    supervisor: Arc<SupervisorClient>,
    hub: StatusHub,
    log_patterns: Arc<Vec<String>>,
    log_tail_chars: usize,
}

/// Collaborators the facade is built from; swap any of them for fakes in tests.
pub struct Collaborators {
    pub sampler: Arc<dyn Sampler>,
    pub processes: Arc<dyn ProcessTable>,
    pub runner: Arc<dyn CommandRunner>,
}

impl Collaborators {
    pub fn system(cpu_window: Duration, disk_mount: &std::path::Path) -> Self {
        Collaborators {
            sampler: Arc::new(SystemSampler::new(cpu_window, disk_mount)),
            processes: Arc::new(SysinfoProcessTable::new()),
            runner: Arc::new(SystemCommandRunner),
        }
    }
}

impl ControlPlane {
    pub fn new(config: &AgentConfig, parts: Collaborators, hub: StatusHub) -> Self {
        let detector = ProcessDetector::new(
            parts.processes,
            config.server_binary.clone(),
            SharedServerState::default(),
        );
        ControlPlane {
            aggregator: Arc::new(StatusAggregator::new(parts.sampler, detector)),
            supervisor: Arc::new(SupervisorClient::new(
                parts.runner,
                config.supervisor.clone(),
                config.unit.clone(),
                config.update_script.clone(),
                config.shell.clone(),
            )),
            hub,
            log_patterns: Arc::new(config.log_patterns.clone()),
            log_tail_chars: config.log_tail_chars,
        }
    }

    pub fn from_config(config: &AgentConfig, hub: StatusHub) -> Self {
        let parts = Collaborators::system(config.cpu_window, &config.disk_mount);
        ControlPlane::new(config, parts, hub)
    }

    /// Status source for the broadcast loop.
    pub fn status_source(&self) -> Arc<dyn StatusSource> {
        self.aggregator.clone()
    }

    pub fn hub(&self) -> &StatusHub {
        &self.hub
    }

    pub fn last_known_state(&self) -> ServerState {
        self.aggregator.last_known_state()
    }

    /// Fresh sample plus an explicit process rescan.
    pub async fn get_status(&self) -> StatusUpdate {
        let agg = Arc::clone(&self.aggregator);
        match run_blocking(move || agg.current_status()).await {
            Ok(update) => update,
            Err(e) => {
                warn!("status query failed: {e}");
                let server_status = self.last_known_state();
                StatusUpdate {
                    system_info: SystemSnapshot::failed(&e),
                    server_status,
                    server_running: server_status == ServerState::Running,
                }
            }
        }
    }

    pub async fn command(&self, action: SupervisorAction) -> CommandResult {
        let sup = Arc::clone(&self.supervisor);
        run_blocking(move || sup.invoke(action))
            .await
            .unwrap_or_else(|e| CommandResult::failed(e.to_string()))
    }

    pub async fn start(&self) -> CommandResult {
        self.command(SupervisorAction::Start).await
    }

    pub async fn stop(&self) -> CommandResult {
        self.command(SupervisorAction::Stop).await
    }

    pub async fn restart(&self) -> CommandResult {
        self.command(SupervisorAction::Restart).await
    }

    /// No timeout: a hanging update script hangs this call.
    pub async fn update(&self) -> CommandResult {
        let sup = Arc::clone(&self.supervisor);
        run_blocking(move || sup.update())
            .await
            .unwrap_or_else(|e| CommandResult::failed(e.to_string()))
    }

    pub async fn get_logs(&self) -> LogBundle {
        let patterns = Arc::clone(&self.log_patterns);
        let tail_chars = self.log_tail_chars;
        match run_blocking(move || collect_logs(patterns.as_slice(), tail_chars)).await {
            Ok(bundle) => bundle,
            Err(e) => LogBundle::from([("error".to_string(), e.to_string())]),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusUpdate> {
        self.hub.subscribe()
    }

    pub async fn latest(&self) -> Option<StatusUpdate> {
        self.hub.latest().await
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, ControlError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await?)
}
