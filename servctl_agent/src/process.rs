//! Managed-server liveness detection by scanning the process table.

use std::sync::{Arc, Mutex};

use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};
use tracing::{debug, warn};

use crate::error::ControlError;
use crate::state::SharedServerState;
use crate::types::ServerState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub name: String,
    pub cmdline: Vec<String>,
}

impl ProcessEntry {
    pub fn new(name: impl Into<String>) -> Self {
        ProcessEntry {
            name: name.into(),
            cmdline: Vec::new(),
        }
    }

    pub fn with_cmdline<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cmdline = args.into_iter().map(Into::into).collect();
        self
    }

    /// Case-sensitive substring match on the name or any argument. Coarse on
    /// purpose: unrelated processes mentioning the binary also match.
    pub fn mentions(&self, binary: &str) -> bool {
        self.name.contains(binary) || self.cmdline.iter().any(|a| a.contains(binary))
    }
}

/// Enumerates live OS processes.
pub trait ProcessTable: Send + Sync {
    fn list(&self) -> Result<Vec<ProcessEntry>, ControlError>;
}

/// Process table backed by a persistent sysinfo `System`.
pub struct SysinfoProcessTable {
    sys: Mutex<System>,
}

impl SysinfoProcessTable {
    pub fn new() -> Self {
        SysinfoProcessTable {
            sys: Mutex::new(System::new()),
        }
    }
}

impl Default for SysinfoProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTable for SysinfoProcessTable {
    fn list(&self) -> Result<Vec<ProcessEntry>, ControlError> {
        let mut sys = self
            .sys
            .lock()
            .map_err(|_| ControlError::Detection("process table handle poisoned".into()))?;
        let refreshed = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            sys.refresh_processes_specifics(
                ProcessesToUpdate::All,
                true,
                ProcessRefreshKind::nothing().with_cmd(UpdateKind::Always),
            );
        }));
        if refreshed.is_err() {
            return Err(ControlError::Detection("sysinfo process refresh panicked".into()));
        }
        // We are a process too; an empty table means enumeration failed.
        if sys.processes().is_empty() {
            return Err(ControlError::Detection("process table is empty".into()));
        }
        Ok(sys
            .processes()
            .values()
            .map(|p| ProcessEntry {
                name: p.name().to_string_lossy().into_owned(),
                cmdline: p
                    .cmd()
                    .iter()
                    .map(|a| a.to_string_lossy().into_owned())
                    .collect(),
            })
            .collect())
    }
}

/// Decides whether the managed server is alive and records the verdict.
#[derive(Clone)]
pub struct ProcessDetector {
    table: Arc<dyn ProcessTable>,
    binary: String,
    state: SharedServerState,
}

impl ProcessDetector {
    pub fn new(
        table: Arc<dyn ProcessTable>,
        binary: impl Into<String>,
        state: SharedServerState,
    ) -> Self {
        ProcessDetector {
            table,
            binary: binary.into(),
            state,
        }
    }

    /// Rescans and records the verdict. The returned value is this scan's
    /// own result, not a re-read of the shared cell.
    pub fn scan(&self) -> ServerState {
        let state = match self.table.list() {
            Ok(procs) if procs.iter().any(|p| p.mentions(&self.binary)) => ServerState::Running,
            Ok(_) => ServerState::Stopped,
            Err(e) => {
                warn!("{e}");
                ServerState::Error
            }
        };
        debug!(binary = %self.binary, %state, "process scan complete");
        self.state.set(state);
        state
    }

    pub fn is_server_running(&self) -> bool {
        self.scan() == ServerState::Running
    }

    pub fn state(&self) -> &SharedServerState {
        &self.state
    }
}
