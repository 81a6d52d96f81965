//! Relays control intents to the external process supervisor and runs the
//! operator's update script.

use std::io;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::ControlError;
use crate::types::{CommandResult, SupervisorAction};

/// Normalized outcome of one external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Runs an external program to completion and captures its output.
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput>;
}

/// Spawns real OS processes.
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        let out = Command::new(program).args(args).output()?;
        Ok(CommandOutput {
            success: out.status.success(),
            code: out.status.code(),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        })
    }
}

pub struct SupervisorClient {
    runner: Arc<dyn CommandRunner>,
    program: String,
    unit: String,
    update_script: PathBuf,
    shell: String,
}

impl SupervisorClient {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        program: impl Into<String>,
        unit: impl Into<String>,
        update_script: impl Into<PathBuf>,
        shell: impl Into<String>,
    ) -> Self {
        SupervisorClient {
            runner,
            program: program.into(),
            unit: unit.into(),
            update_script: update_script.into(),
            shell: shell.into(),
        }
    }

    pub fn invoke(&self, action: SupervisorAction) -> CommandResult {
        info!(%action, unit = %self.unit, "supervisor command");
        match self.run_action(action) {
            Ok(()) => CommandResult::ok(format!("Server {action} command sent")),
            Err(e) => {
                warn!("{e}");
                CommandResult::failed(e.to_string())
            }
        }
    }

    fn run_action(&self, action: SupervisorAction) -> Result<(), ControlError> {
        let out = self
            .runner
            .run(&self.program, &[action.verb(), self.unit.as_str()])
            .map_err(|source| ControlError::Invocation {
                program: self.program.clone(),
                source,
            })?;
        if out.success {
            Ok(())
        } else {
            Err(ControlError::Rejected {
                action,
                stderr: out.stderr,
            })
        }
    }

    /// Runs the update script if present. Blocks for as long as the script runs.
    pub fn update(&self) -> CommandResult {
        match self.run_update() {
            Ok(stdout) => CommandResult::ok("Server update completed").with_output(stdout),
            Err(e) => {
                warn!("{e}");
                CommandResult::failed(e.to_string())
            }
        }
    }

    fn run_update(&self) -> Result<String, ControlError> {
        if !self.update_script.exists() {
            return Err(ControlError::UpdateScriptMissing(self.update_script.clone()));
        }
        let script = self.update_script.to_string_lossy().into_owned();
        info!(script = %script, "running update script");
        let out = self
            .runner
            .run(&self.shell, &[script.as_str()])
            .map_err(|source| ControlError::Invocation {
                program: self.shell.clone(),
                source,
            })?;
        if out.success {
            Ok(out.stdout)
        } else {
            Err(ControlError::UpdateFailed(out.stderr))
        }
    }
}
