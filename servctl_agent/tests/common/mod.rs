//! Fakes for the OS-facing collaborators.
#![allow(dead_code)]

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use servctl_agent::broadcast::StatusHub;
use servctl_agent::config::AgentConfig;
use servctl_agent::control::{Collaborators, ControlPlane};
use servctl_agent::error::ControlError;
use servctl_agent::metrics::Sampler;
use servctl_agent::process::{ProcessEntry, ProcessTable};
use servctl_agent::supervisor::{CommandOutput, CommandRunner};
use servctl_agent::types::{HostMetrics, SystemSnapshot};

pub struct FixedSampler;

impl Sampler for FixedSampler {
    fn sample(&self) -> SystemSnapshot {
        SystemSnapshot::Sampled(HostMetrics {
            cpu_percent: 12.5,
            memory_percent: 50.0,
            memory_used_gib: 8,
            memory_total_gib: 16,
            disk_percent: 25.0,
            disk_used_gib: 50,
            disk_total_gib: 200,
        })
    }
}

#[derive(Default)]
pub struct FakeTable(pub Mutex<Vec<ProcessEntry>>);

impl FakeTable {
    pub fn with(procs: Vec<ProcessEntry>) -> Arc<Self> {
        Arc::new(FakeTable(Mutex::new(procs)))
    }

    pub fn set(&self, procs: Vec<ProcessEntry>) {
        *self.0.lock().unwrap() = procs;
    }
}

impl ProcessTable for FakeTable {
    fn list(&self) -> Result<Vec<ProcessEntry>, ControlError> {
        Ok(self.0.lock().unwrap().clone())
    }
}

/// Counts invocations and answers every one with the same exit.
pub struct SpyRunner {
    pub calls: AtomicUsize,
    pub last_args: Mutex<Vec<String>>,
    code: i32,
    stdout: String,
    stderr: String,
}

impl SpyRunner {
    pub fn exiting(code: i32, stdout: &str, stderr: &str) -> Arc<Self> {
        Arc::new(SpyRunner {
            calls: AtomicUsize::new(0),
            last_args: Mutex::new(Vec::new()),
            code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CommandRunner for SpyRunner {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut last = self.last_args.lock().unwrap();
        *last = std::iter::once(program)
            .chain(args.iter().copied())
            .map(String::from)
            .collect();
        Ok(CommandOutput {
            success: self.code == 0,
            code: Some(self.code),
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
        })
    }
}

pub fn config_in(dir: &Path) -> AgentConfig {
    AgentConfig {
        update_script: dir.join("update_server.sh"),
        log_patterns: vec![
            format!("{}/fs25-server-stdout---supervisor-*.log", dir.display()),
            format!("{}/fs25-server-stderr---supervisor-*.log", dir.display()),
        ],
        ..AgentConfig::default()
    }
}

pub fn plane(
    config: &AgentConfig,
    table: Arc<FakeTable>,
    runner: Arc<SpyRunner>,
) -> ControlPlane {
    ControlPlane::new(
        config,
        Collaborators {
            sampler: Arc::new(FixedSampler),
            processes: table,
            runner,
        },
        StatusHub::default(),
    )
}
