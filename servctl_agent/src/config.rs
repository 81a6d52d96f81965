//! Agent configuration: defaults, overridden by SERVCTL_* environment
//! variables, overridden by command-line flags.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::broadcast::PollPolicy;
use crate::logs::DEFAULT_TAIL_CHARS;

pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    pub bind: IpAddr,
    pub port: u16,
    pub server_binary: String,
    pub unit: String,
    pub supervisor: String,
    pub update_script: PathBuf,
    pub shell: String,
    pub log_patterns: Vec<String>,
    pub log_tail_chars: usize,
    pub poll: PollPolicy,
    pub cpu_window: Duration,
    pub disk_mount: PathBuf,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            server_binary: "dedicatedServer.exe".into(),
            unit: "fs25-server".into(),
            supervisor: "supervisorctl".into(),
            update_script: PathBuf::from("/opt/fs25-server/update_server.sh"),
            shell: "bash".into(),
            log_patterns: vec![
                "/var/log/supervisor/fs25-server-stdout---supervisor-*.log".into(),
                "/var/log/supervisor/fs25-server-stderr---supervisor-*.log".into(),
            ],
            log_tail_chars: DEFAULT_TAIL_CHARS,
            poll: PollPolicy::default(),
            cpu_window: Duration::from_secs(1),
            disk_mount: PathBuf::from("/"),
        }
    }
}

impl AgentConfig {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    /// Applies SERVCTL_* overrides. Unparseable numbers keep the default.
    pub fn with_env<F>(mut self, var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |key: &str| var(key).and_then(|v| v.trim().parse::<u64>().ok());

        if let Some(p) = var("SERVCTL_PORT").and_then(|v| v.trim().parse().ok()) {
            self.port = p;
        }
        if let Some(b) = var("SERVCTL_BIND").and_then(|v| v.trim().parse().ok()) {
            self.bind = b;
        }
        if let Some(v) = non_empty(var("SERVCTL_SERVER_BINARY")) {
            self.server_binary = v;
        }
        if let Some(v) = non_empty(var("SERVCTL_UNIT")) {
            self.unit = v;
        }
        if let Some(v) = non_empty(var("SERVCTL_SUPERVISOR")) {
            self.supervisor = v;
        }
        if let Some(v) = non_empty(var("SERVCTL_UPDATE_SCRIPT")) {
            self.update_script = PathBuf::from(v);
        }
        if let Some(v) = non_empty(var("SERVCTL_SHELL")) {
            self.shell = v;
        }
        if let Some(v) = var("SERVCTL_LOG_PATTERNS") {
            let patterns: Vec<String> = v
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
            if !patterns.is_empty() {
                self.log_patterns = patterns;
            }
        }
        if let Some(n) = parsed("SERVCTL_LOG_TAIL_CHARS") {
            self.log_tail_chars = n as usize;
        }
        if let Some(s) = parsed("SERVCTL_POLL_SECS").filter(|s| *s > 0) {
            self.poll.period = Duration::from_secs(s);
        }
        if let Some(s) = parsed("SERVCTL_BACKOFF_SECS").filter(|s| *s > 0) {
            self.poll.backoff = Duration::from_secs(s);
        }
        if let Some(ms) = parsed("SERVCTL_CPU_WINDOW_MS") {
            self.cpu_window = Duration::from_millis(ms);
        }
        if let Some(v) = non_empty(var("SERVCTL_DISK_MOUNT")) {
            self.disk_mount = PathBuf::from(v);
        }
        self
    }

    pub fn from_env() -> Self {
        AgentConfig::default().with_env(|k| std::env::var(k).ok())
    }

    pub fn with_args(mut self, args: &CliArgs) -> Self {
        if let Some(p) = args.port {
            self.port = p;
        }
        if let Some(b) = args.bind {
            self.bind = b;
        }
        self
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub port: Option<u16>,
    pub bind: Option<IpAddr>,
}

pub fn usage(prog: &str) -> String {
    format!("Usage: {prog} [--port PORT|-p PORT] [--bind ADDR|-b ADDR]")
}

/// `Err` carries the text to print: usage for `--help`, a complaint otherwise.
pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<CliArgs, String> {
    let mut it = args.into_iter();
    let prog = it.next().unwrap_or_else(|| "servctl_agent".into());
    let mut out = CliArgs::default();

    while let Some(arg) = it.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((f, v)) if f.starts_with("--") => (f.to_string(), Some(v.to_string())),
            _ => (arg.clone(), None),
        };
        match flag.as_str() {
            "-h" | "--help" => return Err(usage(&prog)),
            "--port" | "-p" => {
                let v = inline.or_else(|| it.next()).unwrap_or_default();
                out.port = Some(
                    v.parse()
                        .map_err(|_| format!("invalid port '{v}'\n{}", usage(&prog)))?,
                );
            }
            "--bind" | "-b" => {
                let v = inline.or_else(|| it.next()).unwrap_or_default();
                out.bind = Some(
                    v.parse()
                        .map_err(|_| format!("invalid bind address '{v}'\n{}", usage(&prog)))?,
                );
            }
            _ => {
                return Err(format!("Unexpected argument '{arg}'. {}", usage(&prog)));
            }
        }
    }
    Ok(out)
}
