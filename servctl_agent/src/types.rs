//! Data types exchanged with the web layer and WebSocket observers.
//! Keep this module minimal and stable: it defines the wire format.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Host utilization figures. Used/total values are whole GiB (floored).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HostMetrics {
    pub cpu_percent: f32,
    pub memory_percent: f32,
    #[serde(rename = "memory_used")]
    pub memory_used_gib: u64,
    #[serde(rename = "memory_total")]
    pub memory_total_gib: u64,
    pub disk_percent: f32,
    #[serde(rename = "disk_used")]
    pub disk_used_gib: u64,
    #[serde(rename = "disk_total")]
    pub disk_total_gib: u64,
}

/// One sampling result: either the figures or the reason sampling failed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum SystemSnapshot {
    Sampled(HostMetrics),
    Failed { error: String },
}

impl SystemSnapshot {
    pub fn failed(reason: impl fmt::Display) -> Self {
        SystemSnapshot::Failed {
            error: reason.to_string(),
        }
    }

    pub fn metrics(&self) -> Option<&HostMetrics> {
        match self {
            SystemSnapshot::Sampled(m) => Some(m),
            SystemSnapshot::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            SystemSnapshot::Sampled(_) => None,
            SystemSnapshot::Failed { error } => Some(error),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServerState {
    Running,
    Stopped,
    Error,
}

impl ServerState {
    pub fn as_str(self) -> &'static str {
        match self {
            ServerState::Running => "running",
            ServerState::Stopped => "stopped",
            ServerState::Error => "error",
        }
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload pushed to observers on every poll cycle.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StatusUpdate {
    pub system_info: SystemSnapshot,
    pub server_status: ServerState,
    pub server_running: bool,
}

/// Flat shape served by `GET /api/system/info`.
#[derive(Debug, Serialize, Clone)]
pub struct SystemInfoResponse {
    #[serde(flatten)]
    pub system_info: SystemSnapshot,
    pub server_status: ServerState,
    pub server_running: bool,
}

impl From<StatusUpdate> for SystemInfoResponse {
    fn from(u: StatusUpdate) -> Self {
        SystemInfoResponse {
            system_info: u.system_info,
            server_status: u.server_status,
            server_running: u.server_running,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl CommandResult {
    pub fn ok(message: impl Into<String>) -> Self {
        CommandResult {
            success: true,
            message: message.into(),
            output: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        CommandResult {
            success: false,
            message: message.into(),
            output: None,
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }
}

/// Log identifier -> trailing text of that file.
pub type LogBundle = BTreeMap<String, String>;

/// Actions the supervisor accepts for the managed unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorAction {
    Start,
    Stop,
    Restart,
}

impl SupervisorAction {
    pub fn verb(self) -> &'static str {
        match self {
            SupervisorAction::Start => "start",
            SupervisorAction::Stop => "stop",
            SupervisorAction::Restart => "restart",
        }
    }
}

impl fmt::Display for SupervisorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

impl FromStr for SupervisorAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(SupervisorAction::Start),
            "stop" => Ok(SupervisorAction::Stop),
            "restart" => Ok(SupervisorAction::Restart),
            other => Err(format!("unknown action '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_branches_serialize_exclusively() {
        let ok = SystemSnapshot::Sampled(HostMetrics {
            cpu_percent: 12.5,
            memory_percent: 40.0,
            memory_used_gib: 6,
            memory_total_gib: 15,
            disk_percent: 71.3,
            disk_used_gib: 120,
            disk_total_gib: 200,
        });
        let v = serde_json::to_value(&ok).unwrap();
        assert_eq!(v["memory_used"], 6);
        assert_eq!(v["disk_total"], 200);
        assert!(v.get("error").is_none());

        let err = SystemSnapshot::failed("no filesystem mounted at /");
        let v = serde_json::to_value(&err).unwrap();
        assert_eq!(v, serde_json::json!({ "error": "no filesystem mounted at /" }));
    }

    #[test]
    fn system_info_response_is_flat() {
        let resp = SystemInfoResponse::from(StatusUpdate {
            system_info: SystemSnapshot::failed("boom"),
            server_status: ServerState::Stopped,
            server_running: false,
        });
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            v,
            serde_json::json!({ "error": "boom", "server_status": "stopped", "server_running": false })
        );
    }

    #[test]
    fn command_result_omits_missing_output() {
        let v = serde_json::to_value(CommandResult::ok("Server start command sent")).unwrap();
        assert!(v.get("output").is_none());
        let v = serde_json::to_value(CommandResult::ok("done").with_output("log")).unwrap();
        assert_eq!(v["output"], "log");
    }

    #[test]
    fn action_parses_lowercase_verbs_only() {
        assert_eq!("restart".parse::<SupervisorAction>(), Ok(SupervisorAction::Restart));
        assert!("Start".parse::<SupervisorAction>().is_err());
        assert_eq!(SupervisorAction::Stop.to_string(), "stop");
    }
}
