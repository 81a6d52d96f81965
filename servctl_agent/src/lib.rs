//! Status and control agent for a single supervisor-managed server process.
//!
//! A background loop samples host metrics and process liveness and pushes
//! each [`types::StatusUpdate`] to connected observers; [`control::ControlPlane`]
//! answers status/log queries and relays start/stop/restart/update commands
//! to the process supervisor.

pub mod broadcast;
pub mod config;
pub mod control;
pub mod error;
pub mod http;
pub mod logs;
pub mod metrics;
pub mod process;
pub mod state;
pub mod status;
pub mod supervisor;
pub mod types;
pub mod ws;
