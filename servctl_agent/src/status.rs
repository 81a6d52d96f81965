//! Composes host metrics and process liveness into one status update.

use std::sync::Arc;

use crate::metrics::Sampler;
use crate::process::ProcessDetector;
use crate::types::{ServerState, StatusUpdate};

/// Anything the broadcast loop can poll for a fresh status.
pub trait StatusSource: Send + Sync {
    fn current_status(&self) -> StatusUpdate;
}

pub struct StatusAggregator {
    sampler: Arc<dyn Sampler>,
    detector: ProcessDetector,
}

impl StatusAggregator {
    pub fn new(sampler: Arc<dyn Sampler>, detector: ProcessDetector) -> Self {
        StatusAggregator { sampler, detector }
    }

    /// State recorded by the most recent scan; does not rescan.
    pub fn last_known_state(&self) -> ServerState {
        self.detector.state().get()
    }
}

impl StatusSource for StatusAggregator {
    fn current_status(&self) -> StatusUpdate {
        let system_info = self.sampler.sample();
        // Build from this scan's verdict; the shared cell may already hold
        // a concurrent caller's result.
        let server_status = self.detector.scan();
        StatusUpdate {
            system_info,
            server_status,
            server_running: server_status == ServerState::Running,
        }
    }
}
