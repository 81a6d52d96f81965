//! Shared agent state: the last observed server state and the axum handler state.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::control::ControlPlane;
use crate::types::ServerState;

/// Last-write-wins cell holding the most recent detector verdict.
#[derive(Clone, Debug)]
pub struct SharedServerState(Arc<AtomicU8>);

impl SharedServerState {
    pub fn new(initial: ServerState) -> Self {
        SharedServerState(Arc::new(AtomicU8::new(encode(initial))))
    }

    pub fn get(&self) -> ServerState {
        decode(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, state: ServerState) {
        self.0.store(encode(state), Ordering::Release);
    }
}

impl Default for SharedServerState {
    fn default() -> Self {
        SharedServerState::new(ServerState::Stopped)
    }
}

fn encode(s: ServerState) -> u8 {
    match s {
        ServerState::Running => 0,
        ServerState::Stopped => 1,
        ServerState::Error => 2,
    }
}

fn decode(v: u8) -> ServerState {
    match v {
        0 => ServerState::Running,
        1 => ServerState::Stopped,
        _ => ServerState::Error,
    }
}

#[derive(Clone)]
pub struct AppState {
    pub control: Arc<ControlPlane>,
    // Connected WebSocket observers
    pub client_count: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(control: Arc<ControlPlane>) -> Self {
        AppState {
            control,
            client_count: Arc::new(AtomicUsize::new(0)),
        }
    }
}
