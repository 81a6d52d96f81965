//! WebSocket upgrade and per-connection handler. Pushes every broadcast
//! status update to the client as a JSON text frame.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::AppState;
use crate::types::StatusUpdate;

use std::sync::atomic::Ordering;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    // Subscribe before anything else so no cycle is missed.
    let mut updates = state.control.subscribe();
    let n = state.client_count.fetch_add(1, Ordering::Relaxed) + 1;
    debug!(observers = n, "status observer connected");

    struct ClientGuard(AppState);
    impl Drop for ClientGuard {
        fn drop(&mut self) {
            let n = self.0.client_count.fetch_sub(1, Ordering::Relaxed) - 1;
            debug!(observers = n, "status observer disconnected");
        }
    }
    let _guard = ClientGuard(state.clone());

    let (mut tx, mut rx) = socket.split();

    if let Some(latest) = state.control.latest().await {
        if send_update(&mut tx, &latest).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(update) => {
                    if send_update(&mut tx, &update).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "status observer lagging");
                }
                Err(RecvError::Closed) => break,
            },
            msg = rx.next() => match msg {
                Some(Ok(Message::Text(text))) if text == "get_status" => {
                    let update = state.control.get_status().await;
                    if send_update(&mut tx, &update).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }
}

async fn send_update(
    tx: &mut SplitSink<WebSocket, Message>,
    update: &StatusUpdate,
) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(update) {
        Ok(js) => js,
        Err(e) => {
            warn!("failed to serialize status update: {e}");
            return Ok(());
        }
    };
    tx.send(Message::Text(json)).await
}
