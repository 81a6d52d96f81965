//! JSON API routes over the control facade.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::state::AppState;
use crate::types::{CommandResult, LogBundle, StatusUpdate, SupervisorAction, SystemInfoResponse};
use crate::ws::ws_handler;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/system/info", get(system_info))
        .route("/api/status", get(status))
        .route("/api/server/update", post(update_server))
        .route("/api/server/:action", post(server_command))
        .route("/api/logs", get(logs))
        .route("/ws", get(ws_handler))
        .with_state(state)
}

async fn system_info(State(state): State<AppState>) -> Json<SystemInfoResponse> {
    Json(state.control.get_status().await.into())
}

async fn status(State(state): State<AppState>) -> Json<StatusUpdate> {
    Json(state.control.get_status().await)
}

// start, stop and restart; anything else is not a supervisor action.
async fn server_command(
    State(state): State<AppState>,
    Path(action): Path<String>,
) -> Result<Json<CommandResult>, (StatusCode, Json<CommandResult>)> {
    let action: SupervisorAction = action
        .parse()
        .map_err(|e: String| (StatusCode::NOT_FOUND, Json(CommandResult::failed(e))))?;
    Ok(Json(state.control.command(action).await))
}

async fn update_server(State(state): State<AppState>) -> Json<CommandResult> {
    Json(state.control.update().await)
}

async fn logs(State(state): State<AppState>) -> Json<LogBundle> {
    Json(state.control.get_logs().await)
}
