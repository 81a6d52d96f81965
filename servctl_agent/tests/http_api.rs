//! Route wiring: JSON shapes served to the web panel.

mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{config_in, plane, FakeTable, SpyRunner};
use http_body_util::BodyExt;
use servctl_agent::http::router;
use servctl_agent::process::ProcessEntry;
use servctl_agent::state::AppState;
use tower::ServiceExt;

async fn call(app: axum::Router, method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn system_info_is_flat() {
    let dir = tempfile::tempdir().unwrap();
    let control = plane(
        &config_in(dir.path()),
        FakeTable::with(vec![ProcessEntry::new("wine").with_cmdline(["wine", "dedicatedServer.exe"])]),
        SpyRunner::exiting(0, "", ""),
    );
    let app = router(AppState::new(Arc::new(control)));

    let (status, json) = call(app, "GET", "/api/system/info").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cpu_percent"], 12.5);
    assert_eq!(json["memory_used"], 8);
    assert_eq!(json["disk_total"], 200);
    assert_eq!(json["server_status"], "running");
    assert_eq!(json["server_running"], true);
}

#[tokio::test]
async fn status_route_nests_system_info() {
    let dir = tempfile::tempdir().unwrap();
    let control = plane(&config_in(dir.path()), FakeTable::with(vec![]), SpyRunner::exiting(0, "", ""));
    let app = router(AppState::new(Arc::new(control)));

    let (_, json) = call(app, "GET", "/api/status").await;
    assert_eq!(json["system_info"]["memory_percent"], 50.0);
    assert_eq!(json["server_status"], "stopped");
    assert_eq!(json["server_running"], false);
}

#[tokio::test]
async fn command_routes_return_command_results() {
    let dir = tempfile::tempdir().unwrap();
    let runner = SpyRunner::exiting(2, "", "ERROR (no such process)");
    let control = plane(&config_in(dir.path()), FakeTable::with(vec![]), runner.clone());
    let app = router(AppState::new(Arc::new(control)));

    let (status, json) = call(app.clone(), "POST", "/api/server/restart").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Failed to restart server: ERROR (no such process)");

    let (_, json) = call(app.clone(), "POST", "/api/server/update").await;
    assert_eq!(json["success"], false);
    assert!(json.get("output").is_none());
    assert_eq!(runner.call_count(), 1);

    let (status, _) = call_raw(app, "GET", "/api/server/start").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn unknown_server_action_is_not_found_and_runs_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let runner = SpyRunner::exiting(0, "", "");
    let control = plane(&config_in(dir.path()), FakeTable::with(vec![]), runner.clone());
    let app = router(AppState::new(Arc::new(control)));

    let (status, json) = call(app.clone(), "POST", "/api/server/reload").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "unknown action 'reload'");
    assert_eq!(runner.call_count(), 0);

    let (_, json) = call(app, "POST", "/api/server/stop").await;
    assert_eq!(json["message"], "Server stop command sent");
    assert_eq!(*runner.last_args.lock().unwrap(), ["supervisorctl", "stop", "fs25-server"]);
}

#[tokio::test]
async fn logs_route_returns_bundle() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("fs25-server-stdout---supervisor-x.log"), "ready\n").unwrap();
    let control = plane(&config_in(dir.path()), FakeTable::with(vec![]), SpyRunner::exiting(0, "", ""));
    let app = router(AppState::new(Arc::new(control)));

    let (_, json) = call(app, "GET", "/api/logs").await;
    assert_eq!(json, serde_json::json!({ "fs25-server-stdout---supervisor-x.log": "ready\n" }));
}

async fn call_raw(app: axum::Router, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}
