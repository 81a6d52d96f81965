//! servctl_agent: serves server status and control commands over HTTP/WebSocket.

use std::env;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use servctl_agent::broadcast::{spawn_broadcast_loop, StatusHub};
use servctl_agent::config::{parse_args, AgentConfig};
use servctl_agent::control::ControlPlane;
use servctl_agent::http::router;
use servctl_agent::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = match parse_args(env::args()) {
        Ok(a) => a,
        Err(msg) => {
            eprintln!("{msg}");
            return Ok(());
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AgentConfig::from_env().with_args(&args);
    let control = Arc::new(ControlPlane::from_config(&config, StatusHub::default()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let monitor = spawn_broadcast_loop(
        control.status_source(),
        control.hub().clone(),
        config.poll,
        shutdown_rx,
    );

    let app = router(AppState::new(control));
    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(
        %addr,
        unit = %config.unit,
        binary = %config.server_binary,
        "servctl_agent listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await
        .context("http server failed")?;

    let _ = shutdown_tx.send(true);
    let _ = monitor.await;
    Ok(())
}
