//! sparrow agent
//!
//! - Loads `sparrow.yaml` (or the path given as first argument)
//! - Starts one probe loop per configured check, metrics registered up front
//! - Watches the config file and prunes series of removed targets
//! - Serves /healthz, /readyz, /metrics and /v1/checks

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};

use sparrow_agent::checks::{CheckManager, TcpProber};
use sparrow_agent::obs::Registry;
use sparrow_agent::{app_state, config, router};
use sparrow_core::error::{Result, SparrowError};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(e) = run().await {
        tracing::error!(code = e.code().as_str(), error = %e, "sparrow-agent failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "sparrow.yaml".to_string());
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg
        .agent
        .listen
        .parse()
        .map_err(|e| SparrowError::BadConfig(format!("agent.listen: {e}")))?;

    let registry = Arc::new(Registry::new());
    let manager = Arc::new(CheckManager::new(Arc::clone(&registry), Arc::new(TcpProber)));

    // Colliding metric names are fatal here, before anything is served.
    manager.apply(&cfg.checks).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reloader = config::reload::spawn_reloader(
        PathBuf::from(&path),
        cfg.agent.reload_interval(),
        Arc::clone(&manager),
        shutdown_rx,
    );

    let state = app_state::AppState::new(Arc::clone(&registry), Arc::clone(&manager));
    let app = router::build_router(state.clone());

    tracing::info!(%listen, "sparrow-agent starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| SparrowError::Io(format!("bind {listen} failed: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .map_err(|e| SparrowError::Io(format!("server failed: {e}")))?;

    let _ = shutdown_tx.send(true);
    let _ = reloader.await;
    manager.shutdown().await;
    registry.clear();
    tracing::info!("sparrow-agent stopped");
    Ok(())
}

async fn shutdown_signal(state: app_state::AppState) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "ctrl-c handler failed");
        std::future::pending::<()>().await;
    }
    state.set_draining();
    tracing::info!("shutdown requested, draining");
}
