//! Config file watcher.
//!
//! Polls the file on a fixed cadence. When its contents change and the new
//! document parses and validates, the check section is applied to the
//! [`CheckManager`]. An invalid file is logged and the running config stays.
//! The `agent` section is read once at startup; edits to it are logged and
//! otherwise ignored.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::checks::CheckManager;

use super::load_from_str;
use super::AgentSection;

/// Names of `agent` fields that differ between the running and the reloaded
/// section. These only take effect after a restart.
pub fn ignored_agent_changes(running: &AgentSection, next: &AgentSection) -> Vec<&'static str> {
    let mut out = Vec::new();
    if running.listen != next.listen {
        out.push("listen");
    }
    if running.reload_interval_ms != next.reload_interval_ms {
        out.push("reload_interval_ms");
    }
    out
}

pub fn spawn_reloader(
    path: PathBuf,
    period: Duration,
    manager: Arc<CheckManager>,
    shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        run_reload_loop(path, period, manager, shutdown_rx).await;
    })
}

async fn run_reload_loop(
    path: PathBuf,
    period: Duration,
    manager: Arc<CheckManager>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut last = tokio::fs::read_to_string(&path).await.ok();
    let mut agent = last.as_deref().and_then(|s| load_from_str(s).ok()).map(|c| c.agent);
    let mut tick = interval(period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately; the file was just read.
    tick.tick().await;

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.changed() => break,
            _ = tick.tick() => {}
        }

        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(s) => s,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "config read failed, keeping running config");
                continue;
            }
        };
        if last.as_deref() == Some(contents.as_str()) {
            continue;
        }
        last = Some(contents.clone());

        let cfg = match load_from_str(&contents) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path = %path.display(), code = e.code().as_str(), error = %e, "config rejected, keeping running config");
                continue;
            }
        };

        match &agent {
            Some(running) => {
                let ignored = ignored_agent_changes(running, &cfg.agent);
                if !ignored.is_empty() {
                    warn!(path = %path.display(), fields = ?ignored, "agent section changed, restart required to apply");
                }
            }
            None => agent = Some(cfg.agent.clone()),
        }

        match manager.apply(&cfg.checks).await {
            Ok(()) => info!(path = %path.display(), "config reloaded"),
            Err(e) => error!(path = %path.display(), code = e.code().as_str(), error = %e, "config apply failed"),
        }
    }
    debug!("config reloader exited");
}
