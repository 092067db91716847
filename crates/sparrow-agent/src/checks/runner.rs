//! Per-check probe loop.
//!
//! Each running check owns one tokio task. The task probes on a ticker and
//! receives new settings through a `watch` channel. Settings changes are
//! applied between probe cycles: the previous and next target lists are
//! handed to the metric set's `remove_obsolete`, so a cycle never writes into
//! a series that was just pruned.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info};

use sparrow_core::target::{added_targets, Target};

use crate::checks::{Check, CheckKind, MetricSet};
use crate::obs::Collector;

/// What a running check probes, and how often.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckSettings {
    pub targets: Vec<Target>,
    pub interval: Duration,
    pub timeout: Duration,
}

/// Handle to a spawned check task.
pub struct RunningCheck {
    check: Arc<dyn Check>,
    collectors: Vec<Arc<dyn Collector>>,
    settings_tx: watch::Sender<CheckSettings>,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl RunningCheck {
    /// Spawn the probe loop. The first cycle runs immediately.
    pub fn spawn(check: Arc<dyn Check>, settings: CheckSettings) -> Self {
        let collectors = check.metrics().collectors();
        let (settings_tx, settings_rx) = watch::channel(settings);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task_check = Arc::clone(&check);
        let handle = tokio::spawn(async move {
            run_check_loop(task_check, settings_rx, shutdown_rx).await;
        });

        info!(check = %check.kind(), "check started");
        Self {
            check,
            collectors,
            settings_tx,
            shutdown_tx,
            handle,
        }
    }

    pub fn kind(&self) -> CheckKind {
        self.check.kind()
    }

    pub fn metrics(&self) -> Arc<dyn MetricSet> {
        self.check.metrics()
    }

    /// Collectors captured at spawn time (what was registered).
    pub fn collectors(&self) -> &[Arc<dyn Collector>] {
        &self.collectors
    }

    pub fn settings(&self) -> CheckSettings {
        self.settings_tx.borrow().clone()
    }

    /// Hand new settings to the task. Returns false when nothing changed.
    pub fn update(&self, settings: CheckSettings) -> bool {
        self.settings_tx.send_if_modified(|cur| {
            if *cur == settings {
                false
            } else {
                *cur = settings;
                true
            }
        })
    }

    /// Stop the task and wait until it can no longer write metrics.
    pub async fn stop(self) -> Vec<Arc<dyn Collector>> {
        let _ = self.shutdown_tx.send(true);
        self.handle.abort();
        let _ = self.handle.await;
        info!(check = %self.check.kind(), "check stopped");
        self.collectors
    }
}

fn ticker(period: Duration) -> Interval {
    let mut t = interval(period);
    t.set_missed_tick_behavior(MissedTickBehavior::Delay);
    t
}

async fn run_check_loop(
    check: Arc<dyn Check>,
    mut settings_rx: watch::Receiver<CheckSettings>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut current = settings_rx.borrow_and_update().clone();
    let mut tick = ticker(current.interval);

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.changed() => break,
            changed = settings_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let next = settings_rx.borrow_and_update().clone();
                apply_settings(check.as_ref(), &current, &next);
                if next.interval != current.interval {
                    tick = ticker(next.interval);
                }
                current = next;
            }
            _ = tick.tick() => {
                check.run_cycle(&current.targets, current.timeout).await;
            }
        }
    }
    debug!(check = %check.kind(), "probe loop exited");
}

/// Prune series of targets dropped between `current` and `next`.
pub fn apply_settings(check: &dyn Check, current: &CheckSettings, next: &CheckSettings) -> usize {
    let removed = check.metrics().remove_obsolete(&current.targets, &next.targets);
    let added = added_targets(&current.targets, &next.targets).len();
    info!(
        check = %check.kind(),
        targets = next.targets.len(),
        added,
        removed_series = removed,
        "targets reloaded"
    );
    removed
}
