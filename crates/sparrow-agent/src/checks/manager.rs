//! Starts, reconfigures and stops checks according to the config.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info};

use sparrow_core::error::Result;
use sparrow_core::target::Target;

use crate::checks::{build_check, CheckKind, CheckSettings, MetricSet, Prober, RunningCheck};
use crate::config::ChecksConfig;
use crate::obs::Registry;

/// Public view of one running check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckStatus {
    pub check: CheckKind,
    pub targets: Vec<Target>,
}

pub struct CheckManager {
    registry: Arc<Registry>,
    prober: Arc<dyn Prober>,
    running: Mutex<BTreeMap<CheckKind, RunningCheck>>,
}

impl CheckManager {
    pub fn new(registry: Arc<Registry>, prober: Arc<dyn Prober>) -> Self {
        Self {
            registry,
            prober,
            running: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// Bring the running checks in line with `cfg`.
    ///
    /// Kinds no longer configured are stopped and their collectors
    /// unregistered. Running kinds get their new settings. New kinds get a
    /// fresh metric set whose collectors are registered before the task
    /// starts; a registration conflict aborts with `DuplicateMetric`. A
    /// config that fails validation is rejected before anything changes.
    pub async fn apply(&self, cfg: &ChecksConfig) -> Result<()> {
        cfg.validate()?;
        let desired: BTreeMap<CheckKind, CheckSettings> = cfg.enabled().into_iter().collect();
        let mut running = self.running.lock().await;

        let gone: Vec<CheckKind> = running.keys().filter(|k| !desired.contains_key(*k)).copied().collect();
        for kind in gone {
            if let Some(rc) = running.remove(&kind) {
                self.teardown(rc).await;
            }
        }

        for (kind, settings) in desired {
            if let Some(rc) = running.get(&kind) {
                if rc.update(settings) {
                    info!(check = %kind, "check settings updated");
                }
                continue;
            }

            let check = build_check(kind, Arc::clone(&self.prober));
            let collectors = check.metrics().collectors();
            if let Err(e) = self.registry.register_all(&collectors) {
                error!(check = %kind, error = %e, "metric registration failed");
                return Err(e);
            }
            running.insert(kind, RunningCheck::spawn(check, settings));
        }
        Ok(())
    }

    /// Stop one check. Returns false if it was not running.
    pub async fn stop(&self, kind: CheckKind) -> bool {
        let rc = self.running.lock().await.remove(&kind);
        match rc {
            Some(rc) => {
                self.teardown(rc).await;
                true
            }
            None => false,
        }
    }

    /// Stop every check (agent shutdown).
    pub async fn shutdown(&self) {
        let all = std::mem::take(&mut *self.running.lock().await);
        for (_, rc) in all {
            self.teardown(rc).await;
        }
    }

    async fn teardown(&self, rc: RunningCheck) {
        let kind = rc.kind();
        let collectors = rc.stop().await;
        let n = self.registry.unregister_all(&collectors);
        info!(check = %kind, collectors = n, "check metrics unregistered");
    }

    pub async fn snapshot(&self) -> Vec<CheckStatus> {
        self.running
            .lock()
            .await
            .values()
            .map(|rc| CheckStatus {
                check: rc.kind(),
                targets: rc.settings().targets,
            })
            .collect()
    }

    pub async fn is_running(&self, kind: CheckKind) -> bool {
        self.running.lock().await.contains_key(&kind)
    }
}
