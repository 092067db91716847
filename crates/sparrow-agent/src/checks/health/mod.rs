//! Health check: is the target reachable at all.

mod metrics;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;

use sparrow_core::target::{dedup_targets, Target};

use crate::checks::{Check, CheckKind, MetricSet, Observe, Prober};

pub use metrics::HealthMetrics;

pub struct HealthCheck {
    prober: Arc<dyn Prober>,
    metrics: Arc<HealthMetrics>,
}

impl HealthCheck {
    pub fn new(prober: Arc<dyn Prober>) -> Self {
        Self {
            prober,
            metrics: Arc::new(HealthMetrics::new()),
        }
    }

    pub fn health_metrics(&self) -> Arc<HealthMetrics> {
        Arc::clone(&self.metrics)
    }
}

#[async_trait]
impl Check for HealthCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Health
    }

    fn metrics(&self) -> Arc<dyn MetricSet> {
        self.metrics.clone()
    }

    async fn run_cycle(&self, targets: &[Target], timeout: Duration) {
        let targets = dedup_targets(targets);
        join_all(targets.iter().map(|t| async move {
            let outcome = self.prober.probe(t, timeout).await;
            let up = if outcome.status.is_success() { 1.0 } else { 0.0 };
            tracing::debug!(check = "health", target = %t, status = outcome.status.as_str(), "probe done");
            self.metrics.set(t, up);
        }))
        .await;
    }
}
