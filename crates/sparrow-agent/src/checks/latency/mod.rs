//! Latency check: how long it takes to reach a target, and with what result.

mod metrics;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;

use sparrow_core::target::{dedup_targets, Target};

use crate::checks::{Check, CheckKind, MetricSet, Observe, Prober};

pub use metrics::{LatencyMetrics, LatencySample};

pub struct LatencyCheck {
    prober: Arc<dyn Prober>,
    metrics: Arc<LatencyMetrics>,
}

impl LatencyCheck {
    pub fn new(prober: Arc<dyn Prober>) -> Self {
        Self {
            prober,
            metrics: Arc::new(LatencyMetrics::new()),
        }
    }

    pub fn latency_metrics(&self) -> Arc<LatencyMetrics> {
        Arc::clone(&self.metrics)
    }
}

#[async_trait]
impl Check for LatencyCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Latency
    }

    fn metrics(&self) -> Arc<dyn MetricSet> {
        self.metrics.clone()
    }

    async fn run_cycle(&self, targets: &[Target], timeout: Duration) {
        let targets = dedup_targets(targets);
        join_all(targets.iter().map(|t| async move {
            let outcome = self.prober.probe(t, timeout).await;
            let seconds = outcome.elapsed.as_secs_f64();
            tracing::debug!(check = "latency", target = %t, status = outcome.status.as_str(), seconds, "probe done");
            self.metrics.set(t, LatencySample::new(outcome.status.as_str(), seconds));
        }))
        .await;
    }
}
