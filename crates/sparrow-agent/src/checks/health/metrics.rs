use std::sync::Arc;

use crate::checks::{CheckKind, MetricSet, Observe};
use crate::obs::{Collector, GaugeVec, Opts};

/// Metric families of the health check: one gauge per target.
pub struct HealthMetrics {
    up: Arc<GaugeVec>,
}

impl HealthMetrics {
    pub fn new() -> Self {
        Self {
            up: Arc::new(GaugeVec::new(Opts::new(
                CheckKind::Health.metric_name("up"),
                "Health of targets",
                &["target"],
            ))),
        }
    }

    /// Current value for `target`, if it has a series.
    pub fn value(&self, target: &str) -> Option<f64> {
        self.up.get(&[target])
    }

    /// Targets that currently have a series, sorted.
    pub fn targets(&self) -> Vec<String> {
        self.up.label_values().into_iter().filter_map(|mut k| k.pop()).collect()
    }
}

impl Default for HealthMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricSet for HealthMetrics {
    fn collectors(&self) -> Vec<Arc<dyn Collector>> {
        vec![self.up.clone() as Arc<dyn Collector>]
    }

    fn remove_target(&self, target: &str) -> usize {
        usize::from(self.up.remove(&[target]))
    }
}

impl Observe for HealthMetrics {
    /// 1 for up, 0 for down.
    type Sample = f64;

    fn set(&self, target: &str, status: f64) {
        self.up.set(&[target], status);
    }
}
