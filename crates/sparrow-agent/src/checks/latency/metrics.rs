use std::sync::{Arc, PoisonError, RwLock};

use crate::checks::{CheckKind, MetricSet, Observe};
use crate::obs::{Collector, CounterVec, GaugeVec, HistogramSnapshot, HistogramVec, Opts};

/// One latency observation.
#[derive(Debug, Clone, PartialEq)]
pub struct LatencySample {
    /// Result class of the probe, used as the `status` label.
    pub status: String,
    pub seconds: f64,
}

impl LatencySample {
    pub fn new(status: impl Into<String>, seconds: f64) -> Self {
        Self { status: status.into(), seconds }
    }
}

/// Metric families of the latency check.
///
/// - `sparrow_latency_duration_seconds{target,status}`: latest duration
/// - `sparrow_latency_count{target}`: number of observations
/// - `sparrow_latency_duration{target}`: duration distribution
///
/// `set` and `remove_target` hold `guard` across all three families, so a
/// write racing a prune of the same target leaves either all three signals
/// or none of them.
pub struct LatencyMetrics {
    guard: RwLock<()>,
    duration: Arc<GaugeVec>,
    count: Arc<CounterVec>,
    histogram: Arc<HistogramVec>,
}

impl LatencyMetrics {
    pub fn new() -> Self {
        Self {
            guard: RwLock::new(()),
            duration: Arc::new(GaugeVec::new(Opts::new(
                CheckKind::Latency.metric_name("duration_seconds"),
                "Latency with status information of targets",
                &["target", "status"],
            ))),
            count: Arc::new(CounterVec::new(Opts::new(
                CheckKind::Latency.metric_name("count"),
                "Count of latency checks done",
                &["target"],
            ))),
            histogram: Arc::new(HistogramVec::new(Opts::new(
                CheckKind::Latency.metric_name("duration"),
                "Latency of targets in seconds",
                &["target"],
            ))),
        }
    }

    pub fn duration(&self, target: &str, status: &str) -> Option<f64> {
        self.duration.get(&[target, status])
    }

    pub fn count(&self, target: &str) -> Option<u64> {
        self.count.get(&[target])
    }

    pub fn distribution(&self, target: &str) -> Option<HistogramSnapshot> {
        self.histogram.snapshot(&[target])
    }

    /// Status labels that currently have a duration series for `target`.
    pub fn statuses(&self, target: &str) -> Vec<String> {
        self.duration
            .label_values()
            .into_iter()
            .filter(|k| k.first().map(String::as_str) == Some(target))
            .filter_map(|mut k| k.pop())
            .collect()
    }

    /// Targets with a series in any of the three families, sorted.
    pub fn targets(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .duration
            .label_values()
            .into_iter()
            .chain(self.count.label_values())
            .chain(self.histogram.label_values())
            .filter_map(|k| k.into_iter().next())
            .collect();
        out.sort();
        out.dedup();
        out
    }
}

impl Default for LatencyMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricSet for LatencyMetrics {
    fn collectors(&self) -> Vec<Arc<dyn Collector>> {
        vec![
            self.duration.clone() as Arc<dyn Collector>,
            self.count.clone() as Arc<dyn Collector>,
            self.histogram.clone() as Arc<dyn Collector>,
        ]
    }

    /// The duration gauge is swept by target, so every status ever recorded
    /// for it goes too.
    fn remove_target(&self, target: &str) -> usize {
        let _exclusive = self.guard.write().unwrap_or_else(PoisonError::into_inner);
        self.duration.remove_matching("target", target)
            + usize::from(self.histogram.remove(&[target]))
            + usize::from(self.count.remove(&[target]))
    }
}

impl Observe for LatencyMetrics {
    type Sample = LatencySample;

    fn set(&self, target: &str, sample: LatencySample) {
        let _shared = self.guard.read().unwrap_or_else(PoisonError::into_inner);
        self.duration.set(&[target, sample.status.as_str()], sample.seconds);
        self.histogram.observe(&[target], sample.seconds);
        self.count.inc(&[target]);
    }
}
