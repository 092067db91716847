//! Checks and their metric sets.
//!
//! Every check kind owns one metric set implementing [`MetricSet`] (the part
//! the runner and registry see) and [`Observe`] (the typed `set` its probe
//! loop writes through). The concrete kind is picked once, at registration
//! time, by [`build_check`].

pub mod health;
pub mod latency;
pub mod manager;
pub mod probe;
pub mod runner;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use sparrow_core::target::{obsolete_targets, Target};

use crate::obs::Collector;

pub use health::{HealthCheck, HealthMetrics};
pub use latency::{LatencyCheck, LatencyMetrics, LatencySample};
pub use manager::{CheckManager, CheckStatus};
pub use probe::{ProbeOutcome, ProbeStatus, Prober, TcpProber};
pub use runner::{CheckSettings, RunningCheck};

/// Metric name prefix shared by every check.
pub const NAMESPACE: &str = "sparrow";

/// Built-in check kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckKind {
    Health,
    Latency,
}

impl CheckKind {
    pub const ALL: [CheckKind; 2] = [CheckKind::Health, CheckKind::Latency];

    pub fn as_str(self) -> &'static str {
        match self {
            CheckKind::Health => "health",
            CheckKind::Latency => "latency",
        }
    }

    /// `sparrow_<kind>_<signal>`.
    pub fn metric_name(self, signal: &str) -> String {
        format!("{}_{}_{}", NAMESPACE, self.as_str(), signal)
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The part of a check's metrics that the runner and registry manage without
/// knowing the check kind.
pub trait MetricSet: Send + Sync {
    /// Every family owned by this set. Returns the same objects on every call.
    fn collectors(&self) -> Vec<Arc<dyn Collector>>;

    /// Delete every series labelled with `target`, in every family and for
    /// every value of any other label. Returns the number of series removed.
    fn remove_target(&self, target: &str) -> usize;

    /// Delete the series of every target in `old` that is absent from `new`.
    /// Unknown targets are ignored. Returns the number of series removed.
    fn remove_obsolete(&self, old: &[Target], new: &[Target]) -> usize {
        obsolete_targets(old, new)
            .into_iter()
            .map(|t| self.remove_target(t))
            .sum()
    }
}

/// Typed write path of a metric set.
pub trait Observe: MetricSet {
    type Sample;

    /// Record one observation for `target`, creating its series if absent.
    fn set(&self, target: &str, sample: Self::Sample);
}

/// A probe type run against a list of targets.
#[async_trait]
pub trait Check: Send + Sync {
    fn kind(&self) -> CheckKind;

    fn metrics(&self) -> Arc<dyn MetricSet>;

    /// Probe every target once (concurrently) and record the results.
    async fn run_cycle(&self, targets: &[Target], timeout: Duration);
}

/// Create a check of the given kind with a fresh metric set.
pub fn build_check(kind: CheckKind, prober: Arc<dyn Prober>) -> Arc<dyn Check> {
    match kind {
        CheckKind::Health => Arc::new(HealthCheck::new(prober)),
        CheckKind::Latency => Arc::new(LatencyCheck::new(prober)),
    }
}
