//! Metric primitives and the exposition registry.
//!
//! Check metric sets build their families from the vectors in [`metrics`];
//! the [`Registry`] aggregates them for the `/metrics` handler.

pub mod metrics;
pub mod registry;

pub use metrics::{Collector, CounterVec, GaugeVec, HistogramSnapshot, HistogramVec, MetricKind, Opts};
pub use registry::{same_collector, Registry};
