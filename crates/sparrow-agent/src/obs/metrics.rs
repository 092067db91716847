//! Label-keyed metric vectors for check metric sets.
//!
//! Every vector is backed by a `DashMap` keyed by the label values, in the
//! order of the label names fixed at construction. Writers and the scrape
//! path only ever hold one shard lock at a time. A series is inserted through
//! the entry API with its value already initialized, so a reader never sees
//! a half-built series.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use dashmap::DashMap;

/// Conventional default histogram buckets, in seconds.
pub const DEFAULT_BUCKETS: [f64; 11] = [0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn fmt_float(v: f64) -> String {
    if v.is_nan() {
        "NaN".into()
    } else if v.is_infinite() {
        if v > 0.0 { "+Inf".into() } else { "-Inf".into() }
    } else {
        format!("{v}")
    }
}

/// Metric type as written on the `# TYPE` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

/// An exposable metric family, registered with the [`Registry`](super::Registry).
pub trait Collector: Send + Sync {
    /// Fully qualified metric name (`sparrow_<check>_<signal>`).
    fn name(&self) -> &str;
    fn help(&self) -> &str;
    fn kind(&self) -> MetricKind;
    /// Number of live series.
    fn series_count(&self) -> usize;
    /// Render in Prometheus text exposition format. Families without series
    /// render nothing.
    fn render(&self, out: &mut String);
}

/// Name, help text and label names of a metric family.
#[derive(Debug, Clone)]
pub struct Opts {
    pub name: String,
    pub help: String,
    pub labels: Vec<&'static str>,
}

impl Opts {
    pub fn new(name: impl Into<String>, help: impl Into<String>, labels: &[&'static str]) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            labels: labels.to_vec(),
        }
    }
}

/// Shared storage for all vector kinds.
struct Family<V> {
    opts: Opts,
    map: DashMap<Vec<String>, V>,
}

impl<V> Family<V> {
    fn new(opts: Opts) -> Self {
        Self { opts, map: DashMap::new() }
    }

    /// Build the map key. Arity mismatches are programming errors: they are
    /// logged and the call is dropped.
    fn key(&self, values: &[&str]) -> Option<Vec<String>> {
        if values.len() != self.opts.labels.len() {
            tracing::error!(
                metric = %self.opts.name,
                expected = self.opts.labels.len(),
                got = values.len(),
                "label cardinality mismatch"
            );
            return None;
        }
        Some(values.iter().map(|v| v.to_string()).collect())
    }

    fn with_series<R>(&self, values: &[&str], init: impl FnOnce() -> V, f: impl FnOnce(&V) -> R) -> Option<R> {
        let key = self.key(values)?;
        if let Some(series) = self.map.get(&key) {
            return Some(f(series.value()));
        }
        let series = self.map.entry(key).or_insert_with(init);
        Some(f(series.value()))
    }

    fn read<R>(&self, values: &[&str], f: impl FnOnce(&V) -> R) -> Option<R> {
        let key = self.key(values)?;
        self.map.get(&key).map(|series| f(series.value()))
    }

    fn remove(&self, values: &[&str]) -> bool {
        match self.key(values) {
            Some(key) => self.map.remove(&key).is_some(),
            None => false,
        }
    }

    /// Remove every series whose `label` equals `value`, whatever the other
    /// labels hold.
    fn remove_matching(&self, label: &str, value: &str) -> usize {
        let Some(idx) = self.opts.labels.iter().position(|l| *l == label) else {
            return 0;
        };
        let mut removed = 0;
        self.map.retain(|key, _| {
            let hit = key.get(idx).map(String::as_str) == Some(value);
            if hit {
                removed += 1;
            }
            !hit
        });
        removed
    }

    fn label_values(&self) -> Vec<Vec<String>> {
        let mut out: Vec<Vec<String>> = self.map.iter().map(|r| r.key().clone()).collect();
        out.sort();
        out
    }

    /// Snapshot every series (sorted by labels) so rendering runs without
    /// holding shard locks.
    fn snapshot<T>(&self, f: impl Fn(&V) -> T) -> Vec<(Vec<String>, T)> {
        let mut rows: Vec<(Vec<String>, T)> = self
            .map
            .iter()
            .map(|r| (r.key().clone(), f(r.value())))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows
    }

    fn label_str(&self, values: &[String]) -> String {
        self.opts
            .labels
            .iter()
            .zip(values)
            .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn header(&self, kind: MetricKind, out: &mut String) {
        let _ = writeln!(out, "# HELP {} {}", self.opts.name, self.opts.help);
        let _ = writeln!(out, "# TYPE {} {}", self.opts.name, kind.as_str());
    }
}

/// Gauge vector. Values are `f64` stored as bits.
pub struct GaugeVec {
    inner: Family<AtomicU64>,
}

impl GaugeVec {
    pub fn new(opts: Opts) -> Self {
        Self { inner: Family::new(opts) }
    }

    /// Overwrite the current value, creating the series if absent.
    pub fn set(&self, labels: &[&str], v: f64) {
        let bits = v.to_bits();
        self.inner.with_series(labels, || AtomicU64::new(bits), |g| g.store(bits, Ordering::Relaxed));
    }

    pub fn get(&self, labels: &[&str]) -> Option<f64> {
        self.inner.read(labels, |g| f64::from_bits(g.load(Ordering::Relaxed)))
    }

    pub fn remove(&self, labels: &[&str]) -> bool {
        self.inner.remove(labels)
    }

    pub fn remove_matching(&self, label: &str, value: &str) -> usize {
        self.inner.remove_matching(label, value)
    }

    pub fn label_values(&self) -> Vec<Vec<String>> {
        self.inner.label_values()
    }
}

impl Collector for GaugeVec {
    fn name(&self) -> &str {
        &self.inner.opts.name
    }
    fn help(&self) -> &str {
        &self.inner.opts.help
    }
    fn kind(&self) -> MetricKind {
        MetricKind::Gauge
    }
    fn series_count(&self) -> usize {
        self.inner.map.len()
    }

    fn render(&self, out: &mut String) {
        let rows = self.inner.snapshot(|g| f64::from_bits(g.load(Ordering::Relaxed)));
        if rows.is_empty() {
            return;
        }
        self.inner.header(MetricKind::Gauge, out);
        for (key, val) in rows {
            let _ = writeln!(out, "{}{{{}}} {}", self.inner.opts.name, self.inner.label_str(&key), fmt_float(val));
        }
    }
}

/// Monotonic counter vector.
pub struct CounterVec {
    inner: Family<AtomicU64>,
}

impl CounterVec {
    pub fn new(opts: Opts) -> Self {
        Self { inner: Family::new(opts) }
    }

    /// Increment by 1.
    pub fn inc(&self, labels: &[&str]) {
        self.add(labels, 1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, labels: &[&str], v: u64) {
        self.inner.with_series(labels, || AtomicU64::new(0), |c| c.fetch_add(v, Ordering::Relaxed));
    }

    pub fn get(&self, labels: &[&str]) -> Option<u64> {
        self.inner.read(labels, |c| c.load(Ordering::Relaxed))
    }

    pub fn remove(&self, labels: &[&str]) -> bool {
        self.inner.remove(labels)
    }

    pub fn remove_matching(&self, label: &str, value: &str) -> usize {
        self.inner.remove_matching(label, value)
    }

    pub fn label_values(&self) -> Vec<Vec<String>> {
        self.inner.label_values()
    }
}

impl Collector for CounterVec {
    fn name(&self) -> &str {
        &self.inner.opts.name
    }
    fn help(&self) -> &str {
        &self.inner.opts.help
    }
    fn kind(&self) -> MetricKind {
        MetricKind::Counter
    }
    fn series_count(&self) -> usize {
        self.inner.map.len()
    }

    fn render(&self, out: &mut String) {
        let rows = self.inner.snapshot(|c| c.load(Ordering::Relaxed));
        if rows.is_empty() {
            return;
        }
        self.inner.header(MetricKind::Counter, out);
        for (key, val) in rows {
            let _ = writeln!(out, "{}{{{}}} {}", self.inner.opts.name, self.inner.label_str(&key), val);
        }
    }
}

/// Point-in-time view of one histogram series.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    /// Per-bucket counts, not cumulative, one per configured bound.
    pub buckets: Vec<u64>,
    pub count: u64,
    pub sum: f64,
}

impl HistogramSnapshot {
    fn empty(n: usize) -> Self {
        Self { buckets: vec![0; n], count: 0, sum: 0.0 }
    }
}

/// Histogram vector. Each series sits behind its own mutex so the bucket
/// counts, count and sum are always read as one consistent observation set.
pub struct HistogramVec {
    inner: Family<Mutex<HistogramSnapshot>>,
    bounds: Vec<f64>,
}

impl HistogramVec {
    pub fn new(opts: Opts) -> Self {
        Self {
            inner: Family::new(opts),
            bounds: DEFAULT_BUCKETS.to_vec(),
        }
    }

    /// Fold one value into the distribution, creating the series if absent.
    pub fn observe(&self, labels: &[&str], v: f64) {
        let n = self.bounds.len();
        let slot = self.bounds.iter().position(|b| v <= *b);
        self.inner.with_series(
            labels,
            || Mutex::new(HistogramSnapshot::empty(n)),
            |h| {
                let mut h = h.lock().unwrap_or_else(|e| e.into_inner());
                if let Some(i) = slot {
                    h.buckets[i] += 1;
                }
                h.count += 1;
                h.sum += v;
            },
        );
    }

    pub fn snapshot(&self, labels: &[&str]) -> Option<HistogramSnapshot> {
        self.inner.read(labels, |h| h.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    pub fn remove(&self, labels: &[&str]) -> bool {
        self.inner.remove(labels)
    }

    pub fn remove_matching(&self, label: &str, value: &str) -> usize {
        self.inner.remove_matching(label, value)
    }

    pub fn label_values(&self) -> Vec<Vec<String>> {
        self.inner.label_values()
    }
}

impl Collector for HistogramVec {
    fn name(&self) -> &str {
        &self.inner.opts.name
    }
    fn help(&self) -> &str {
        &self.inner.opts.help
    }
    fn kind(&self) -> MetricKind {
        MetricKind::Histogram
    }
    fn series_count(&self) -> usize {
        self.inner.map.len()
    }

    fn render(&self, out: &mut String) {
        let rows = self.inner.snapshot(|h| h.lock().unwrap_or_else(|e| e.into_inner()).clone());
        if rows.is_empty() {
            return;
        }
        let name = &self.inner.opts.name;
        self.inner.header(MetricKind::Histogram, out);
        for (key, hist) in rows {
            let label_str = self.inner.label_str(&key);
            let prefix = if label_str.is_empty() { String::new() } else { format!("{},", label_str) };

            // Cumulative buckets.
            let mut acc = 0u64;
            for (le, n) in self.bounds.iter().zip(&hist.buckets) {
                acc += n;
                let _ = writeln!(out, "{}_bucket{{{}le=\"{}\"}} {}", name, prefix, fmt_float(*le), acc);
            }
            let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, hist.count);
            let _ = writeln!(out, "{}_sum{{{}}} {}", name, label_str, fmt_float(hist.sum));
            let _ = writeln!(out, "{}_count{{{}}} {}", name, label_str, hist.count);
        }
    }
}
