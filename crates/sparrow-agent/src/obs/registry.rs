//! Process-wide collection point for check metric families.
//!
//! One `Registry` is created at agent startup and handed to every component
//! that needs it. It only holds shared references for enumeration; the
//! metric sets own their collectors and are the only writers.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use sparrow_core::error::{Result, SparrowError};

use super::metrics::{Collector, MetricKind};

/// Identity of two collector handles (same underlying object).
pub fn same_collector(a: &Arc<dyn Collector>, b: &Arc<dyn Collector>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// Every sample name a collector writes to the exposition. A histogram
/// also owns its `_bucket`, `_sum` and `_count` lines.
fn exposed_names(collector: &dyn Collector) -> Vec<String> {
    let name = collector.name();
    match collector.kind() {
        MetricKind::Histogram => vec![
            name.to_string(),
            format!("{name}_bucket"),
            format!("{name}_sum"),
            format!("{name}_count"),
        ],
        MetricKind::Counter | MetricKind::Gauge => vec![name.to_string()],
    }
}

#[derive(Default)]
pub struct Registry {
    collectors: DashMap<String, Arc<dyn Collector>>,
    /// Exposed sample name -> owning family name.
    exposed: DashMap<String, String>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            collectors: DashMap::new(),
            exposed: DashMap::new(),
        }
    }

    /// Register one collector. Fails if any sample name it exposes is
    /// already exposed by another collector.
    pub fn register(&self, collector: Arc<dyn Collector>) -> Result<()> {
        let family = collector.name().to_string();
        let mut claimed: Vec<String> = Vec::new();

        for name in exposed_names(collector.as_ref()) {
            let clash = match self.exposed.entry(name) {
                Entry::Occupied(e) => Some(e.key().clone()),
                Entry::Vacant(e) => {
                    claimed.push(e.key().clone());
                    e.insert(family.clone());
                    None
                }
            };
            if let Some(name) = clash {
                self.release(&claimed, &family);
                return Err(SparrowError::DuplicateMetric(name));
            }
        }

        tracing::debug!(metric = %family, "collector registered");
        self.collectors.insert(family, collector);
        Ok(())
    }

    fn release(&self, names: &[String], family: &str) {
        for name in names {
            self.exposed.remove_if(name, |_, owner| owner == family);
        }
    }

    /// Register a batch. On failure the collectors added by this call are
    /// removed again, so a rejected metric set leaves no trace.
    pub fn register_all(&self, collectors: &[Arc<dyn Collector>]) -> Result<()> {
        for (i, c) in collectors.iter().enumerate() {
            if let Err(e) = self.register(Arc::clone(c)) {
                for done in &collectors[..i] {
                    self.unregister(done);
                }
                return Err(e);
            }
        }
        Ok(())
    }

    /// Remove a collector. Only the exact object that was registered is
    /// removed; a different collector with the same name is left alone.
    pub fn unregister(&self, collector: &Arc<dyn Collector>) -> bool {
        let removed = self
            .collectors
            .remove_if(collector.name(), |_, stored| same_collector(stored, collector))
            .is_some();
        if removed {
            self.release(&exposed_names(collector.as_ref()), collector.name());
            tracing::debug!(metric = %collector.name(), "collector unregistered");
        }
        removed
    }

    pub fn unregister_all(&self, collectors: &[Arc<dyn Collector>]) -> usize {
        collectors.iter().filter(|c| self.unregister(c)).count()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.collectors.contains_key(name)
    }

    /// Registered metric names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collectors.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Render every registered family in Prometheus text exposition format,
    /// sorted by metric name.
    pub fn gather(&self) -> String {
        let mut collectors: Vec<Arc<dyn Collector>> =
            self.collectors.iter().map(|e| Arc::clone(e.value())).collect();
        collectors.sort_by(|a, b| a.name().cmp(b.name()));

        let mut out = String::new();
        for c in collectors {
            c.render(&mut out);
        }
        out
    }

    /// Drop every registration (agent teardown).
    pub fn clear(&self) {
        self.collectors.clear();
        self.exposed.clear();
    }
}
