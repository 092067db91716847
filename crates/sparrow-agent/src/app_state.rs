//! Shared application state for the sparrow agent.
//!
//! The registry is created once by `main` and passed in; nothing here is a
//! process global.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::checks::{CheckManager, CheckStatus};
use crate::obs::Registry;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    registry: Arc<Registry>,
    manager: Arc<CheckManager>,
    draining: AtomicBool,
}

impl AppState {
    pub fn new(registry: Arc<Registry>, manager: Arc<CheckManager>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                registry,
                manager,
                draining: AtomicBool::new(false),
            }),
        }
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.inner.registry)
    }

    pub fn manager(&self) -> Arc<CheckManager> {
        Arc::clone(&self.inner.manager)
    }

    /// Mark draining state.
    pub fn set_draining(&self) {
        self.inner.draining.store(true, Ordering::Relaxed);
    }

    /// Return whether draining is active.
    pub fn is_draining(&self) -> bool {
        self.inner.draining.load(Ordering::Relaxed)
    }

    /// Render every registered metric family.
    pub fn render_metrics(&self) -> String {
        self.inner.registry.gather()
    }

    pub async fn checks(&self) -> Vec<CheckStatus> {
        self.inner.manager.snapshot().await
    }
}
