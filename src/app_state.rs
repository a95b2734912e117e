//! Shared application state
//!
//! Built once at startup from the telemetry sinks; cloned into every handler.

use std::sync::Arc;

use crate::api::IncrementEndpoint;
use crate::metrics::{ProbeStats, PullSink, Telemetry};
use crate::worker::WorkerRegistry;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    endpoint: IncrementEndpoint,
    registry: Arc<WorkerRegistry>,
    stats: Arc<ProbeStats>,
    pull: Arc<PullSink>,
}

impl AppState {
    pub fn new(telemetry: &Telemetry) -> Self {
        let sinks = telemetry.sinks();
        let registry = Arc::new(WorkerRegistry::new(sinks.clone()));
        let stats = Arc::new(ProbeStats::new());
        let endpoint = IncrementEndpoint::new(sinks, registry.clone(), stats.clone());

        Self {
            inner: Arc::new(AppStateInner {
                endpoint,
                registry,
                stats,
                pull: telemetry.pull(),
            }),
        }
    }

    pub fn endpoint(&self) -> &IncrementEndpoint {
        &self.inner.endpoint
    }

    pub fn registry(&self) -> &WorkerRegistry {
        &self.inner.registry
    }

    pub fn stats(&self) -> &ProbeStats {
        &self.inner.stats
    }

    pub fn pull(&self) -> &PullSink {
        &self.inner.pull
    }
}
