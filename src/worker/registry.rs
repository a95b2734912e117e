//! Path-keyed worker registry
//!
//! Holds at most one active worker per path. Replacement is decided under a
//! single lock; the lock is never held while a worker runs.

use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::info;

use super::periodic::{PeriodicPolicy, Worker, WorkerHandle, WorkerInfo};
use crate::metrics::SinkPair;

/// Owns the handles of all running periodic workers
///
/// Dropping the registry stops every worker it owns.
pub struct WorkerRegistry {
    sinks: SinkPair,
    workers: Mutex<HashMap<String, WorkerHandle>>,
}

impl WorkerRegistry {
    pub fn new(sinks: SinkPair) -> Self {
        Self {
            sinks,
            workers: Mutex::new(HashMap::new()),
        }
    }

    /// Start a worker for `path`, cancelling the one it replaces
    ///
    /// Returns the policy of the replaced worker, if any. Must be called from
    /// within a tokio runtime.
    pub fn upsert(&self, path: &str, policy: PeriodicPolicy) -> Option<PeriodicPolicy> {
        let (worker, replaced) = {
            let mut workers = self.workers.lock();

            let replaced = workers.remove(path).map(|previous| {
                let previous_policy = previous.policy();
                previous.cancel();
                previous_policy
            });

            let (worker, handle) = Worker::new(path, policy, self.sinks.clone());
            workers.insert(path.to_string(), handle);
            (worker, replaced)
        };

        if let Some(previous) = replaced {
            info!(
                path,
                previous_amount = previous.amount,
                previous_interval_secs = previous.interval.as_secs(),
                "Replacing periodic worker"
            );
        }
        worker.spawn();
        replaced
    }

    /// Policy of the worker currently installed for `path`
    pub fn policy(&self, path: &str) -> Option<PeriodicPolicy> {
        self.workers.lock().get(path).map(WorkerHandle::policy)
    }

    /// Number of installed workers
    pub fn len(&self) -> usize {
        self.workers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Describe all installed workers, sorted by path
    pub fn list(&self) -> Vec<WorkerInfo> {
        let mut infos: Vec<WorkerInfo> = self.workers.lock().values().map(WorkerHandle::info).collect();
        infos.sort_by(|a, b| a.path.cmp(&b.path));
        infos
    }
}
