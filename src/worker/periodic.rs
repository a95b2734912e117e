//! Periodic emission worker
//!
//! A worker emits once immediately and then once per interval until its
//! cancel signal fires. The task is detached; the only reference the owner
//! keeps is the [`WorkerHandle`] used to cancel it.

use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::metrics::SinkPair;

/// Smallest periodic increment a request can ask for
pub const DEFAULT_INCREMENT_BY: u64 = 100;
/// Shortest periodic interval a request can ask for, in seconds
pub const DEFAULT_INTERVAL_SECS: u64 = 10;

/// Effective amount and interval of a periodic worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodicPolicy {
    pub amount: u64,
    pub interval: Duration,
}

impl PeriodicPolicy {
    /// Apply the floor defaults to requested values
    ///
    /// Values below the floor, negatives included, are raised to it, so a
    /// caller can never get a smaller or faster emission than the defaults.
    pub fn from_request(increment_by: i64, interval_secs: i64) -> Self {
        Self {
            amount: floor_at(increment_by, DEFAULT_INCREMENT_BY),
            interval: Duration::from_secs(floor_at(interval_secs, DEFAULT_INTERVAL_SECS)),
        }
    }
}

fn floor_at(requested: i64, floor: u64) -> u64 {
    u64::try_from(requested).map_or(floor, |v| v.max(floor))
}

/// Serializable description of an active worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerInfo {
    pub path: String,
    pub amount: u64,
    pub interval_secs: u64,
    pub started_at_unix_ms: u64,
}

/// Owner side of a worker
///
/// Cancelling consumes the handle, so the signal fires at most once.
/// Dropping the handle also stops the worker.
#[derive(Debug)]
pub struct WorkerHandle {
    path: Arc<str>,
    policy: PeriodicPolicy,
    started_at: SystemTime,
    cancel_tx: broadcast::Sender<()>,
}

impl WorkerHandle {
    pub fn policy(&self) -> PeriodicPolicy {
        self.policy
    }

    pub fn info(&self) -> WorkerInfo {
        let started_at_unix_ms = self
            .started_at
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        WorkerInfo {
            path: self.path.to_string(),
            amount: self.policy.amount,
            interval_secs: self.policy.interval.as_secs(),
            started_at_unix_ms,
        }
    }

    /// Fire the cancel signal
    pub fn cancel(self) {
        let _ = self.cancel_tx.send(());
        debug!(path = %self.path, "Worker cancel signalled");
    }
}

/// Task side of a worker
pub struct Worker {
    path: Arc<str>,
    policy: PeriodicPolicy,
    sinks: SinkPair,
    cancel_rx: broadcast::Receiver<()>,
}

impl Worker {
    /// Build a worker and its handle without starting it
    pub fn new(path: &str, policy: PeriodicPolicy, sinks: SinkPair) -> (Self, WorkerHandle) {
        let path: Arc<str> = Arc::from(path);
        let (cancel_tx, cancel_rx) = broadcast::channel(1);

        let worker = Self {
            path: path.clone(),
            policy,
            sinks,
            cancel_rx,
        };
        let handle = WorkerHandle {
            path,
            policy,
            started_at: SystemTime::now(),
            cancel_tx,
        };
        (worker, handle)
    }

    /// Start the worker as a detached task
    pub fn spawn(self) {
        tokio::spawn(self.run());
    }

    /// Emit immediately, then every interval, until cancelled
    pub async fn run(mut self) {
        info!(
            path = %self.path,
            amount = self.policy.amount,
            interval_secs = self.policy.interval.as_secs(),
            "Periodic worker started"
        );

        let mut ticker = tokio::time::interval(self.policy.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                // A send and a dropped sender both mean stop.
                _ = self.cancel_rx.recv() => {
                    info!(path = %self.path, "Stopping periodic worker");
                    return;
                }
                _ = ticker.tick() => {}
            }

            debug!(path = %self.path, amount = self.policy.amount, "Periodic increment");
            self.sinks.emit(&self.path, self.policy.amount);
        }
    }
}
