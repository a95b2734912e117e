//! Atomic counters describing increment endpoint traffic
//!
//! Lock-free counters that can be safely updated from any handler.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Endpoint traffic counters
#[derive(Debug, Default)]
pub struct ProbeStats {
    pub requests_total: AtomicU64,
    pub requests_rejected: AtomicU64,
    pub one_shot_requests: AtomicU64,
    pub periodic_requests: AtomicU64,
    pub workers_replaced: AtomicU64,
}

impl ProbeStats {
    pub const fn new() -> Self {
        Self {
            requests_total: AtomicU64::new(0),
            requests_rejected: AtomicU64::new(0),
            one_shot_requests: AtomicU64::new(0),
            periodic_requests: AtomicU64::new(0),
            workers_replaced: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn rejected(&self) {
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn one_shot(&self) {
        self.one_shot_requests.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn periodic(&self, replaced: bool) {
        self.periodic_requests.fetch_add(1, Ordering::Relaxed);
        if replaced {
            self.workers_replaced.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            requests_rejected: self.requests_rejected.load(Ordering::Relaxed),
            one_shot_requests: self.one_shot_requests.load(Ordering::Relaxed),
            periodic_requests: self.periodic_requests.load(Ordering::Relaxed),
            workers_replaced: self.workers_replaced.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of endpoint counters for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub requests_total: u64,
    pub requests_rejected: u64,
    pub one_shot_requests: u64,
    pub periodic_requests: u64,
    pub workers_replaced: u64,
}
