//! Dual-sink emission
//!
//! Every increment goes to a push sink and a pull sink so the values the two
//! exporters eventually report can be compared for identical inputs.

use std::sync::Arc;

/// Label key attached to every path-keyed sample
pub const PATH_LABEL: &str = "path";

/// A path-labeled monotonic counter
///
/// Implementations synchronize internally; `add` is called concurrently from
/// request handlers and periodic workers.
pub trait MetricSink: Send + Sync {
    /// Add `amount` to the counter for `path`
    fn add(&self, path: &str, amount: u64);
}

/// Push and pull counters fed with the same increments
#[derive(Clone)]
pub struct SinkPair {
    push: Arc<dyn MetricSink>,
    pull: Arc<dyn MetricSink>,
}

impl SinkPair {
    pub fn new(push: Arc<dyn MetricSink>, pull: Arc<dyn MetricSink>) -> Self {
        Self { push, pull }
    }

    /// Add `amount` for `path` on both sinks
    ///
    /// The push half is a no-op while its exporter is not initialized; the
    /// pull half always runs.
    #[inline]
    pub fn emit(&self, path: &str, amount: u64) {
        self.push.add(path, amount);
        self.pull.add(path, amount);
    }
}
