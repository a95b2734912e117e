//! Metrics and observability
//!
//! A push sink (OTLP) and a pull sink (Prometheus) fed with identical
//! path-labeled increments, plus endpoint traffic counters.

mod exporter;
mod pull;
mod push;
mod sink;
mod stats;
mod synthetic;

pub use exporter::{init_push_provider, scoped_meter, Telemetry};
pub use pull::{PullSink, LAZY_COUNTER};
pub use push::{PushSink, HEARTBEAT_COUNTER};
pub use sink::{MetricSink, SinkPair, PATH_LABEL};
pub use stats::{ProbeStats, StatsSnapshot};
pub use synthetic::{spawn_synthetic, PROCESS_BOUND_COUNTER, STAGGERED_COUNTER};

#[cfg(test)]
pub(crate) use sink::recording;
