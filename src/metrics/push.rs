//! Push sink backed by an OpenTelemetry meter
//!
//! Instruments are created once the exporter pipeline exists. Until then the
//! sink drops samples: losing a push sample is tolerated, blocking the pull
//! side is not.

use once_cell::sync::OnceCell;
use opentelemetry::metrics::{Counter, Meter};
use opentelemetry::KeyValue;
use tracing::trace;

use super::sink::{MetricSink, PATH_LABEL};

/// Heartbeat counter bumped by the synthetic emitters
pub const HEARTBEAT_COUNTER: &str = "otlp_requests_total";

struct PushInstruments {
    path_sum: Counter<u64>,
    heartbeat: Counter<u64>,
}

/// OpenTelemetry side of the sink pair
#[derive(Default)]
pub struct PushSink {
    instruments: OnceCell<PushInstruments>,
}

impl PushSink {
    /// Create an uninitialized sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the instruments on `meter`
    ///
    /// Returns `false` if the sink was already initialized.
    pub fn install(&self, meter: &Meter, counter_name: &str) -> bool {
        let mut created = false;
        self.instruments.get_or_init(|| {
            created = true;
            PushInstruments {
                path_sum: meter
                    .u64_counter(counter_name.to_owned())
                    .with_description("Running sum of incrementBy values by path")
                    .build(),
                heartbeat: meter
                    .u64_counter(HEARTBEAT_COUNTER)
                    .with_description("Total number of requests processed")
                    .build(),
            }
        });
        created
    }

    /// Whether the exporter pipeline has been attached
    pub fn is_ready(&self) -> bool {
        self.instruments.get().is_some()
    }

    /// Bump the unlabeled heartbeat counter
    pub fn heartbeat(&self) {
        if let Some(instruments) = self.instruments.get() {
            instruments.heartbeat.add(1, &[]);
        }
    }
}

impl MetricSink for PushSink {
    fn add(&self, path: &str, amount: u64) {
        match self.instruments.get() {
            Some(instruments) => instruments
                .path_sum
                .add(amount, &[KeyValue::new(PATH_LABEL, path.to_owned())]),
            None => trace!(path, amount, "Push sink not initialized, sample dropped"),
        }
    }
}
