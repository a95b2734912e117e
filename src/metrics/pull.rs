//! Pull sink backed by a Prometheus recorder
//!
//! The recorder is owned by the sink instead of being installed globally, so
//! several sinks can coexist (one per test, one per process) and the scrape
//! endpoint renders exactly what this sink recorded.
//!
//! A lazy counter lives in a second recorder that can be swapped out. A swap
//! drops the series and registers it again from zero, which is how counter
//! resets look to a scraper.

use metrics::{Counter, Key, KeyName, Label, Level, Metadata, Recorder, SharedString};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use parking_lot::Mutex;

use super::sink::{MetricSink, PATH_LABEL};
use crate::config::MetricsConfig;

/// Name of the counter that is periodically unregistered and registered again
pub const LAZY_COUNTER: &str = "lazy_init_counter_total";

/// Prometheus-registry side of the sink pair
pub struct PullSink {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
    counter_name: String,
    lazy: Mutex<Option<LazyCounter>>,
}

struct LazyCounter {
    handle: PrometheusHandle,
    counter: Counter,
}

impl PullSink {
    /// Create a sink with its own recorder and describe the path counter
    pub fn new(config: &MetricsConfig) -> Self {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        let sink = Self {
            recorder,
            handle,
            counter_name: config.counter_name.clone(),
            lazy: Mutex::new(None),
        };
        sink.describe(&config.counter_name, &config.counter_description);
        sink
    }

    /// Attach HELP text to a counter family
    pub fn describe(&self, name: &str, description: &str) {
        self.recorder.describe_counter(
            KeyName::from(name.to_owned()),
            None,
            SharedString::from(description.to_owned()),
        );
    }

    /// Resolve a counter handle in this sink's registry
    pub fn counter(&self, name: &str, labels: Vec<Label>) -> Counter {
        let key = Key::from_parts(name.to_owned(), labels);
        let metadata = Metadata::new(module_path!(), Level::INFO, Some(module_path!()));
        self.recorder.register_counter(&key, &metadata)
    }

    /// Drop the lazy counter's series, if any, and register it again at zero
    pub fn reregister_lazy(&self) {
        let recorder = PrometheusBuilder::new().build_recorder();
        recorder.describe_counter(
            KeyName::from(LAZY_COUNTER),
            None,
            SharedString::from("Counter that is periodically unregistered and registered again"),
        );
        let metadata = Metadata::new(module_path!(), Level::INFO, Some(module_path!()));
        let counter = recorder.register_counter(&Key::from_name(LAZY_COUNTER), &metadata);

        *self.lazy.lock() = Some(LazyCounter {
            handle: recorder.handle(),
            counter,
        });
    }

    /// Increment the lazy counter; false until it has been registered
    pub fn increment_lazy(&self) -> bool {
        match self.lazy.lock().as_ref() {
            Some(lazy) => {
                lazy.counter.increment(1);
                true
            }
            None => false,
        }
    }

    /// Render the registry in Prometheus text exposition format
    pub fn render(&self) -> String {
        let mut rendered = self.handle.render();
        if let Some(lazy) = self.lazy.lock().as_ref() {
            rendered.push_str(&lazy.handle.render());
        }
        rendered
    }
}

impl MetricSink for PullSink {
    fn add(&self, path: &str, amount: u64) {
        self.counter(&self.counter_name, vec![Label::new(PATH_LABEL, path.to_owned())])
            .increment(amount);
    }
}
