//! Push/pull agreement tests
//!
//! Feeds identical increments through a real push sink (in-memory OTLP
//! exporter) and a real pull sink (Prometheus recorder) and compares totals.

use opentelemetry::{Key, Value};
use opentelemetry_sdk::metrics::data::{AggregatedMetrics, MetricData, ResourceMetrics};
use opentelemetry_sdk::metrics::{InMemoryMetricExporter, PeriodicReader, SdkMeterProvider};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use otelprobe_server::config::{MetricsConfig, OtlpConfig};
use otelprobe_server::metrics::{scoped_meter, PullSink, PushSink, SinkPair};

struct Pipeline {
    exporter: InMemoryMetricExporter,
    provider: SdkMeterProvider,
    push: Arc<PushSink>,
    pull: Arc<PullSink>,
}

fn pipeline(otlp: &OtlpConfig) -> Pipeline {
    let exporter = InMemoryMetricExporter::default();
    let reader = PeriodicReader::builder(exporter.clone()).build();
    let provider = SdkMeterProvider::builder().with_reader(reader).build();

    let push = Arc::new(PushSink::new());
    assert!(push.install(&scoped_meter(&provider, otlp), &otlp.counter_name));
    let pull = Arc::new(PullSink::new(&MetricsConfig::default()));

    Pipeline {
        exporter,
        provider,
        push,
        pull,
    }
}

fn push_totals(metrics: &[ResourceMetrics], name: &str) -> HashMap<String, u64> {
    let mut totals = HashMap::new();
    let Some(latest) = metrics.last() else {
        return totals;
    };
    for metric in latest.scope_metrics().flat_map(|sm| sm.metrics()) {
        if metric.name() != name {
            continue;
        }
        let AggregatedMetrics::U64(MetricData::Sum(sum)) = metric.data() else {
            panic!("{name} should be a u64 sum");
        };
        for point in sum.data_points() {
            let path = point
                .attributes()
                .find(|kv| kv.key == Key::from("path"))
                .map(|kv| kv.value.to_string())
                .expect("data point should carry a path attribute");
            totals.insert(path, point.value());
        }
    }
    totals
}

fn pull_total(pull: &PullSink, path: &str) -> Option<u64> {
    let prefix = format!("path_increment_sum{{path=\"{path}\"}} ");
    pull.render()
        .lines()
        .find_map(|line| line.strip_prefix(prefix.as_str()).map(str::to_owned))
        .and_then(|v| v.trim().parse().ok())
}

#[test]
fn test_push_and_pull_agree() {
    let otlp = OtlpConfig::default();
    let p = pipeline(&otlp);
    let pair = SinkPair::new(p.push.clone(), p.pull.clone());

    pair.emit("/a", 7);
    pair.emit("/b", 1);
    pair.emit("/b", 100);
    pair.emit("/a", 3);

    p.provider.force_flush().unwrap();
    let metrics = p.exporter.get_finished_metrics().unwrap();
    let pushed = push_totals(&metrics, &otlp.counter_name);

    assert_eq!(pushed.get("/a"), Some(&10));
    assert_eq!(pushed.get("/b"), Some(&101));
    assert_eq!(pushed.get("/c"), None);

    for (path, total) in &pushed {
        assert_eq!(pull_total(&p.pull, path), Some(*total), "mismatch for {path}");
    }
}

#[test]
fn test_meter_carries_scope_attributes() {
    let otlp = OtlpConfig {
        meter_name: "probe-scope".to_string(),
        scope_attributes: BTreeMap::from([("team".to_string(), "observability".to_string())]),
        ..OtlpConfig::default()
    };
    let p = pipeline(&otlp);

    SinkPair::new(p.push.clone(), p.pull.clone()).emit("/scoped", 1);
    p.provider.force_flush().unwrap();

    let metrics = p.exporter.get_finished_metrics().unwrap();
    let scope = metrics
        .last()
        .unwrap()
        .scope_metrics()
        .map(|sm| sm.scope())
        .find(|scope| scope.name() == "probe-scope")
        .expect("scope should be exported");

    assert_eq!(scope.version(), Some("1.0.0"));
    assert!(scope
        .attributes()
        .any(|kv| kv.key == Key::from("team") && kv.value == Value::from("observability")));
}

#[test]
fn test_second_install_is_ignored() {
    let otlp = OtlpConfig::default();
    let p = pipeline(&otlp);
    assert!(p.push.is_ready());

    let other = SdkMeterProvider::builder().build();
    assert!(!p.push.install(&scoped_meter(&other, &otlp), "unused"));
}

#[test]
fn test_heartbeat_is_exported() {
    let otlp = OtlpConfig::default();
    let p = pipeline(&otlp);

    p.push.heartbeat();
    p.push.heartbeat();
    p.provider.force_flush().unwrap();

    let metrics = p.exporter.get_finished_metrics().unwrap();
    let heartbeat = metrics
        .last()
        .unwrap()
        .scope_metrics()
        .flat_map(|sm| sm.metrics())
        .find(|m| m.name() == otelprobe_server::metrics::HEARTBEAT_COUNTER)
        .expect("heartbeat counter should be exported");
    let AggregatedMetrics::U64(MetricData::Sum(sum)) = heartbeat.data() else {
        panic!("heartbeat should be a u64 sum");
    };
    let total: u64 = sum.data_points().map(|dp| dp.value()).sum();
    assert_eq!(total, 2);
}
