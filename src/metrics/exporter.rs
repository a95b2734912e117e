//! Exporter wiring
//!
//! Builds the pull registry and the OTLP push pipeline and hands out the
//! resulting sink pair.

use anyhow::Result;
use opentelemetry::metrics::{Meter, MeterProvider};
use opentelemetry::{global, InstrumentationScope, KeyValue};
use opentelemetry_otlp::{MetricExporter, Protocol, WithExportConfig};
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::Resource;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::pull::PullSink;
use super::push::PushSink;
use super::sink::SinkPair;
use crate::config::{Config, OtlpConfig};

/// Both metric sinks plus the push pipeline that feeds one of them
pub struct Telemetry {
    push: Arc<PushSink>,
    pull: Arc<PullSink>,
    provider: Option<SdkMeterProvider>,
}

impl Telemetry {
    /// Build the sinks; an OTLP failure degrades to pull-only
    pub fn init(config: &Config) -> Self {
        let pull = Arc::new(PullSink::new(&config.metrics));
        let push = Arc::new(PushSink::new());

        let provider = if config.otlp.enabled {
            match init_push_provider(&config.otlp) {
                Ok(provider) => {
                    push.install(&scoped_meter(&provider, &config.otlp), &config.otlp.counter_name);
                    info!(
                        endpoint = %config.otlp.endpoint,
                        interval_secs = config.otlp.export_interval_secs,
                        "OTLP metrics initialized"
                    );
                    Some(provider)
                }
                Err(e) => {
                    warn!(error = %e, "Failed to initialize OTLP metrics, push sink disabled");
                    None
                }
            }
        } else {
            info!("OTLP export disabled, push sink inactive");
            None
        };

        Self { push, pull, provider }
    }

    /// Telemetry with only the pull side wired
    pub fn pull_only(config: &Config) -> Self {
        Self {
            push: Arc::new(PushSink::new()),
            pull: Arc::new(PullSink::new(&config.metrics)),
            provider: None,
        }
    }

    pub fn sinks(&self) -> SinkPair {
        SinkPair::new(self.push.clone(), self.pull.clone())
    }

    pub fn push(&self) -> Arc<PushSink> {
        Arc::clone(&self.push)
    }

    pub fn pull(&self) -> Arc<PullSink> {
        Arc::clone(&self.pull)
    }

    /// Flush pending push samples and stop the periodic reader
    pub fn shutdown(&self) {
        if let Some(provider) = &self.provider {
            if let Err(e) = provider.shutdown() {
                warn!(error = %e, "OTLP meter provider shutdown failed");
            } else {
                info!("OTLP meter provider flushed");
            }
        }
    }
}

/// Build the OTLP gRPC pipeline and install it as the global provider
pub fn init_push_provider(config: &OtlpConfig) -> Result<SdkMeterProvider> {
    let exporter = MetricExporter::builder()
        .with_tonic()
        .with_endpoint(config.endpoint.clone())
        .with_protocol(Protocol::Grpc)
        .with_timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let reader = PeriodicReader::builder(exporter)
        .with_interval(Duration::from_secs(config.export_interval_secs))
        .build();

    let resource = Resource::builder()
        .with_service_name(config.service_name.clone())
        .with_attributes([
            KeyValue::new("service.instance.id", config.instance_id.clone()),
            KeyValue::new("service.version", config.service_version.clone()),
        ])
        .build();

    let provider = SdkMeterProvider::builder()
        .with_resource(resource)
        .with_reader(reader)
        .build();

    global::set_meter_provider(provider.clone());
    Ok(provider)
}

/// Meter carrying the configured instrumentation scope attributes
pub fn scoped_meter<P: MeterProvider>(provider: &P, config: &OtlpConfig) -> Meter {
    let attributes = config
        .scope_attributes
        .iter()
        .map(|(k, v)| KeyValue::new(k.clone(), v.clone()));

    let scope = InstrumentationScope::builder(config.meter_name.clone())
        .with_version(config.service_version.clone())
        .with_attributes(attributes)
        .build();

    provider.meter_with_scope(scope)
}
