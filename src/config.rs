//! Configuration management
//!
//! Handles loading and validating probe configuration from TOML files.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub otlp: OtlpConfig,
    #[serde(default)]
    pub synthetic: SyntheticConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Increment API listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind the increment API
    #[serde(default = "default_server_addr")]
    pub bind_addr: SocketAddr,
    /// Number of runtime worker threads (0 = auto)
    #[serde(default)]
    pub workers: usize,
}

impl ServerConfig {
    /// Get effective worker count (auto-detect if 0)
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get()
        } else {
            self.workers
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_server_addr(),
            workers: 0,
        }
    }
}

/// Pull-side (Prometheus) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Scrape and ops endpoint bind address
    #[serde(default = "default_metrics_addr")]
    pub bind_addr: SocketAddr,
    /// Name of the path-labeled counter
    #[serde(default = "default_pull_counter")]
    pub counter_name: String,
    #[serde(default = "default_counter_description")]
    pub counter_description: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_metrics_addr(),
            counter_name: default_pull_counter(),
            counter_description: default_counter_description(),
        }
    }
}

/// Push-side (OTLP) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OtlpConfig {
    /// Build the OTLP exporter at startup
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Collector gRPC endpoint
    #[serde(default = "default_otlp_endpoint")]
    pub endpoint: String,
    /// Periodic reader interval in seconds
    #[serde(default = "default_export_interval")]
    pub export_interval_secs: u64,
    /// Export timeout in seconds
    #[serde(default = "default_export_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_service_version")]
    pub service_version: String,
    #[serde(default = "default_instance_id")]
    pub instance_id: String,
    /// Instrumentation scope name
    #[serde(default = "default_meter_name")]
    pub meter_name: String,
    /// Name of the path-labeled counter
    #[serde(default = "default_push_counter")]
    pub counter_name: String,
    /// Attributes attached to the instrumentation scope
    #[serde(default)]
    pub scope_attributes: BTreeMap<String, String>,
}

impl Default for OtlpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_otlp_endpoint(),
            export_interval_secs: default_export_interval(),
            timeout_secs: default_export_timeout(),
            service_name: default_service_name(),
            service_version: default_service_version(),
            instance_id: default_instance_id(),
            meter_name: default_meter_name(),
            counter_name: default_push_counter(),
            scope_attributes: BTreeMap::new(),
        }
    }
}

/// Background synthetic counters
#[derive(Debug, Clone, Deserialize)]
pub struct SyntheticConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Delay between the start of consecutive staggered series
    #[serde(default = "default_stagger_secs")]
    pub stagger_secs: u64,
    /// Number of staggered series
    #[serde(default = "default_staggered_series")]
    pub staggered_series: usize,
    /// Period between re-registrations of the lazy counter
    #[serde(default = "default_lazy_reinit_secs")]
    pub lazy_reinit_secs: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            stagger_secs: default_stagger_secs(),
            staggered_series: default_staggered_series(),
            lazy_reinit_secs: default_lazy_reinit_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format: "json" or "pretty"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_server_addr() -> SocketAddr { SocketAddr::from(([0, 0, 0, 0], 80)) }
fn default_metrics_addr() -> SocketAddr { SocketAddr::from(([0, 0, 0, 0], 8080)) }
fn default_pull_counter() -> String { "path_increment_sum".to_string() }
fn default_counter_description() -> String { "Running sum of incrementBy values by path".to_string() }
fn default_true() -> bool { true }
fn default_otlp_endpoint() -> String { "http://localhost:4317".to_string() }
fn default_export_interval() -> u64 { 10 }
fn default_export_timeout() -> u64 { 5 }
fn default_service_name() -> String { "otelprobe-service".to_string() }
fn default_service_version() -> String { "1.0.0".to_string() }
fn default_instance_id() -> String { "otelprobe-instance".to_string() }
fn default_meter_name() -> String { "otelprobe-metrics".to_string() }
fn default_push_counter() -> String { "otlp_path_increment_sum".to_string() }
fn default_stagger_secs() -> u64 { 60 }
fn default_staggered_series() -> usize { 10 }
fn default_lazy_reinit_secs() -> u64 { 300 }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

const MAX_STAGGERED_SERIES: usize = 100;

impl Config {
    /// Load configuration from a TOML file, then apply environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config = Self::parse(&contents)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text without touching the environment
    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).with_context(|| "Failed to parse config file")
    }

    /// Apply `OTLP_ENDPOINT` and `POD_NAME` overrides from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("OTLP_ENDPOINT").filter(|v| !v.is_empty()) {
            self.otlp.endpoint = if endpoint.contains("://") {
                endpoint
            } else {
                format!("http://{endpoint}")
            };
        }
        if let Some(pod) = lookup("POD_NAME").filter(|v| !v.is_empty()) {
            self.otlp.instance_id = pod;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.bind_addr == self.metrics.bind_addr {
            anyhow::bail!("server.bind_addr and metrics.bind_addr must differ");
        }
        if self.metrics.counter_name.is_empty() {
            anyhow::bail!("metrics.counter_name must not be empty");
        }
        if self.otlp.counter_name.is_empty() {
            anyhow::bail!("otlp.counter_name must not be empty");
        }
        if self.otlp.export_interval_secs == 0 {
            anyhow::bail!("otlp.export_interval_secs must be > 0");
        }
        if self.otlp.timeout_secs == 0 {
            anyhow::bail!("otlp.timeout_secs must be > 0");
        }
        if self.synthetic.lazy_reinit_secs == 0 {
            anyhow::bail!("synthetic.lazy_reinit_secs must be > 0");
        }
        if self.synthetic.staggered_series > MAX_STAGGERED_SERIES {
            anyhow::bail!("synthetic.staggered_series must be <= {MAX_STAGGERED_SERIES}");
        }
        Ok(())
    }
}
