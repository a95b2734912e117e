//! Tracing/logging initialization

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

/// Initialize the tracing subscriber based on configuration
///
/// `RUST_LOG` takes precedence over `logging.level`.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| anyhow!("invalid log level {:?}: {e}", config.level))?;

    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = match config.format.as_str() {
        "json" => {
            let fmt_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_current_span(false);
            subscriber.with(fmt_layer).try_init()
        }
        "pretty" => {
            let fmt_layer = fmt::layer().pretty().with_target(true);
            subscriber.with(fmt_layer).try_init()
        }
        other => anyhow::bail!("unknown log format {other:?}, expected \"json\" or \"pretty\""),
    };

    installed.map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}
