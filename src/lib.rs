//! OtelProbe Server - push/pull metric exporter probe
//!
//! Accepts increment requests keyed by HTTP path, emits each increment to an
//! OTLP push sink and a Prometheus pull sink, and keeps at most one periodic
//! re-emitting worker per path.

pub mod api;
pub mod app_state;
pub mod config;
pub mod error;
pub mod metrics;
pub mod server;
pub mod util;
pub mod worker;

pub use app_state::AppState;
pub use config::Config;
pub use server::Server;

/// Server version for display
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
