//! Utility modules

mod tracing_setup;

pub use tracing_setup::init_tracing;
