//! HTTP server
//!
//! Binds the increment and ops listeners and runs them until shutdown.

mod listener;

pub use listener::Server;
