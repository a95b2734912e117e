//! Periodic workers
//!
//! Path-keyed background emitters and the registry that replaces them.

mod periodic;
mod registry;

pub use periodic::{
    PeriodicPolicy, Worker, WorkerHandle, WorkerInfo, DEFAULT_INCREMENT_BY, DEFAULT_INTERVAL_SECS,
};
pub use registry::WorkerRegistry;
