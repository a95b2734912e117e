//! HTTP surface
//!
//! The increment API listens on one address and the scrape/ops endpoints on
//! another.

mod increment;
mod ops;
mod router;

pub use increment::{IncrementEndpoint, IncrementRequest};
pub use ops::{StatsResponse, WorkersResponse};
pub use router::{build_increment_router, build_ops_router};
