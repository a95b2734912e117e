//! Increment endpoint
//!
//! `POST <any path>` with a JSON body adds `incrementBy` to the path's
//! counters and, when periodic fields are present, (re)starts the path's
//! periodic worker. The body is echoed back unchanged.

use axum::http::Method;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{ApiError, Result};
use crate::metrics::{ProbeStats, SinkPair};
use crate::worker::{PeriodicPolicy, WorkerRegistry};

/// Parsed request body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncrementRequest {
    #[serde(default)]
    pub increment_by: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub increment_by_periodic: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub increment_interval_seconds: i64,
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

impl IncrementRequest {
    /// Parse a request body
    pub fn parse(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    /// One-shot amount; counters only grow, so negatives count as zero
    pub fn one_shot_amount(&self) -> u64 {
        u64::try_from(self.increment_by).unwrap_or(0)
    }

    /// Whether either periodic field was supplied
    pub fn is_periodic(&self) -> bool {
        self.increment_by_periodic != 0 || self.increment_interval_seconds != 0
    }

    /// Floor-adjusted policy for the periodic worker
    pub fn periodic_policy(&self) -> PeriodicPolicy {
        PeriodicPolicy::from_request(self.increment_by_periodic, self.increment_interval_seconds)
    }
}

/// Transport-independent increment handling
pub struct IncrementEndpoint {
    sinks: SinkPair,
    registry: Arc<WorkerRegistry>,
    stats: Arc<ProbeStats>,
}

impl IncrementEndpoint {
    pub fn new(sinks: SinkPair, registry: Arc<WorkerRegistry>, stats: Arc<ProbeStats>) -> Self {
        Self {
            sinks,
            registry,
            stats,
        }
    }

    /// Handle one request, returning the body to echo
    ///
    /// Rejected requests leave counters and workers untouched.
    pub fn handle(&self, method: &Method, path: &str, body: Bytes) -> Result<Bytes> {
        self.stats.request();
        info!(%method, path, "Received increment request");

        let request = self.validate(method, &body).map_err(|e| {
            self.stats.rejected();
            debug!(%method, path, error = %e, "Increment request rejected");
            e
        })?;

        info!(path, increment_by = request.increment_by, "Incrementing");
        self.sinks.emit(path, request.one_shot_amount());

        if request.is_periodic() {
            let policy = request.periodic_policy();
            let replaced = self.registry.upsert(path, policy);
            self.stats.periodic(replaced.is_some());
        } else {
            self.stats.one_shot();
        }

        Ok(body)
    }

    fn validate(&self, method: &Method, body: &[u8]) -> Result<IncrementRequest> {
        if *method != Method::POST {
            return Err(ApiError::MethodNotAllowed(method.clone()));
        }
        IncrementRequest::parse(body)
    }
}
