//! Operational HTTP endpoints.
//!
//! - `/metrics` : Prometheus text format from the pull sink
//! - `/healthz` : liveness
//! - `/stats`   : endpoint traffic counters
//! - `/workers` : active periodic workers

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::app_state::AppState;
use crate::metrics::StatsSnapshot;
use crate::worker::WorkerInfo;

/// API response for /stats endpoint
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub requests: StatsSnapshot,
    pub active_workers: usize,
}

/// API response for /workers endpoint
#[derive(Debug, Serialize)]
pub struct WorkersResponse {
    pub count: usize,
    pub workers: Vec<WorkerInfo>,
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        state.pull().render(),
    )
        .into_response()
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        requests: state.stats().snapshot(),
        active_workers: state.registry().len(),
    })
}

pub async fn workers(State(state): State<AppState>) -> Json<WorkersResponse> {
    let workers = state.registry().list();
    Json(WorkersResponse {
        count: workers.len(),
        workers,
    })
}
