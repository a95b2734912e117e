//! Axum router wiring.
//!
//! Every path on the increment listener reaches the increment handler; the
//! ops listener exposes fixed routes.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use super::ops;
use crate::app_state::AppState;
use crate::error::Result;

pub fn build_increment_router(state: AppState) -> Router {
    Router::new().fallback(increment).with_state(state)
}

pub fn build_ops_router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(ops::metrics))
        .route("/healthz", get(ops::healthz))
        .route("/stats", get(ops::stats))
        .route("/workers", get(ops::workers))
        .with_state(state)
}

async fn increment(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Result<Response> {
    let echoed = state.endpoint().handle(&method, uri.path(), body)?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        echoed,
    )
        .into_response())
}
