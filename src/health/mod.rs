//! Liveness and readiness endpoints.
//!
//! None of these contact the upstream: a platform health check must be able to
//! tell "process is up" apart from "backend is down".

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;

use crate::http::response::ok_payload;
use crate::http::server::AppState;

/// `GET /health`: the process accepts connections.
pub async fn liveness() -> Response {
    ok_payload(StatusCode::OK, true)
}

/// `GET /ready`: the build output is in place.
pub async fn readiness(State(state): State<AppState>) -> Response {
    if state.assets.is_ready().await {
        ok_payload(StatusCode::OK, true)
    } else {
        tracing::warn!(root = %state.assets.root().display(), "Readiness check failed: entry document missing");
        ok_payload(StatusCode::SERVICE_UNAVAILABLE, false)
    }
}
