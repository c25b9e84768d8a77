//! Readiness probe endpoint.

use axum::{extract::State, http::StatusCode};

use crate::state::AppState;

/// Readiness probe handler.
///
/// Returns 503 "not ready" until the startup delay has elapsed, then 200 "ready".
pub async fn ready(State(state): State<AppState>) -> (StatusCode, &'static str) {
    if state.readiness.is_ready() {
        (StatusCode::OK, "ready")
    } else {
        tracing::debug!(
            remaining_ms = state.readiness.remaining().as_millis() as u64,
            delay_secs = state.readiness.delay().as_secs(),
            "Readiness probe while still warming up"
        );
        (StatusCode::SERVICE_UNAVAILABLE, "not ready")
    }
}
