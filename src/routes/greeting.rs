//! Greeting endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Greeting {
    pub message: String,
}

/// Greeting handler. Counts the request, then returns the configured message.
pub async fn index(State(state): State<AppState>) -> Json<Greeting> {
    state.metrics.increment("GET");
    tracing::debug!(requests = state.metrics.count("GET"), "Greeting served");
    Json(Greeting {
        message: state.message.to_string(),
    })
}
