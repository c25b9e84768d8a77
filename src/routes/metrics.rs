//! Prometheus scrape endpoint.

use axum::{extract::State, http::header::CONTENT_TYPE, response::IntoResponse};

use crate::error::AppError;
use crate::state::AppState;

/// Metrics handler. Renders the request counters in the text exposition format.
pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = state.metrics.export()?;
    Ok(([(CONTENT_TYPE, state.metrics.content_type())], body))
}
