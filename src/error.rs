//! Request-time errors and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::metrics::MetricsError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Metrics export failed: {0}")]
    Metrics(#[from] MetricsError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Internal error");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
    }
}
