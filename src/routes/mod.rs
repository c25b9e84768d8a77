//! HTTP route handlers.
//!
//! The greeting route is the only one that touches the request counter.
//! Probe and metrics routes carry `Cache-Control: no-store` so that no
//! intermediary answers a probe from cache.
//!
//! Request tracing is enabled via middleware that generates a unique request ID
//! for each incoming request, allowing correlation of all logs within a request.

pub mod greeting;
pub mod health;
pub mod metrics;
pub mod ready;

use axum::{middleware, routing::get, Router};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::CACHE_CONTROL_PROBE;
use crate::middleware::request_id_layer;
use crate::state::AppState;

/// Creates the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    let greeting_routes = Router::new().route("/", get(greeting::index));

    // Probes and scrapes - never cached
    let probe_routes = Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(ready::ready))
        .route("/metrics", get(metrics::metrics))
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_PROBE),
        ));

    Router::new()
        .merge(greeting_routes)
        .merge(probe_routes)
        .with_state(state)
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_id_layer))
}
