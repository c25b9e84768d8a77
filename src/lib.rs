//! kube-hello: a greeting service that demonstrates container health probes.
//!
//! Serves a greeting on `/`, liveness on `/health`, a time-gated readiness
//! probe on `/ready` and Prometheus counters on `/metrics`.

pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod middleware;
pub mod readiness;
pub mod routes;
pub mod state;

pub use config::{AppConfig, ConfigError};
pub use error::AppError;
pub use metrics::{MetricsError, RequestMetrics};
pub use readiness::{Clock, ManualClock, MonotonicClock, ReadinessGate};
pub use routes::create_router;
pub use state::AppState;
