//! Shared application state for request handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::metrics::RequestMetrics;
use crate::readiness::ReadinessGate;

/// Shared application state, cloneable across handlers via Arc-wrapped fields.
///
/// Holds the greeting text, the readiness gate and the request metrics.
/// The gate captures the process start time when the state is built, so the
/// state must exist before the router starts accepting connections.
#[derive(Clone, Debug)]
pub struct AppState {
    pub message: Arc<str>,
    pub readiness: Arc<ReadinessGate>,
    pub metrics: RequestMetrics,
}

impl AppState {
    /// Creates the state for a configured process, starting the readiness clock now.
    pub fn new(config: &AppConfig, metrics: RequestMetrics) -> Self {
        Self::with_gate(
            config.app.message.clone(),
            ReadinessGate::start(config.app.ready_delay()),
            metrics,
        )
    }

    /// Creates the state from an already started gate.
    pub fn with_gate(
        message: impl Into<Arc<str>>,
        readiness: ReadinessGate,
        metrics: RequestMetrics,
    ) -> Self {
        Self {
            message: message.into(),
            readiness: Arc::new(readiness),
            metrics,
        }
    }
}
