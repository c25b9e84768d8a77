//! Prometheus request counter for the greeting endpoint.
//!
//! `RequestMetrics` owns its own [`Registry`] instead of using the
//! process-global default one. It is built once at startup and shared with
//! handlers through `AppState`.

use prometheus::core::Collector;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder, TEXT_FORMAT};

/// Name of the greeting request counter as seen by scrapers
pub const REQUESTS_TOTAL: &str = "app_requests_total";

const REQUESTS_TOTAL_HELP: &str = "Total requests to the greeting endpoint";

/// Label partitioning the counter by HTTP method
pub const METHOD_LABEL: &str = "method";

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
    #[error("Metrics output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Clone)]
pub struct RequestMetrics {
    registry: Registry,
    requests_total: IntCounterVec,
}

impl RequestMetrics {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new(REQUESTS_TOTAL, REQUESTS_TOTAL_HELP),
            &[METHOD_LABEL],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        Ok(Self {
            registry,
            requests_total,
        })
    }

    /// Count one request for `method`. The series is created at zero on first use.
    pub fn increment(&self, method: &str) {
        self.requests_total.with_label_values(&[method]).inc();
    }

    /// Current count for `method`, zero if never incremented.
    ///
    /// Reads the collected series so that querying a label does not create it.
    pub fn count(&self, method: &str) -> u64 {
        self.requests_total
            .collect()
            .iter()
            .flat_map(|family| family.get_metric())
            .find(|metric| {
                metric
                    .get_label()
                    .iter()
                    .any(|pair| pair.get_name() == METHOD_LABEL && pair.get_value() == method)
            })
            .map(|metric| metric.get_counter().get_value() as u64)
            .unwrap_or(0)
    }

    /// Content type of [`export`](Self::export) output.
    pub fn content_type(&self) -> &'static str {
        TEXT_FORMAT
    }

    /// Render every series in the text exposition format.
    pub fn export(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl std::fmt::Debug for RequestMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestMetrics").finish_non_exhaustive()
    }
}
