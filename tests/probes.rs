//! Router-level tests for the greeting, probe and metrics endpoints.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`; time is
//! controlled through a `ManualClock` so readiness can be tested without sleeping.

use std::env::VarError;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use tower::ServiceExt;

use kube_hello::config::AppConfig;
use kube_hello::{create_router, AppState, ManualClock, ReadinessGate, RequestMetrics};

struct TestApp {
    router: Router,
    clock: Arc<ManualClock>,
    metrics: RequestMetrics,
}

impl TestApp {
    fn new(message: &str, delay: Duration) -> Self {
        let clock = Arc::new(ManualClock::new());
        let metrics = RequestMetrics::new().unwrap();
        let gate = ReadinessGate::with_clock(clock.clone(), delay);
        let state = AppState::with_gate(message, gate, metrics.clone());
        Self {
            router: create_router(state),
            clock,
            metrics,
        }
    }

    async fn get(&self, uri: &str) -> Response {
        self.router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }
}

async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Find the value of `app_requests_total{method="<method>"}` in an exposition payload.
fn parse_counter(text: &str, method: &str) -> Option<u64> {
    let series = format!("app_requests_total{{method=\"{}\"}}", method);
    text.lines()
        .filter(|line| !line.starts_with('#'))
        .find_map(|line| {
            let (name, value) = line.rsplit_once(' ')?;
            (name == series).then(|| value.parse::<f64>().ok().map(|v| v as u64))?
        })
}

#[tokio::test]
async fn test_greeting_returns_default_message() {
    let config = AppConfig::default().with_env(|_| Err(VarError::NotPresent)).unwrap();
    let app = TestApp::new(&config.app.message, config.app.ready_delay());

    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("application/json"));

    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json, serde_json::json!({ "message": "Hello from Kubernetes!" }));
}

#[tokio::test]
async fn test_greeting_uses_configured_message() {
    let config = AppConfig::default()
        .with_env(|key| match key {
            "APP_MESSAGE" => Ok("Hi".to_string()),
            _ => Err(VarError::NotPresent),
        })
        .unwrap();
    let app = TestApp::new(&config.app.message, config.app.ready_delay());

    let json: serde_json::Value =
        serde_json::from_str(&body_string(app.get("/").await).await).unwrap();
    assert_eq!(json, serde_json::json!({ "message": "Hi" }));
}

#[tokio::test]
async fn test_health_always_ok() {
    let app = TestApp::new("hello", Duration::from_secs(5));

    for _ in 0..3 {
        let response = app.get("/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "ok");
        app.clock.advance(Duration::from_secs(10));
        app.get("/").await;
    }
}

#[tokio::test]
async fn test_ready_flips_once_after_delay() {
    let app = TestApp::new("hello", Duration::from_secs(5));

    let response = app.get("/ready").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_string(response).await, "not ready");

    app.clock.advance(Duration::from_millis(4_999));
    assert_eq!(app.get("/ready").await.status(), StatusCode::SERVICE_UNAVAILABLE);

    app.clock.advance(Duration::from_millis(1));
    let response = app.get("/ready").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");

    for _ in 0..5 {
        app.clock.advance(Duration::from_secs(30));
        assert_eq!(app.get("/ready").await.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_zero_delay_ready_immediately() {
    let config = AppConfig::default()
        .with_env(|key| match key {
            "READY_DELAY_SECONDS" => Ok("0".to_string()),
            _ => Err(VarError::NotPresent),
        })
        .unwrap();
    let app = TestApp::new(&config.app.message, config.app.ready_delay());

    assert_eq!(app.get("/ready").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_negative_delay_ready_immediately() {
    let config = AppConfig::default()
        .with_env(|key| match key {
            "READY_DELAY_SECONDS" => Ok("-1".to_string()),
            _ => Err(VarError::NotPresent),
        })
        .unwrap();
    let app = TestApp::new(&config.app.message, config.app.ready_delay());

    let response = app.get("/ready").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

#[tokio::test]
async fn test_probes_are_not_cacheable() {
    let app = TestApp::new("hello", Duration::ZERO);

    for uri in ["/health", "/ready", "/metrics"] {
        let response = app.get(uri).await;
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store", "{uri}");
    }
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let app = TestApp::new("hello", Duration::ZERO);

    let first = app.get("/health").await;
    let second = app.get("/health").await;
    let first_id = first.headers()["x-request-id"].to_str().unwrap().to_string();
    let second_id = second.headers()["x-request-id"].to_str().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&first_id).is_ok());
    assert_ne!(first_id, second_id);
}

#[tokio::test]
async fn test_metrics_reports_greeting_count() {
    let app = TestApp::new("hello", Duration::ZERO);

    for _ in 0..3 {
        app.get("/").await;
    }
    // Probe traffic is not counted
    app.get("/health").await;
    app.get("/ready").await;

    let response = app.get("/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain; version=0.0.4"));

    let text = body_string(response).await;
    assert_eq!(parse_counter(&text, "GET"), Some(3));
}

#[tokio::test]
async fn test_concurrent_greetings_are_all_counted() {
    const REQUESTS: usize = 200;
    let app = TestApp::new("hello", Duration::ZERO);

    let tasks: Vec<_> = (0..REQUESTS)
        .map(|_| {
            let router = app.router.clone();
            tokio::spawn(async move {
                router
                    .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
                    .await
                    .unwrap()
                    .status()
            })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::OK);
    }

    assert_eq!(app.metrics.count("GET"), REQUESTS as u64);
    let text = body_string(app.get("/metrics").await).await;
    assert_eq!(parse_counter(&text, "GET"), Some(REQUESTS as u64));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = TestApp::new("hello", Duration::ZERO);
    assert_eq!(app.get("/nope").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_post_to_greeting_is_405_and_not_counted() {
    let app = TestApp::new("hello", Duration::ZERO);

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(app.metrics.count("GET"), 0);
}
