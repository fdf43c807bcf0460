//! Service middleware for request metrics.
//!
//! ## Metric Events
//!
//! Emitted as structured log events under `conversion_webhook::metrics`:
//!
//! - `request`: path, method, status, latency
//! - `conversion`: review outcome, object count, latency
//! - `hub_resolution`: cache hits and misses after each review

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::info;

use crate::hub::CacheStats;

const METRICS_TARGET: &str = "conversion_webhook::metrics";

/// Metrics middleware that records request counts and latency.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    info!(
        target: METRICS_TARGET,
        metric_type = "request",
        path = %path,
        method = %method,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request_metric"
    );

    response
}

/// Record the outcome of one conversion review.
pub fn record_conversion_metrics(desired_api_version: &str, objects: usize, success: bool, latency_ms: u64) {
    let result = if success { "success" } else { "failure" };
    info!(
        target: METRICS_TARGET,
        metric_type = "conversion",
        desired_api_version = desired_api_version,
        objects = objects,
        result = result,
        latency_ms = latency_ms,
        "conversion_metric"
    );
}

/// Record hub cache counters.
pub fn record_hub_resolution(stats: &CacheStats) {
    info!(
        target: METRICS_TARGET,
        metric_type = "hub_resolution",
        hits = stats.hits,
        misses = stats.misses,
        entries = stats.entries,
        hit_rate = stats.hit_rate(),
        "hub_resolution_metric"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::post,
        Router,
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_metrics_middleware_passes_response_through() {
        let app = Router::new()
            .route("/convert", post(|| async { StatusCode::ACCEPTED }))
            .layer(middleware::from_fn(metrics_middleware));

        let request = HttpRequest::builder()
            .method("POST")
            .uri("/convert?timeout=30s")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
}
