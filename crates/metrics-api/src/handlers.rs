use crate::registry::MetricsRegistry;
use axum::{extract::State, http::header, response::IntoResponse};
use std::sync::Arc;

/// Content type of the Prometheus text exposition format.
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// GET /metrics - Renders every registered series.
pub async fn metrics(State(registry): State<Arc<MetricsRegistry>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        registry.to_prometheus(),
    )
}

/// GET /health - `OK` once the sampler has completed an iteration, `STARTING` before.
pub async fn health(State(registry): State<Arc<MetricsRegistry>>) -> &'static str {
    if registry.is_ready() {
        "OK"
    } else {
        "STARTING"
    }
}
