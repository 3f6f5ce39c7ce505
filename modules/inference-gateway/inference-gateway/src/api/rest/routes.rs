use axum::Router;
use axum::routing::get;

use super::handlers;
use crate::metrics::GatewayMetrics;

/// Router exposing `/metrics` and `/health`. Every other path is 404.
pub fn router(metrics: GatewayMetrics) -> Router {
    Router::new()
        .route("/metrics", get(handlers::metrics))
        .route("/health", get(|| async { "ok" }))
        .with_state(metrics)
}
