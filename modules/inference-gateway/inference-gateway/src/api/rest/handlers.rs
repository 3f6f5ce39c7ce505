use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::metrics::GatewayMetrics;

const TEXT_EXPOSITION: &str = "text/plain; version=0.0.4; charset=utf-8";

/// `GET /metrics`
#[allow(clippy::unused_async)]
pub async fn metrics(State(metrics): State<GatewayMetrics>) -> Response {
    match metrics.render() {
        Ok(body) => ([(header::CONTENT_TYPE, TEXT_EXPOSITION)], body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to render metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to render metrics").into_response()
        }
    }
}
