//! HTTP client for the prediction backend (`POST /predict`).

use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::config::DownstreamConfig;
use crate::domain::{
    CallContext, ForwardError, PredictionBackend, PredictionRequest, PredictionResponse,
    TimeoutSource,
};

const JSON: &str = "application/json";

#[derive(Serialize)]
struct WirePredictRequest<'a> {
    model_name: &'a str,
    input: &'a [f64],
}

#[derive(Deserialize)]
struct WirePredictResponse {
    #[serde(default)]
    model_name: Option<String>,
    output: Vec<f64>,
    status: String,
}

/// Forwards predictions to a fixed backend URL.
///
/// The underlying connection pool is shared by all calls.
#[derive(Debug, Clone)]
pub struct HttpPredictClient {
    client: reqwest::Client,
    url: reqwest::Url,
    timeout: Duration,
    log_body_limit: usize,
}

impl HttpPredictClient {
    /// Build a client from the downstream settings.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client cannot be created.
    pub fn new(config: &DownstreamConfig) -> anyhow::Result<Self> {
        let url = reqwest::Url::parse(&config.url)
            .with_context(|| format!("invalid downstream URL '{}'", config.url))?;

        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self {
            client,
            url,
            timeout: config.timeout,
            log_body_limit: config.log_body_limit,
        })
    }

    #[must_use]
    pub fn url(&self) -> &reqwest::Url {
        &self.url
    }

    async fn exchange(
        &self,
        request: reqwest::Request,
    ) -> Result<(reqwest::StatusCode, Vec<u8>), ForwardError> {
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| ForwardError::Network {
                message: e.to_string(),
                timed_out: e.is_timeout(),
            })?;

        let status = response.status();
        // The body is read in full before the status is inspected.
        let body = response
            .bytes()
            .await
            .map_err(|e| ForwardError::BodyRead(e.to_string()))?;

        Ok((status, body.to_vec()))
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Render a body for logging, cutting it at `limit` bytes.
#[must_use]
pub fn truncate_for_log(body: &[u8], limit: usize) -> String {
    if body.len() <= limit {
        return String::from_utf8_lossy(body).into_owned();
    }
    format!(
        "{}... ({} bytes truncated)",
        String::from_utf8_lossy(&body[..limit]),
        body.len() - limit
    )
}

#[async_trait]
impl PredictionBackend for HttpPredictClient {
    async fn forward(
        &self,
        call: &CallContext,
        request: &PredictionRequest,
    ) -> Result<PredictionResponse, ForwardError> {
        let payload = serde_json::to_vec(&WirePredictRequest {
            model_name: request.model_name(),
            input: request.input(),
        })
        .map_err(|e| ForwardError::RequestBuild(e.to_string()))?;

        tracing::debug!(
            url = %self.url,
            model = %request.model_name(),
            body = %truncate_for_log(&payload, self.log_body_limit),
            "sending backend request"
        );

        let http_request = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, JSON)
            .header(ACCEPT, JSON)
            .body(payload)
            .build()
            .map_err(|e| ForwardError::RequestBuild(e.to_string()))?;

        let (wait, source) = call.effective_timeout(self.timeout);
        let started = Instant::now();

        let exchanged = tokio::select! {
            biased;
            () = call.cancel_token().cancelled() => {
                tracing::debug!(elapsed_ms = elapsed_ms(started), "backend request aborted by cancellation");
                return Err(ForwardError::Cancelled);
            }
            res = tokio::time::timeout(wait, self.exchange(http_request)) => res,
        };

        let Ok(result) = exchanged else {
            tracing::debug!(
                elapsed_ms = elapsed_ms(started),
                ?source,
                "backend request timed out"
            );
            return Err(match source {
                TimeoutSource::Deadline => ForwardError::DeadlineExceeded,
                TimeoutSource::Hard => ForwardError::Network {
                    message: format!(
                        "no response within {}",
                        humantime::format_duration(wait)
                    ),
                    timed_out: true,
                },
            });
        };
        let (status, body) = result?;

        tracing::debug!(
            status = status.as_u16(),
            elapsed_ms = elapsed_ms(started),
            body = %truncate_for_log(&body, self.log_body_limit),
            "backend response received"
        );

        if !status.is_success() {
            tracing::warn!(
                status = status.as_u16(),
                body = %truncate_for_log(&body, self.log_body_limit),
                "backend returned non-success status"
            );
            return Err(ForwardError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let wire: WirePredictResponse =
            serde_json::from_slice(&body).map_err(|e| ForwardError::Decode(e.to_string()))?;

        Ok(PredictionResponse {
            model_name: wire.model_name,
            output: wire.output,
            status: wire.status,
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn short_bodies_are_logged_whole() {
        assert_eq!(truncate_for_log(b"{\"a\":1}", 4096), "{\"a\":1}");
        assert_eq!(truncate_for_log(b"abcd", 4), "abcd");
    }

    #[test]
    fn long_bodies_are_truncated_with_suffix() {
        let body = vec![b'x'; 5000];
        let logged = truncate_for_log(&body, 4096);
        assert!(logged.starts_with(&"x".repeat(4096)));
        assert!(logged.ends_with("... (904 bytes truncated)"));
    }

    #[test]
    fn request_wire_shape() {
        let value = serde_json::to_value(WirePredictRequest {
            model_name: "m",
            input: &[1.0, 2.5],
        })
        .unwrap();
        assert_eq!(value, serde_json::json!({"model_name": "m", "input": [1.0, 2.5]}));
    }

    #[test]
    fn invalid_url_is_rejected() {
        let config = DownstreamConfig {
            url: "::not a url".to_owned(),
            ..DownstreamConfig::default()
        };
        assert!(HttpPredictClient::new(&config).is_err());
    }
}
