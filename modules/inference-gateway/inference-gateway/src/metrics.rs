//! Prometheus metrics for the prediction path.
//!
//! Collected metrics:
//! - `inference_requests_total{method,status}`: handled calls by outcome (counter)
//! - `inference_request_duration_seconds{method}`: call latency (histogram)
//!
//! Every instance owns its own [`Registry`]; nothing is registered globally.

use std::sync::Arc;
use std::time::Instant;

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

use crate::domain::OutcomeLabel;

/// `method` label value for the `Predict` RPC.
pub const METHOD_PREDICT: &str = "Predict";

struct Inner {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration: HistogramVec,
}

/// Concurrency-safe request metrics, cheap to clone.
#[derive(Clone)]
pub struct GatewayMetrics {
    inner: Arc<Inner>,
}

impl GatewayMetrics {
    /// Create the metrics and register them with a fresh registry.
    ///
    /// # Errors
    /// Returns an error if a metric cannot be registered.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("inference_requests_total", "Total inference requests by outcome"),
            &["method", "status"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "inference_request_duration_seconds",
                "Inference request latency in seconds",
            ),
            &["method"],
        )?;
        registry.register(Box::new(request_duration.clone()))?;

        Ok(Self {
            inner: Arc::new(Inner {
                registry,
                requests_total,
                request_duration,
            }),
        })
    }

    /// Record one finished call.
    pub fn observe(&self, method: &str, outcome: OutcomeLabel, elapsed_secs: f64) {
        self.inner
            .requests_total
            .with_label_values(&[method, outcome.as_str()])
            .inc();
        self.inner
            .request_duration
            .with_label_values(&[method])
            .observe(elapsed_secs);
    }

    /// Start timing a call. The returned guard records exactly once.
    #[must_use]
    pub fn start(&self, method: &'static str) -> Observation {
        Observation {
            metrics: self.clone(),
            method,
            started: Instant::now(),
            recorded: false,
        }
    }

    /// Current count for `(method, outcome)`.
    #[must_use]
    pub fn requests_total(&self, method: &str, outcome: OutcomeLabel) -> u64 {
        self.inner
            .requests_total
            .with_label_values(&[method, outcome.as_str()])
            .get()
    }

    /// Number of latency observations for `method`.
    #[must_use]
    pub fn duration_count(&self, method: &str) -> u64 {
        self.inner
            .request_duration
            .with_label_values(&[method])
            .get_sample_count()
    }

    /// Render all metrics in the Prometheus text format.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// In-flight call timer.
///
/// Call [`Observation::finish`] with the terminal label. If the guard is dropped
/// unfinished, the call was abandoned by its caller and is recorded as `api-error`.
pub struct Observation {
    metrics: GatewayMetrics,
    method: &'static str,
    started: Instant,
    recorded: bool,
}

impl Observation {
    pub fn finish(mut self, outcome: OutcomeLabel) {
        self.record(outcome);
    }

    fn record(&mut self, outcome: OutcomeLabel) {
        if self.recorded {
            return;
        }
        self.recorded = true;
        self.metrics
            .observe(self.method, outcome, self.started.elapsed().as_secs_f64());
    }
}

impl Drop for Observation {
    fn drop(&mut self) {
        self.record(OutcomeLabel::ApiError);
    }
}
