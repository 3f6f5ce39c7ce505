//! Inference gateway
//!
//! Serves the `inference.v1.Inference/Predict` RPC and forwards every call to an
//! HTTP prediction backend (`POST /predict`), with:
//! - input validation and outcome classification (`domain`)
//! - a cancellation-aware HTTP forwarding client (`infra`)
//! - Prometheus metrics and a liveness probe on a separate listener (`api::rest`)
//! - a lifecycle coordinator driving ordered, timed shutdown of both listeners (`server`)

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod api;
pub mod config;
pub mod domain;
pub mod infra;
pub mod lifecycle;
pub mod metrics;
pub mod server;


pub use config::{DownstreamConfig, GatewayConfig, ServerConfig, ShutdownConfig, parse_listen_addr};
pub use domain::{CallContext, PredictionBackend, PredictionService};
pub use infra::HttpPredictClient;
pub use lifecycle::{ShutdownSignals, StopOutcome};
pub use metrics::GatewayMetrics;
pub use server::{GatewayServer, ShutdownReport, ShutdownTrigger};
