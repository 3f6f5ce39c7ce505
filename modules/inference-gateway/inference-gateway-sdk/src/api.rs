//! Inference API trait and types
//!
//! Contract trait and types for callers of the inference gateway.

use async_trait::async_trait;

/// Result of a successful `Predict` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Output vector produced by the prediction backend.
    pub output: Vec<f64>,
    /// Backend status string, passed through verbatim.
    pub status: String,
}

/// Inference API trait
///
/// Issues a single prediction for `model_name` over the numeric `input` vector.
#[async_trait]
pub trait InferenceClientV1: Send + Sync {
    /// Run one prediction.
    ///
    /// # Errors
    /// Returns an [`InferenceError`] matching the gRPC status reported by the gateway,
    /// or [`InferenceError::Transport`] when the gateway could not be reached.
    async fn predict(&self, model_name: &str, input: &[f64]) -> Result<Prediction, InferenceError>;
}

/// Error type for inference operations
#[derive(thiserror::Error, Debug)]
pub enum InferenceError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("prediction backend unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("cancelled: {0}")]
    Cancelled(String),

    #[error("deadline exceeded: {0}")]
    DeadlineExceeded(String),

    #[error("gRPC transport error: {0}")]
    Transport(String),
}
