//! Error types for the prediction path.

use thiserror::Error;

/// A failed forward to the prediction backend.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("failed to build backend request: {0}")]
    RequestBuild(String),

    #[error("backend request failed: {message}")]
    Network { message: String, timed_out: bool },

    #[error("backend returned HTTP {status}")]
    Status { status: u16, body: String },

    #[error("failed to read backend response body: {0}")]
    BodyRead(String),

    #[error("failed to decode backend response: {0}")]
    Decode(String),

    #[error("call cancelled before the backend replied")]
    Cancelled,

    #[error("caller deadline elapsed before the backend replied")]
    DeadlineExceeded,
}

/// A failed `Predict` call.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("input_data is not a JSON array of numbers: {0}")]
    InvalidInput(String),

    #[error("input_data must not be empty")]
    EmptyInput,

    #[error(transparent)]
    Forward(#[from] ForwardError),

    #[error("failed to encode output: {0}")]
    EncodeOutput(String),
}
