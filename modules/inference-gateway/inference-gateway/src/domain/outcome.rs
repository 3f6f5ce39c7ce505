//! Outcome classification.
//!
//! Maps every failure on the prediction path to an RPC error kind, a caller-safe
//! message and the metrics label. Pure: no I/O, no logging.

use std::fmt;

use super::error::{ForwardError, GatewayError};

/// Terminal classification of a call, used as the `status` metrics label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeLabel {
    Ok,
    BadInput,
    EmptyInput,
    ApiError,
    InternalError,
}

impl OutcomeLabel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::BadInput => "bad-input",
            Self::EmptyInput => "empty-input",
            Self::ApiError => "api-error",
            Self::InternalError => "internal-error",
        }
    }
}

impl fmt::Display for OutcomeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RPC-level error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    Unavailable,
    Internal,
    Cancelled,
    DeadlineExceeded,
}

/// Result of classifying a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: ErrorKind,
    pub label: OutcomeLabel,
    /// Caller-visible message. Never contains backend bodies.
    pub message: String,
}

impl Classification {
    fn new(kind: ErrorKind, label: OutcomeLabel, message: impl Into<String>) -> Self {
        Self {
            kind,
            label,
            message: message.into(),
        }
    }
}

/// Classify a failed call.
#[must_use]
pub fn classify(err: &GatewayError) -> Classification {
    match err {
        GatewayError::InvalidInput(_) => Classification::new(
            ErrorKind::InvalidArgument,
            OutcomeLabel::BadInput,
            "input_data must be a JSON array of numbers",
        ),
        GatewayError::EmptyInput => Classification::new(
            ErrorKind::InvalidArgument,
            OutcomeLabel::EmptyInput,
            "input_data must not be empty",
        ),
        GatewayError::Forward(forward) => classify_forward(forward),
        GatewayError::EncodeOutput(_) => Classification::new(
            ErrorKind::Internal,
            OutcomeLabel::InternalError,
            "failed to encode prediction output",
        ),
    }
}

fn classify_forward(err: &ForwardError) -> Classification {
    let api = |kind, message: String| Classification::new(kind, OutcomeLabel::ApiError, message);
    match err {
        ForwardError::RequestBuild(_) => api(
            ErrorKind::Internal,
            "failed to build prediction backend request".to_owned(),
        ),
        ForwardError::Network { timed_out: true, .. } => api(
            ErrorKind::Unavailable,
            "prediction backend timed out".to_owned(),
        ),
        ForwardError::Network { .. } => api(
            ErrorKind::Unavailable,
            "prediction backend unavailable".to_owned(),
        ),
        ForwardError::BodyRead(_) => api(
            ErrorKind::Unavailable,
            "failed to read prediction backend response".to_owned(),
        ),
        ForwardError::Status { status, .. } if (400..500).contains(status) => api(
            ErrorKind::InvalidArgument,
            format!("prediction backend rejected the request with HTTP {status}"),
        ),
        ForwardError::Status { status, .. } => api(
            ErrorKind::Internal,
            format!("prediction backend failed with HTTP {status}"),
        ),
        ForwardError::Decode(_) => api(
            ErrorKind::Internal,
            "prediction backend returned an invalid response".to_owned(),
        ),
        ForwardError::Cancelled => api(ErrorKind::Cancelled, "request cancelled".to_owned()),
        ForwardError::DeadlineExceeded => api(
            ErrorKind::DeadlineExceeded,
            "deadline exceeded while waiting for the prediction backend".to_owned(),
        ),
    }
}
