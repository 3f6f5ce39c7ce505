//! Mapping of classified failures to `tonic::Status`.

use tonic::Status;

use crate::domain::{Classification, ErrorKind, GatewayError, classify};

/// Message returned for faults that must not leak detail.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal error";

#[must_use]
pub fn classification_to_status(classification: &Classification) -> Status {
    let message = classification.message.clone();
    match classification.kind {
        ErrorKind::InvalidArgument => Status::invalid_argument(message),
        ErrorKind::Unavailable => Status::unavailable(message),
        ErrorKind::Internal => Status::internal(message),
        ErrorKind::Cancelled => Status::cancelled(message),
        ErrorKind::DeadlineExceeded => Status::deadline_exceeded(message),
    }
}

#[must_use]
pub fn gateway_error_to_status(err: &GatewayError) -> Status {
    classification_to_status(&classify(err))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::domain::ForwardError;
    use tonic::Code;

    #[test]
    fn kinds_map_to_codes() {
        let cases = [
            (GatewayError::EmptyInput, Code::InvalidArgument),
            (
                GatewayError::Forward(ForwardError::Network {
                    message: "refused".to_owned(),
                    timed_out: false,
                }),
                Code::Unavailable,
            ),
            (
                GatewayError::Forward(ForwardError::Status {
                    status: 503,
                    body: String::new(),
                }),
                Code::Internal,
            ),
            (GatewayError::Forward(ForwardError::Cancelled), Code::Cancelled),
            (
                GatewayError::Forward(ForwardError::DeadlineExceeded),
                Code::DeadlineExceeded,
            ),
        ];
        for (err, code) in cases {
            assert_eq!(gateway_error_to_status(&err).code(), code, "{err}");
        }
    }

    #[test]
    fn backend_body_is_not_leaked() {
        let status = gateway_error_to_status(&GatewayError::Forward(ForwardError::Status {
            status: 422,
            body: "stack trace at line 12".to_owned(),
        }));
        assert_eq!(status.code(), Code::InvalidArgument);
        assert!(!status.message().contains("stack trace"));
        assert!(status.message().contains("422"));
    }
}
