//! `grpc-timeout` header parsing.

use std::time::Duration;

use tokio::time::Instant;
use tonic::metadata::MetadataMap;

const GRPC_TIMEOUT_HEADER: &str = "grpc-timeout";

/// Parse a `grpc-timeout` value: up to 8 ASCII digits followed by a unit
/// (`H`, `M`, `S`, `m`, `u`, `n`).
#[must_use]
pub fn parse_grpc_timeout(value: &str) -> Option<Duration> {
    if value.len() < 2 || value.len() > 9 {
        return None;
    }
    let (digits, unit) = value.split_at(value.len() - 1);
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let amount: u64 = digits.parse().ok()?;
    let timeout = match unit {
        "H" => Duration::from_secs(amount.checked_mul(3600)?),
        "M" => Duration::from_secs(amount.checked_mul(60)?),
        "S" => Duration::from_secs(amount),
        "m" => Duration::from_millis(amount),
        "u" => Duration::from_micros(amount),
        "n" => Duration::from_nanos(amount),
        _ => return None,
    };
    Some(timeout)
}

/// The caller's deadline, if it sent a valid `grpc-timeout`.
#[must_use]
pub fn caller_deadline(metadata: &MetadataMap) -> Option<Instant> {
    let raw = metadata.get(GRPC_TIMEOUT_HEADER)?.to_str().ok()?;
    match parse_grpc_timeout(raw) {
        Some(timeout) => Instant::now().checked_add(timeout),
        None => {
            tracing::debug!(value = raw, "ignoring malformed grpc-timeout header");
            None
        }
    }
}
