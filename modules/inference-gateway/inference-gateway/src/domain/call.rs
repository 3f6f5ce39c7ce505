//! Per-call cancellation and deadline context.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation and deadline inherited from the inbound RPC.
///
/// The forwarding client must honor both: it aborts the outbound call as soon as
/// `cancel` fires and never waits past `deadline`.
#[derive(Debug, Clone)]
pub struct CallContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

/// Which bound limits the wait on the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutSource {
    /// The configured hard timeout.
    Hard,
    /// The caller's deadline.
    Deadline,
}

impl CallContext {
    #[must_use]
    pub fn new(cancel: CancellationToken, deadline: Option<Instant>) -> Self {
        Self { cancel, deadline }
    }

    /// A context with a fresh token and no deadline.
    #[must_use]
    pub fn detached() -> Self {
        Self::new(CancellationToken::new(), None)
    }

    /// A context whose deadline is `timeout` from now.
    #[must_use]
    pub fn with_timeout(cancel: CancellationToken, timeout: Duration) -> Self {
        Self::new(cancel, Some(Instant::now() + timeout))
    }

    #[must_use]
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The time to wait on the backend: the smaller of `hard` and the time left until the deadline.
    #[must_use]
    pub fn effective_timeout(&self, hard: Duration) -> (Duration, TimeoutSource) {
        match self.deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining < hard {
                    (remaining, TimeoutSource::Deadline)
                } else {
                    (hard, TimeoutSource::Hard)
                }
            }
            None => (hard, TimeoutSource::Hard),
        }
    }
}
