use anyhow::Result;
use tokio::signal;

/// Signals that can trigger shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    #[cfg(unix)]
    Terminate,
}

/// Termination signal handlers, installed up front.
///
/// Install before serving so a failure aborts startup instead of surfacing as
/// an immediate shutdown. Signals delivered between install and [`recv`] are kept.
///
/// [`recv`]: ShutdownSignals::recv
pub struct ShutdownSignals {
    #[cfg(unix)]
    interrupt: signal::unix::Signal,
    #[cfg(unix)]
    terminate: signal::unix::Signal,
}

impl ShutdownSignals {
    /// Install handlers for interrupt (Ctrl+C) and, on unix, SIGTERM.
    ///
    /// # Errors
    /// Returns an error if a signal handler cannot be installed.
    #[cfg(unix)]
    pub fn install() -> Result<Self> {
        use signal::unix::{SignalKind, signal as unix_signal};

        let interrupt = unix_signal(SignalKind::interrupt()).map_err(|e| {
            tracing::error!(%e, "failed to install SIGINT handler");
            e
        })?;
        let terminate = unix_signal(SignalKind::terminate()).map_err(|e| {
            tracing::error!(%e, "failed to install SIGTERM handler");
            e
        })?;
        Ok(Self {
            interrupt,
            terminate,
        })
    }

    /// Install the Ctrl+C handler.
    ///
    /// # Errors
    /// Never fails on this platform; the handler is registered on first wait.
    #[cfg(not(unix))]
    #[allow(clippy::unnecessary_wraps)]
    pub fn install() -> Result<Self> {
        Ok(Self {})
    }

    /// Wait for the first termination signal.
    #[cfg(unix)]
    pub async fn recv(mut self) -> ShutdownSignal {
        let received = tokio::select! {
            _ = self.interrupt.recv() => ShutdownSignal::Interrupt,
            _ = self.terminate.recv() => ShutdownSignal::Terminate,
        };
        tracing::info!(signal = ?received, "shutdown signal received, initiating graceful shutdown");
        received
    }

    /// Wait for Ctrl+C. If the handler cannot be registered this never resolves.
    #[cfg(not(unix))]
    #[allow(clippy::unused_self)]
    pub async fn recv(self) -> ShutdownSignal {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(%e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        tracing::info!(signal = ?ShutdownSignal::Interrupt, "shutdown signal received, initiating graceful shutdown");
        ShutdownSignal::Interrupt
    }
}

#[cfg(all(test, unix))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn signal_sent_before_waiting_is_not_lost() {
        let signals = ShutdownSignals::install().unwrap();

        let status = std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        let received = tokio::time::timeout(Duration::from_secs(5), signals.recv())
            .await
            .expect("SIGTERM should be observed");
        assert_eq!(received, ShutdownSignal::Terminate);
    }
}
