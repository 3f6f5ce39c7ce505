//! Supervised listener tasks with bounded, escalating shutdown.
//!
//! Each listener runs as its own task and watches a `stop` token. Stopping a
//! listener cancels `stop`, waits up to the grace period for the task to finish,
//! then cancels that listener's `force` token (aborting its in-flight work) and aborts
//! the task. Listeners never share a `force` token.

pub mod signals;

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub use signals::{ShutdownSignal, ShutdownSignals};

/// How a listener ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Finished within the grace period.
    Graceful,
    /// Grace period elapsed; in-flight work was cancelled and the task aborted.
    Forced,
    /// The task had already ended before shutdown started.
    Exited,
}

/// A listener task under supervision.
pub struct Supervised {
    name: &'static str,
    stop: CancellationToken,
    force: CancellationToken,
    handle: JoinHandle<anyhow::Result<()>>,
    exited: bool,
}

impl Supervised {
    /// Spawn `serve`, handing it the token that requests a graceful stop.
    pub fn spawn<F, Fut>(name: &'static str, force: CancellationToken, serve: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let stop = CancellationToken::new();
        let handle = tokio::spawn(serve(stop.clone()));
        Self {
            name,
            stop,
            force,
            handle,
            exited: false,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Resolve when the task ends without having been asked to stop.
    ///
    /// # Errors
    /// Returns the task's own error, or an error if it panicked.
    pub async fn wait_exit(&mut self) -> anyhow::Result<()> {
        let joined = (&mut self.handle).await;
        self.exited = true;
        match joined {
            Ok(result) => result,
            Err(e) => Err(anyhow::anyhow!("{} listener task failed: {e}", self.name)),
        }
    }

    /// Request a graceful stop and escalate once `grace` elapses.
    pub async fn stop_with_grace(mut self, grace: Duration) -> StopOutcome {
        let name = self.name;
        if self.exited {
            tracing::debug!(listener = name, "listener already exited");
            return StopOutcome::Exited;
        }

        tracing::info!(
            listener = name,
            grace = %humantime::format_duration(grace),
            "stopping listener"
        );
        self.stop.cancel();

        match tokio::time::timeout(grace, &mut self.handle).await {
            Ok(Ok(Ok(()))) => {
                tracing::info!(listener = name, "listener stopped gracefully");
                StopOutcome::Graceful
            }
            Ok(Ok(Err(e))) => {
                tracing::warn!(listener = name, error = %e, "listener stopped with error");
                StopOutcome::Graceful
            }
            Ok(Err(e)) => {
                tracing::warn!(listener = name, error = %e, "listener task failed while stopping");
                StopOutcome::Graceful
            }
            Err(_) => {
                tracing::warn!(
                    listener = name,
                    "grace period elapsed, cancelling in-flight work"
                );
                self.force.cancel();
                self.handle.abort();
                if let Err(e) = self.handle.await
                    && e.is_panic()
                {
                    tracing::warn!(listener = name, error = %e, "listener panicked while aborting");
                }
                StopOutcome::Forced
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[tokio::test]
    async fn cooperative_task_stops_gracefully() {
        let task = Supervised::spawn("test", CancellationToken::new(), |stop| async move {
            stop.cancelled().await;
            Ok(())
        });

        assert_eq!(
            task.stop_with_grace(Duration::from_secs(1)).await,
            StopOutcome::Graceful
        );
    }

    #[tokio::test]
    async fn stubborn_task_is_forced_and_force_token_fires() {
        let force = CancellationToken::new();
        let task = Supervised::spawn("test", force.clone(), |_stop| async move {
            std::future::pending::<()>().await;
            Ok(())
        });

        let started = tokio::time::Instant::now();
        let outcome = task.stop_with_grace(Duration::from_millis(100)).await;

        assert_eq!(outcome, StopOutcome::Forced);
        assert!(force.is_cancelled());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn task_finishing_after_stop_within_grace_is_graceful() {
        let force = CancellationToken::new();
        let task = Supervised::spawn("test", force.clone(), |stop| async move {
            stop.cancelled().await;
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(())
        });

        let outcome = task.stop_with_grace(Duration::from_secs(2)).await;

        assert_eq!(outcome, StopOutcome::Graceful);
        assert!(!force.is_cancelled());
    }

    #[tokio::test]
    async fn early_exit_is_reported() {
        let mut task = Supervised::spawn("test", CancellationToken::new(), |_stop| async move {
            anyhow::bail!("address in use")
        });

        let err = task.wait_exit().await.unwrap_err();
        assert!(err.to_string().contains("address in use"));
        assert_eq!(
            task.stop_with_grace(Duration::from_secs(1)).await,
            StopOutcome::Exited
        );
    }
}
