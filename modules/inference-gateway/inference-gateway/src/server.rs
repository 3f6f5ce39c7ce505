//! Gateway process: binds both listeners, serves them, and coordinates shutdown.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;

use inference_gateway_sdk::InferenceServer;

use crate::api::grpc::InferenceServiceImpl;
use crate::api::rest;
use crate::config::{GatewayConfig, ShutdownConfig, parse_listen_addr};
use crate::domain::{PredictionBackend, PredictionService};
use crate::lifecycle::{StopOutcome, Supervised};
use crate::metrics::GatewayMetrics;

/// What started the shutdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownTrigger {
    /// The shutdown future resolved (a termination signal in production).
    Requested,
    /// A listener ended on its own.
    ListenerExited { listener: &'static str, error: String },
}

/// Result of a completed shutdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    pub trigger: ShutdownTrigger,
    pub grpc: StopOutcome,
    pub metrics: StopOutcome,
}

/// Both listeners, bound and ready to serve.
pub struct GatewayServer {
    shutdown: ShutdownConfig,
    grpc_listener: TcpListener,
    metrics_listener: TcpListener,
    grpc_addr: SocketAddr,
    metrics_addr: SocketAddr,
    service: InferenceServiceImpl,
    metrics: GatewayMetrics,
    force_stop: CancellationToken,
}

impl GatewayServer {
    /// Bind the gRPC and metrics listeners.
    ///
    /// Nothing is served until [`GatewayServer::serve`]; a bind failure on either
    /// listener leaves no listener running.
    ///
    /// # Errors
    /// Returns an error if an address is invalid, a port cannot be bound or the
    /// metrics cannot be registered.
    pub async fn bind(
        config: &GatewayConfig,
        backend: Arc<dyn PredictionBackend>,
    ) -> anyhow::Result<Self> {
        let grpc_addr = parse_listen_addr(&config.server.listen_addr)
            .context("invalid gRPC listen address")?;
        let metrics_addr = parse_listen_addr(&config.server.metrics_addr)
            .context("invalid metrics listen address")?;

        let grpc_listener = TcpListener::bind(grpc_addr)
            .await
            .with_context(|| format!("failed to bind gRPC listener on {grpc_addr}"))?;
        let metrics_listener = TcpListener::bind(metrics_addr)
            .await
            .with_context(|| format!("failed to bind metrics listener on {metrics_addr}"))?;

        let grpc_addr = grpc_listener.local_addr()?;
        let metrics_addr = metrics_listener.local_addr()?;

        let metrics = GatewayMetrics::new().context("failed to register metrics")?;
        let force_stop = CancellationToken::new();
        let service = InferenceServiceImpl::new(
            PredictionService::new(backend),
            metrics.clone(),
            force_stop.clone(),
        );

        Ok(Self {
            shutdown: config.shutdown.clone(),
            grpc_listener,
            metrics_listener,
            grpc_addr,
            metrics_addr,
            service,
            metrics,
            force_stop,
        })
    }

    /// Bound gRPC address (resolves port 0).
    #[must_use]
    pub fn grpc_addr(&self) -> SocketAddr {
        self.grpc_addr
    }

    /// Bound metrics and health address.
    #[must_use]
    pub fn metrics_addr(&self) -> SocketAddr {
        self.metrics_addr
    }

    #[must_use]
    pub fn metrics(&self) -> &GatewayMetrics {
        &self.metrics
    }

    /// Serve until `shutdown` resolves or a listener exits, then stop both listeners
    /// concurrently, each within its own grace period.
    pub async fn serve<S>(self, shutdown: S) -> ShutdownReport
    where
        S: Future<Output = ()> + Send,
    {
        let Self {
            shutdown: grace,
            grpc_listener,
            metrics_listener,
            grpc_addr,
            metrics_addr,
            service,
            metrics,
            force_stop,
        } = self;

        let mut grpc = Supervised::spawn("grpc", force_stop, move |stop| async move {
            tracing::info!(%grpc_addr, transport = "tcp", "gRPC listener serving");
            Server::builder()
                .add_service(InferenceServer::new(service))
                .serve_with_incoming_shutdown(TcpListenerStream::new(grpc_listener), async move {
                    stop.cancelled().await;
                })
                .await
                .context("gRPC server failed")
        });

        // In-flight calls hang off `force_stop`; only the gRPC grace may cancel them.
        let mut metrics_listener_task =
            Supervised::spawn("metrics", CancellationToken::new(), move |stop| async move {
                tracing::info!(%metrics_addr, "metrics listener serving");
                axum::serve(metrics_listener, rest::router(metrics))
                    .with_graceful_shutdown(async move { stop.cancelled().await })
                    .await
                    .context("metrics server failed")
            });

        let (grpc_name, metrics_name) = (grpc.name(), metrics_listener_task.name());
        let trigger = tokio::select! {
            () = shutdown => ShutdownTrigger::Requested,
            result = grpc.wait_exit() => listener_exited(grpc_name, result),
            result = metrics_listener_task.wait_exit() => listener_exited(metrics_name, result),
        };

        let (metrics_outcome, grpc_outcome) = tokio::join!(
            metrics_listener_task.stop_with_grace(grace.metrics_grace),
            grpc.stop_with_grace(grace.grpc_grace),
        );

        tracing::info!(
            grpc = ?grpc_outcome,
            metrics = ?metrics_outcome,
            "shutdown complete"
        );

        ShutdownReport {
            trigger,
            grpc: grpc_outcome,
            metrics: metrics_outcome,
        }
    }
}

fn listener_exited(listener: &'static str, result: anyhow::Result<()>) -> ShutdownTrigger {
    let error = match result {
        Ok(()) => "exited unexpectedly".to_owned(),
        Err(e) => format!("{e:#}"),
    };
    tracing::error!(listener, %error, "listener stopped before shutdown was requested");
    ShutdownTrigger::ListenerExited { listener, error }
}
