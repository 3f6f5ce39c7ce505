#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use inference_gateway::{
    GatewayConfig, GatewayMetrics, GatewayServer, HttpPredictClient, ShutdownReport,
};
use inference_gateway_sdk::{GrpcClientConfig, InferenceGrpcClient};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub fn config(downstream_url: String) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.server.listen_addr = "127.0.0.1:0".to_owned();
    config.server.metrics_addr = "127.0.0.1:0".to_owned();
    config.downstream.url = downstream_url;
    config.downstream.timeout = Duration::from_secs(5);
    config
}

/// A gateway serving on ephemeral ports until `shutdown` is called.
pub struct RunningGateway {
    pub grpc_addr: SocketAddr,
    pub metrics_addr: SocketAddr,
    pub metrics: GatewayMetrics,
    stop: Option<oneshot::Sender<()>>,
    pub handle: JoinHandle<ShutdownReport>,
}

impl RunningGateway {
    pub async fn start(config: GatewayConfig) -> Self {
        let backend = Arc::new(HttpPredictClient::new(&config.downstream).unwrap());
        let server = GatewayServer::bind(&config, backend).await.unwrap();
        let grpc_addr = server.grpc_addr();
        let metrics_addr = server.metrics_addr();
        let metrics = server.metrics().clone();

        let (stop, stopped) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve(async move {
            stopped.await.ok();
        }));

        Self {
            grpc_addr,
            metrics_addr,
            metrics,
            stop: Some(stop),
            handle,
        }
    }

    pub fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop.send(()).ok();
        }
    }

    pub async fn client(&self) -> InferenceGrpcClient {
        self.client_with(GrpcClientConfig::default()).await
    }

    pub async fn client_with(&self, cfg: GrpcClientConfig) -> InferenceGrpcClient {
        InferenceGrpcClient::connect(format!("http://{}", self.grpc_addr), &cfg)
            .await
            .unwrap()
    }
}
