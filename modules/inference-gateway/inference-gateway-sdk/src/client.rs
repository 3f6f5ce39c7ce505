//! gRPC client implementation of `InferenceClientV1`

use std::time::Duration;

use async_trait::async_trait;
use tonic::transport::{Channel, Endpoint};

use crate::api::{InferenceClientV1, InferenceError, Prediction};
use crate::proto::PredictRequest;
use crate::proto::inference_client::InferenceClient;

/// Transport settings for [`InferenceGrpcClient`].
#[derive(Debug, Clone)]
pub struct GrpcClientConfig {
    /// Timeout for establishing the connection.
    pub connect_timeout: Duration,

    /// Deadline for every call: sent as `grpc-timeout` and enforced locally.
    pub rpc_timeout: Duration,
}

impl Default for GrpcClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            rpc_timeout: Duration::from_secs(10),
        }
    }
}

impl GrpcClientConfig {
    /// Set the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the per-call deadline.
    #[must_use]
    pub fn with_rpc_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout = timeout;
        self
    }
}

fn build_endpoint(uri: String, cfg: &GrpcClientConfig) -> Result<Endpoint, tonic::transport::Error> {
    let endpoint = Endpoint::from_shared(uri)?
        .connect_timeout(cfg.connect_timeout)
        .timeout(cfg.rpc_timeout)
        .tcp_keepalive(Some(Duration::from_secs(30)))
        .http2_keep_alive_interval(Duration::from_secs(30))
        .keep_alive_timeout(Duration::from_secs(10))
        .keep_alive_while_idle(true);

    Ok(endpoint)
}

/// gRPC client for the inference gateway.
#[derive(Clone)]
pub struct InferenceGrpcClient {
    inner: InferenceClient<Channel>,
    rpc_timeout: Duration,
}

impl InferenceGrpcClient {
    /// Connect to the gateway at `uri` (e.g. `http://127.0.0.1:50051`).
    ///
    /// # Errors
    /// Returns [`InferenceError::Transport`] if the URI is invalid or the connection fails.
    pub async fn connect(
        uri: impl Into<String>,
        cfg: &GrpcClientConfig,
    ) -> Result<Self, InferenceError> {
        let uri = uri.into();
        let endpoint =
            build_endpoint(uri.clone(), cfg).map_err(|e| InferenceError::Transport(e.to_string()))?;

        tracing::debug!(%uri, "connecting to inference gateway");
        let channel = endpoint
            .connect()
            .await
            .map_err(|e| InferenceError::Transport(format!("connect to {uri}: {e}")))?;

        Ok(Self::from_channel(channel, cfg.rpc_timeout))
    }

    /// Wrap an existing channel.
    #[must_use]
    pub fn from_channel(channel: Channel, rpc_timeout: Duration) -> Self {
        Self {
            inner: InferenceClient::new(channel),
            rpc_timeout,
        }
    }
}

/// Map a gRPC status returned by the gateway to an [`InferenceError`].
#[must_use]
pub fn status_to_error(status: &tonic::Status) -> InferenceError {
    let message = status.message().to_owned();
    match status.code() {
        tonic::Code::InvalidArgument => InferenceError::InvalidArgument(message),
        tonic::Code::Unavailable => InferenceError::Unavailable(message),
        tonic::Code::Internal => InferenceError::Internal(message),
        tonic::Code::Cancelled => InferenceError::Cancelled(message),
        tonic::Code::DeadlineExceeded => InferenceError::DeadlineExceeded(message),
        code => InferenceError::Transport(format!("{code:?}: {message}")),
    }
}

#[async_trait]
impl InferenceClientV1 for InferenceGrpcClient {
    async fn predict(&self, model_name: &str, input: &[f64]) -> Result<Prediction, InferenceError> {
        if input.iter().any(|v| !v.is_finite()) {
            return Err(InferenceError::InvalidArgument(
                "input must contain only finite numbers".to_owned(),
            ));
        }
        let input_data = serde_json::to_vec(input)
            .map_err(|e| InferenceError::InvalidArgument(format!("encode input: {e}")))?;

        let mut request = tonic::Request::new(PredictRequest {
            model_name: model_name.to_owned(),
            input_data,
        });
        request.set_timeout(self.rpc_timeout);

        let mut client = self.inner.clone();
        let response = client
            .predict(request)
            .await
            .map_err(|status| status_to_error(&status))?
            .into_inner();

        let output: Vec<f64> = serde_json::from_slice(&response.output_data)
            .map_err(|e| InferenceError::Internal(format!("decode output: {e}")))?;

        Ok(Prediction {
            output,
            status: response.status,
        })
    }
}
