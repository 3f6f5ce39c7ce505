//! gRPC server implementation of `inference.v1.Inference`.
//!
//! The handler builds the per-call context, delegates to the domain
//! [`PredictionService`] and records exactly one metrics observation per call.

use std::panic::AssertUnwindSafe;
use std::time::Instant;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status};

use inference_gateway_sdk::{Inference, PredictRequest, PredictResponse};

use super::deadline::caller_deadline;
use super::error::{INTERNAL_ERROR_MESSAGE, classification_to_status};
use crate::domain::{CallContext, OutcomeLabel, PredictionService, classify};
use crate::metrics::{GatewayMetrics, METHOD_PREDICT};

/// gRPC service implementation that wraps the domain service.
#[derive(Clone)]
pub struct InferenceServiceImpl {
    service: PredictionService,
    metrics: GatewayMetrics,
    force_stop: CancellationToken,
}

impl InferenceServiceImpl {
    /// `force_stop` is cancelled when shutdown gives up waiting; every in-flight call
    /// derives its cancellation from it.
    #[must_use]
    pub fn new(
        service: PredictionService,
        metrics: GatewayMetrics,
        force_stop: CancellationToken,
    ) -> Self {
        Self {
            service,
            metrics,
            force_stop,
        }
    }
}

#[tonic::async_trait]
impl Inference for InferenceServiceImpl {
    async fn predict(
        &self,
        request: Request<PredictRequest>,
    ) -> Result<Response<PredictResponse>, Status> {
        let observation = self.metrics.start(METHOD_PREDICT);
        let started = Instant::now();

        // Cancelled when this future is dropped, i.e. the caller went away.
        let cancel = self.force_stop.child_token();
        let _abort_on_drop = cancel.clone().drop_guard();
        let call = CallContext::new(cancel, caller_deadline(request.metadata()));

        let PredictRequest {
            model_name,
            input_data,
        } = request.into_inner();
        tracing::info!(
            model = %model_name,
            input_bytes = input_data.len(),
            has_deadline = call.deadline().is_some(),
            "predict request received"
        );

        let result = AssertUnwindSafe(self.service.predict(&call, model_name.clone(), &input_data))
            .catch_unwind()
            .await;

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match result {
            Ok(Ok(output)) => {
                observation.finish(OutcomeLabel::Ok);
                tracing::info!(
                    model = %model_name,
                    status = %output.status,
                    elapsed_ms,
                    outcome = %OutcomeLabel::Ok,
                    "predict completed"
                );
                Ok(Response::new(PredictResponse {
                    output_data: output.output_data,
                    status: output.status,
                }))
            }
            Ok(Err(err)) => {
                let classification = classify(&err);
                observation.finish(classification.label);
                tracing::warn!(
                    model = %model_name,
                    error = %err,
                    code = ?classification.kind,
                    elapsed_ms,
                    outcome = %classification.label,
                    "predict failed"
                );
                Err(classification_to_status(&classification))
            }
            Err(_) => {
                observation.finish(OutcomeLabel::InternalError);
                tracing::error!(
                    model = %model_name,
                    elapsed_ms,
                    outcome = %OutcomeLabel::InternalError,
                    "predict handler panicked"
                );
                Err(Status::internal(INTERNAL_ERROR_MESSAGE))
            }
        }
    }
}
