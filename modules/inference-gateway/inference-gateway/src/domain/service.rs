use std::sync::Arc;

use super::call::CallContext;
use super::error::GatewayError;
use super::model::{PredictOutput, PredictionRequest};
use super::ports::PredictionBackend;

/// Validates a `Predict` call, forwards it and translates the backend reply.
#[derive(Clone)]
pub struct PredictionService {
    backend: Arc<dyn PredictionBackend>,
}

impl PredictionService {
    #[must_use]
    pub fn new(backend: Arc<dyn PredictionBackend>) -> Self {
        Self { backend }
    }

    /// Run one prediction.
    ///
    /// `input_data` must be a non-empty JSON array of numbers. The model name is opaque
    /// and passed through as is.
    ///
    /// # Errors
    /// Returns [`GatewayError`] for invalid input, a failed forward or an output that
    /// cannot be encoded.
    pub async fn predict(
        &self,
        call: &CallContext,
        model_name: String,
        input_data: &[u8],
    ) -> Result<PredictOutput, GatewayError> {
        let input = decode_input(input_data)?;
        tracing::debug!(model = %model_name, input_len = input.len(), "predict input validated");

        let request = PredictionRequest::new(model_name, input);
        let response = self.backend.forward(call, &request).await?;
        tracing::debug!(
            model = %request.model_name(),
            backend_status = %response.status,
            output_len = response.output.len(),
            "backend prediction received"
        );

        let output_data = serde_json::to_vec(&response.output)
            .map_err(|e| GatewayError::EncodeOutput(e.to_string()))?;

        Ok(PredictOutput {
            output_data,
            status: response.status,
        })
    }
}

fn decode_input(input_data: &[u8]) -> Result<Vec<f64>, GatewayError> {
    let input: Vec<f64> = serde_json::from_slice(input_data)
        .map_err(|e| GatewayError::InvalidInput(e.to_string()))?;
    if input.is_empty() {
        return Err(GatewayError::EmptyInput);
    }
    Ok(input)
}
