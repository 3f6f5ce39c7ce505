use async_trait::async_trait;

use super::call::CallContext;
use super::error::ForwardError;
use super::model::{PredictionRequest, PredictionResponse};

/// Outbound port to the prediction backend.
///
/// Implementations must stop waiting as soon as `call` is cancelled or its deadline passes.
#[async_trait]
pub trait PredictionBackend: Send + Sync {
    async fn forward(
        &self,
        call: &CallContext,
        request: &PredictionRequest,
    ) -> Result<PredictionResponse, ForwardError>;
}
