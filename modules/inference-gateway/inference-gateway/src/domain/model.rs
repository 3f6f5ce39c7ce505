/// A validated prediction request, built once per call.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    model_name: String,
    input: Vec<f64>,
}

impl PredictionRequest {
    #[must_use]
    pub fn new(model_name: String, input: Vec<f64>) -> Self {
        Self { model_name, input }
    }

    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    #[must_use]
    pub fn input(&self) -> &[f64] {
        &self.input
    }
}

/// A decoded backend response.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResponse {
    /// Echoed model name; some backends omit it.
    pub model_name: Option<String>,
    pub output: Vec<f64>,
    pub status: String,
}

/// The translated reply handed back to the RPC layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictOutput {
    /// JSON-encoded output vector.
    pub output_data: Vec<u8>,
    pub status: String,
}
