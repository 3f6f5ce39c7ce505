//! Domain layer: request/response model, call context, error taxonomy and the prediction service.

pub mod call;
pub mod error;
pub mod model;
pub mod outcome;
pub mod ports;
pub mod service;

pub use call::{CallContext, TimeoutSource};
pub use error::{ForwardError, GatewayError};
pub use model::{PredictOutput, PredictionRequest, PredictionResponse};
pub use outcome::{Classification, ErrorKind, OutcomeLabel, classify};
pub use ports::PredictionBackend;
pub use service::PredictionService;
