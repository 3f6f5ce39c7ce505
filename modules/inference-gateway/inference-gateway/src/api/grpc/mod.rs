//! gRPC surface: the `Predict` handler, deadline parsing and status mapping.

pub mod deadline;
pub mod error;
pub mod server;

pub use server::InferenceServiceImpl;
