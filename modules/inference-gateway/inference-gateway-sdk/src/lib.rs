//! Inference Gateway SDK
//!
//! This crate provides everything needed to call or implement the inference gateway:
//! - API trait (`InferenceClientV1`) and result type (`Prediction`)
//! - Error type (`InferenceError`)
//! - gRPC client (`InferenceGrpcClient`) with a per-call deadline
//! - Proto stubs for the server implementation
//!
//! ## Usage
//!
//! ```ignore
//! use inference_gateway_sdk::{GrpcClientConfig, InferenceClientV1, InferenceGrpcClient};
//!
//! let client = InferenceGrpcClient::connect("http://127.0.0.1:50051", &GrpcClientConfig::default()).await?;
//! let prediction = client.predict("iris", &[1.0, 2.0, 3.0]).await?;
//! println!("{:?} ({})", prediction.output, prediction.status);
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

// === API TRAIT AND TYPES ===
mod api;
pub use api::{InferenceClientV1, InferenceError, Prediction};

// === GRPC CLIENT ===
mod client;
pub use client::{GrpcClientConfig, InferenceGrpcClient, status_to_error};

// === GRPC PROTO STUBS (for server implementation) ===
/// Generated protobuf types for the Inference service
#[allow(clippy::pedantic)]
pub mod proto {
    tonic::include_proto!("inference.v1");
}

// Re-export proto types needed by server and client
pub use proto::inference_client::InferenceClient;
pub use proto::inference_server::{Inference, InferenceServer};
pub use proto::{PredictRequest, PredictResponse};

/// Fully qualified gRPC service name
pub const SERVICE_NAME: &str = "inference.v1.Inference";
