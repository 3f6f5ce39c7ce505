//! Outbound adapters.

pub mod predict_client;

pub use predict_client::{HttpPredictClient, truncate_for_log};
