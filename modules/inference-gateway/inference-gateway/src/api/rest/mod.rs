//! Metrics and health HTTP surface, served on its own listener.

pub mod handlers;
pub mod routes;

pub use routes::router;
