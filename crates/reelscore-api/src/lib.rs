//! Axum HTTP API server.
//!
//! This crate provides:
//! - The video upload endpoint in front of the analysis pipeline
//! - Health and Prometheus metrics endpoints
//! - Security headers, request ids, request logging and CORS

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
