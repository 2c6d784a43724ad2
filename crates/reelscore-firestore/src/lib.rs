//! Firestore REST API client.
//!
//! This crate provides:
//! - A document client with create-only writes and point reads
//! - Service account authentication via gcp_auth, or the unauthenticated emulator
//! - Retry with exponential backoff for transient failures
//! - The analysis repository used for deduplication and result persistence

pub mod analysis_repo;
pub mod client;
pub mod error;
pub mod metrics;
pub mod retry;
pub mod token_cache;
pub mod types;


pub use analysis_repo::{AnalysisRepository, CreateOutcome};
pub use client::{FirestoreClient, FirestoreConfig};
pub use error::{FirestoreError, FirestoreResult};
pub use retry::RetryConfig;
pub use types::{json_to_value, value_to_json, Document, Value};
