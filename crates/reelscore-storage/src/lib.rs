//! Cloudflare R2 storage client.
//!
//! This crate provides:
//! - File upload to R2 under content-addressed keys
//! - Public URL resolution for uploaded objects

pub mod client;
pub mod error;

pub use client::{PublishedAsset, R2Client, R2Config};
pub use error::{StorageError, StorageResult};
