//! OpenAI client for the analysis pipeline.
//!
//! This crate provides:
//! - Whisper transcription of extracted audio
//! - JSON-mode chat completions for section assessments and the summary
//! - Payload validation so callers only ever see well-formed results

pub mod client;
pub mod config;
pub mod error;

pub use client::{strip_code_fence, OpenAiClient, SYSTEM_PROMPT};
pub use config::OpenAiConfig;
pub use error::{OpenAiError, OpenAiResult};
