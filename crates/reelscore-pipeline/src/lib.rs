//! Video analysis pipeline.
//!
//! This crate provides:
//! - The orchestrator that turns an uploaded video into a persisted analysis
//! - Collaborator traits and their production adapters
//! - Frame partitioning, review aggregation and assessor prompts
//! - In-process deduplication of concurrent runs for the same content
//! - Structured job logging and pipeline metrics

pub mod adapters;
pub mod aggregate;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod inflight;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod partition;
pub mod prompts;
pub mod stage;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

#[cfg(test)]
mod orchestrator_tests;

pub use aggregate::aggregate;
pub use collaborators::{
    AnalysisStore, AssetPublisher, Assessor, AudioExtractor, CollaboratorError,
    CollaboratorResult, Collaborators, FrameExtractor, MediaProbe, PublishedAsset, SaveOutcome,
    Transcriber,
};
pub use config::PipelineConfig;
pub use error::{ErrorKind, PipelineError, PipelineResult};
pub use inflight::{InFlightGuard, InFlightRegistry};
pub use logging::JobLogger;
pub use orchestrator::{AnalysisOutcome, Orchestrator};
pub use partition::{partition, section_for_index};
pub use stage::PipelineStage;
