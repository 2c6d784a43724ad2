//! External collaborator seams.
//!
//! The orchestrator only talks to the outside world through these traits,
//! held as `Arc<dyn Trait>` so tests can swap in in-memory fakes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use reelscore_firestore::FirestoreError;
use reelscore_media::{MediaError, ProbeReport};
use reelscore_models::{AnalysisResult, ContentId, SegmentAssessment, Summary};
use reelscore_openai::OpenAiError;
use reelscore_storage::StorageError;
use thiserror::Error;

/// Failure reported by a collaborator.
///
/// The orchestrator attaches the stage; collaborators only say whether the
/// call failed or answered with something unusable.
#[derive(Debug, Clone, Error)]
pub enum CollaboratorError {
    #[error("{0}")]
    Failed(String),

    #[error("{0}")]
    Malformed(String),
}

impl CollaboratorError {
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}

impl From<MediaError> for CollaboratorError {
    fn from(e: MediaError) -> Self {
        match e.stderr_tail() {
            Some(tail) => Self::Failed(format!("{}: {}", e, tail)),
            None => Self::Failed(e.to_string()),
        }
    }
}

impl From<StorageError> for CollaboratorError {
    fn from(e: StorageError) -> Self {
        Self::Failed(e.to_string())
    }
}

impl From<FirestoreError> for CollaboratorError {
    fn from(e: FirestoreError) -> Self {
        Self::Failed(e.to_string())
    }
}

impl From<OpenAiError> for CollaboratorError {
    fn from(e: OpenAiError) -> Self {
        match e {
            OpenAiError::MalformedResponse(msg) => Self::Malformed(msg),
            other => Self::Failed(other.to_string()),
        }
    }
}

pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

/// A published asset's public location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedAsset {
    pub public_url: String,
    /// File name without extension
    pub display_name: String,
}

/// Result of a create-only save.
#[derive(Debug, Clone)]
pub enum SaveOutcome {
    Created,
    /// A result was already stored under the identifier.
    AlreadyExists(AnalysisResult),
}

#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn probe(&self, path: &Path) -> CollaboratorResult<ProbeReport>;
}

#[async_trait]
pub trait FrameExtractor: Send + Sync {
    /// Returns frame paths sorted by file name, which is capture order.
    async fn extract_frames(
        &self,
        video: &Path,
        out_dir: &Path,
        interval_secs: u32,
    ) -> CollaboratorResult<Vec<PathBuf>>;
}

#[async_trait]
pub trait AudioExtractor: Send + Sync {
    /// Returns the path of the extracted WAV file.
    async fn extract_audio(&self, video: &Path, out_dir: &Path) -> CollaboratorResult<PathBuf>;
}

#[async_trait]
pub trait AssetPublisher: Send + Sync {
    async fn publish(
        &self,
        path: &Path,
        key: &str,
        content_type: &str,
    ) -> CollaboratorResult<PublishedAsset>;
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> CollaboratorResult<String>;
}

#[async_trait]
pub trait Assessor: Send + Sync {
    async fn assess_section(&self, prompt: &str) -> CollaboratorResult<SegmentAssessment>;
    async fn summarize(&self, prompt: &str) -> CollaboratorResult<Summary>;
}

#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn find(&self, id: &ContentId) -> CollaboratorResult<Option<AnalysisResult>>;
    async fn save(&self, id: &ContentId, result: &AnalysisResult) -> CollaboratorResult<SaveOutcome>;
}

/// Every collaborator the orchestrator needs.
#[derive(Clone)]
pub struct Collaborators {
    pub probe: Arc<dyn MediaProbe>,
    pub frames: Arc<dyn FrameExtractor>,
    pub audio: Arc<dyn AudioExtractor>,
    pub publisher: Arc<dyn AssetPublisher>,
    pub transcriber: Arc<dyn Transcriber>,
    pub assessor: Arc<dyn Assessor>,
    pub store: Arc<dyn AnalysisStore>,
}
