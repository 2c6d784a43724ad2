//! Production collaborators backed by the client crates.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reelscore_firestore::{AnalysisRepository, CreateOutcome};
use reelscore_media::{extract_audio, extract_frames, probe_media, ProbeReport};
use reelscore_models::{AnalysisResult, ContentId, SegmentAssessment, Summary};
use reelscore_openai::OpenAiClient;
use reelscore_storage::R2Client;

use crate::collaborators::{
    AnalysisStore, AssetPublisher, Assessor, AudioExtractor, CollaboratorResult, Collaborators,
    FrameExtractor, MediaProbe, PublishedAsset, SaveOutcome, Transcriber,
};
use crate::config::PipelineConfig;

/// ffprobe/ffmpeg on the local machine.
#[derive(Debug, Clone)]
pub struct FfmpegMedia {
    probe_timeout: Duration,
    extract_timeout_secs: u64,
}

impl FfmpegMedia {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            probe_timeout: config.probe_timeout,
            extract_timeout_secs: config.extract_timeout.as_secs(),
        }
    }
}

#[async_trait]
impl MediaProbe for FfmpegMedia {
    async fn probe(&self, path: &Path) -> CollaboratorResult<ProbeReport> {
        Ok(probe_media(path, self.probe_timeout).await?)
    }
}

#[async_trait]
impl FrameExtractor for FfmpegMedia {
    async fn extract_frames(
        &self,
        video: &Path,
        out_dir: &Path,
        interval_secs: u32,
    ) -> CollaboratorResult<Vec<PathBuf>> {
        Ok(extract_frames(video, out_dir, interval_secs, self.extract_timeout_secs).await?)
    }
}

#[async_trait]
impl AudioExtractor for FfmpegMedia {
    async fn extract_audio(&self, video: &Path, out_dir: &Path) -> CollaboratorResult<PathBuf> {
        Ok(extract_audio(video, out_dir, self.extract_timeout_secs).await?)
    }
}

/// Publishes assets to R2.
#[derive(Clone)]
pub struct R2Publisher {
    client: R2Client,
}

impl R2Publisher {
    pub fn new(client: R2Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AssetPublisher for R2Publisher {
    async fn publish(
        &self,
        path: &Path,
        key: &str,
        content_type: &str,
    ) -> CollaboratorResult<PublishedAsset> {
        let asset = self.client.publish_file(path, key, content_type).await?;
        Ok(PublishedAsset {
            public_url: asset.public_url,
            display_name: asset.display_name,
        })
    }
}

/// Whisper transcription and chat assessment.
#[derive(Clone)]
pub struct OpenAiServices {
    client: OpenAiClient,
}

impl OpenAiServices {
    pub fn new(client: OpenAiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transcriber for OpenAiServices {
    async fn transcribe(&self, audio: &Path) -> CollaboratorResult<String> {
        Ok(self.client.transcribe(audio).await?)
    }
}

#[async_trait]
impl Assessor for OpenAiServices {
    async fn assess_section(&self, prompt: &str) -> CollaboratorResult<SegmentAssessment> {
        Ok(self.client.assess_section(prompt).await?)
    }

    async fn summarize(&self, prompt: &str) -> CollaboratorResult<Summary> {
        Ok(self.client.summarize(prompt).await?)
    }
}

/// Firestore-backed result store.
#[derive(Clone)]
pub struct FirestoreStore {
    repo: AnalysisRepository,
}

impl FirestoreStore {
    pub fn new(repo: AnalysisRepository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl AnalysisStore for FirestoreStore {
    async fn find(&self, id: &ContentId) -> CollaboratorResult<Option<AnalysisResult>> {
        Ok(self.repo.find(id).await?)
    }

    async fn save(&self, id: &ContentId, result: &AnalysisResult) -> CollaboratorResult<SaveOutcome> {
        Ok(match self.repo.create(id, result).await? {
            CreateOutcome::Created => SaveOutcome::Created,
            CreateOutcome::AlreadyExists(stored) => SaveOutcome::AlreadyExists(stored),
        })
    }
}

impl Collaborators {
    /// Wire the production collaborators.
    pub fn production(
        config: &PipelineConfig,
        r2: R2Client,
        openai: OpenAiClient,
        repo: AnalysisRepository,
    ) -> Self {
        let media = Arc::new(FfmpegMedia::new(config));
        let openai = Arc::new(OpenAiServices::new(openai));
        Self {
            probe: media.clone(),
            frames: media.clone(),
            audio: media,
            publisher: Arc::new(R2Publisher::new(r2)),
            transcriber: openai.clone(),
            assessor: openai,
            store: Arc::new(FirestoreStore::new(repo)),
        }
    }
}
