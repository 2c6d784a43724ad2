//! The analysis pipeline.
//!
//! One run walks the stages in [`PipelineStage`] order. Every collaborator
//! call is bounded by its configured budget, fan-out groups fail fast, and
//! the scratch directory is removed on every exit path.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::try_join_all;
use reelscore_media::{content_hash, MediaError, ScratchDir};
use reelscore_models::{
    AnalysisResult, AudioMetadata, CategorizedFrames, ContentId, Frame, Section, SectionAnalyses,
    SegmentAssessment, VideoMetadata, VideoSubmission,
};
use tokio::sync::Semaphore;
use tracing::{debug, Instrument};

use crate::aggregate::aggregate;
use crate::collaborators::{CollaboratorError, CollaboratorResult, Collaborators, SaveOutcome};
use crate::config::PipelineConfig;
use crate::error::{ErrorKind, PipelineError, PipelineResult};
use crate::inflight::InFlightRegistry;
use crate::logging::JobLogger;
use crate::metrics::{record_frame_published, record_run, record_stage};
use crate::partition::partition;
use crate::prompts::{section_prompt, summary_prompt};
use crate::stage::PipelineStage;

const OPERATION: &str = "analyze_video";
const AUDIO_KEY_FILE: &str = "audio.wav";
const VIDEO_KEY_FILE: &str = "source.mp4";

/// Result of a successful request.
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    /// Served from the store without running the pipeline.
    AlreadyAnalyzed(AnalysisResult),
    /// Freshly computed and persisted.
    Analyzed(AnalysisResult),
}

impl AnalysisOutcome {
    pub fn result(&self) -> &AnalysisResult {
        match self {
            Self::AlreadyAnalyzed(r) | Self::Analyzed(r) => r,
        }
    }

    pub fn into_result(self) -> AnalysisResult {
        match self {
            Self::AlreadyAnalyzed(r) | Self::Analyzed(r) => r,
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, Self::AlreadyAnalyzed(_))
    }

    fn label(&self) -> &'static str {
        match self {
            Self::AlreadyAnalyzed(_) => "already_analyzed",
            Self::Analyzed(_) => "analyzed",
        }
    }
}

/// Records stage transitions for one run.
struct StageClock<'a> {
    logger: &'a JobLogger,
    last: Instant,
}

impl<'a> StageClock<'a> {
    fn new(logger: &'a JobLogger) -> Self {
        Self {
            logger,
            last: Instant::now(),
        }
    }

    fn advance(&mut self, stage: PipelineStage) {
        record_stage(stage, self.last.elapsed());
        self.last = Instant::now();
        self.logger.log_progress(stage.as_str());
    }
}

/// Await a collaborator call within `budget`, classifying its failure with `map`.
async fn bounded<T, F, M>(budget: Duration, kind: ErrorKind, fut: F, map: M) -> PipelineResult<T>
where
    F: Future<Output = CollaboratorResult<T>>,
    M: FnOnce(CollaboratorError) -> PipelineError,
{
    match tokio::time::timeout(budget, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(map(e)),
        Err(_) => Err(PipelineError::Timeout {
            kind,
            secs: budget.as_secs(),
        }),
    }
}

fn assessor_error(section: &str, e: CollaboratorError) -> PipelineError {
    match e {
        CollaboratorError::Malformed(msg) => PipelineError::malformed(section, msg),
        CollaboratorError::Failed(msg) => PipelineError::assessment(section, msg),
    }
}

fn media_io_error(e: MediaError) -> PipelineError {
    match e {
        MediaError::Io(io) => PipelineError::Io(io),
        other => PipelineError::Io(std::io::Error::other(other.to_string())),
    }
}

fn file_name(path: &Path) -> PipelineResult<&str> {
    path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| PipelineError::Extraction(format!("unusable file name {}", path.display())))
}

/// Runs the analysis pipeline against a set of collaborators.
pub struct Orchestrator {
    config: PipelineConfig,
    collaborators: Collaborators,
    inflight: InFlightRegistry,
}

impl Orchestrator {
    pub fn new(config: PipelineConfig, collaborators: Collaborators) -> PipelineResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            collaborators,
            inflight: InFlightRegistry::new(),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn inflight(&self) -> &InFlightRegistry {
        &self.inflight
    }

    /// Analyze one submission, or return the stored analysis of identical content.
    pub async fn analyze(
        &self,
        submission: &VideoSubmission,
        request_id: &str,
    ) -> PipelineResult<AnalysisOutcome> {
        let logger = JobLogger::new(request_id, OPERATION);
        let span = logger.create_span();

        let result = self.run(submission, &logger).instrument(span).await;
        match &result {
            Ok(outcome) => record_run(outcome.label()),
            Err(e) => {
                record_run(e.kind().as_str());
                if e.is_user_facing() {
                    logger.log_warning(&e.to_string());
                } else {
                    logger.log_error(&e.to_string());
                }
            }
        }
        result
    }

    async fn run(
        &self,
        submission: &VideoSubmission,
        logger: &JobLogger,
    ) -> PipelineResult<AnalysisOutcome> {
        let mut clock = StageClock::new(logger);
        logger.log_start(&format!(
            "{} ({} bytes, {})",
            submission.original_name.as_deref().unwrap_or("upload"),
            submission.size,
            submission.mime_type
        ));
        clock.advance(PipelineStage::Received);

        if submission.size == 0 {
            return Err(PipelineError::invalid_input("No file uploaded."));
        }
        if submission.mime_type != self.config.accepted_mime_type {
            return Err(PipelineError::invalid_input(
                "Invalid file type. Only MP4 files are allowed.",
            ));
        }
        clock.advance(PipelineStage::Validated);

        let id = content_hash(&submission.path).await.map_err(media_io_error)?;
        debug!(content_id = %id, "Computed content id");

        // Held until the result is persisted so a duplicate waits and then hits the store.
        let _claim = self.inflight.acquire(&id).await;

        if let Some(stored) = self.find_stored(&id).await? {
            logger.log_completion(&format!("{} already analyzed", id.short()));
            clock.advance(PipelineStage::Done);
            return Ok(AnalysisOutcome::AlreadyAnalyzed(stored));
        }
        clock.advance(PipelineStage::Deduplicated);

        let report = bounded(
            self.config.probe_timeout,
            ErrorKind::Probe,
            self.collaborators.probe.probe(&submission.path),
            |e| PipelineError::Probe(e.to_string()),
        )
        .await?;
        let video_stream = report
            .first_video_stream()
            .ok_or_else(|| PipelineError::Probe("no video stream found".to_string()))?;
        let duration = report
            .duration
            .ok_or_else(|| PipelineError::Probe("container reports no duration".to_string()))?;
        let (width, height) = video_stream
            .width
            .zip(video_stream.height)
            .ok_or_else(|| PipelineError::Probe("video stream reports no dimensions".to_string()))?;
        clock.advance(PipelineStage::Probed);

        if duration > self.config.max_video_duration_secs as f64 {
            return Err(PipelineError::DurationExceeded {
                duration,
                max_secs: self.config.max_video_duration_secs,
            });
        }
        clock.advance(PipelineStage::DurationChecked);

        let scratch = ScratchDir::create(&self.config.work_dir, id.short())
            .await
            .map_err(media_io_error)?;

        let frame_paths = bounded(
            self.config.extract_timeout,
            ErrorKind::Extraction,
            self.collaborators.frames.extract_frames(
                &submission.path,
                &scratch.frames_dir(),
                self.config.frame_interval_secs,
            ),
            |e| PipelineError::Extraction(e.to_string()),
        )
        .await?;
        logger.log_progress(&format!("extracted {} frames", frame_paths.len()));
        clock.advance(PipelineStage::FramesExtracted);

        let frames = self.publish_frames(&id, &frame_paths).await?;

        let audio_path = bounded(
            self.config.extract_timeout,
            ErrorKind::Extraction,
            self.collaborators
                .audio
                .extract_audio(&submission.path, &scratch.audio_dir()),
            |e| PipelineError::Extraction(e.to_string()),
        )
        .await?;
        clock.advance(PipelineStage::AudioExtracted);

        let audio_report = bounded(
            self.config.probe_timeout,
            ErrorKind::Probe,
            self.collaborators.probe.probe(&audio_path),
            |e| PipelineError::Probe(format!("audio track: {}", e)),
        )
        .await?;
        let audio_stream = audio_report.first_audio_stream();

        let audio_url = self
            .publish(&audio_path, &format!("{}/audio/{}", id, AUDIO_KEY_FILE), "audio/wav")
            .await?;
        let video_url = self
            .publish(
                &submission.path,
                &format!("{}/video/{}", id, VIDEO_KEY_FILE),
                &submission.mime_type,
            )
            .await?;
        clock.advance(PipelineStage::AssetsPublished);

        let transcript = bounded(
            self.config.transcribe_timeout,
            ErrorKind::Transcription,
            self.collaborators.transcriber.transcribe(&audio_path),
            |e| PipelineError::Transcription(e.to_string()),
        )
        .await?;
        clock.advance(PipelineStage::Transcribed);

        let categorized = partition(frames);
        let assessments = self.assess_sections(&categorized, &transcript).await?;
        clock.advance(PipelineStage::SectionsAssessed);

        let review = aggregate(&assessments);
        logger.log_progress(&format!(
            "review {}/{} positive",
            review.positive_review, review.total_review
        ));
        clock.advance(PipelineStage::Aggregated);

        let pairs: Vec<(Section, &SegmentAssessment)> =
            Section::ALL.into_iter().zip(assessments.iter()).collect();
        let summary_urls: Vec<&str> = categorized
            .urls()
            .into_iter()
            .take(self.config.summary_frame_limit)
            .collect();
        let prompt = summary_prompt(&pairs, &transcript, &summary_urls)?;
        let summary = bounded(
            self.config.assess_timeout,
            ErrorKind::Assessment,
            self.collaborators.assessor.summarize(&prompt),
            |e| assessor_error("summary", e),
        )
        .await?;
        clock.advance(PipelineStage::Summarized);

        let result = AnalysisResult {
            metadata_video: VideoMetadata {
                duration,
                width,
                height,
                format: submission.mime_type.clone(),
                size: submission.size,
                url: video_url,
            },
            metadata_audio: AudioMetadata::new(
                audio_stream.and_then(|s| s.sample_rate),
                audio_stream.and_then(|s| s.channels),
                audio_url,
            ),
            frames: categorized,
            review,
            analyze: SectionAnalyses::new(assessments, summary),
        };

        // Scratch files are no longer needed once everything is published.
        drop(scratch);

        let outcome = match bounded(
            self.config.store_timeout,
            ErrorKind::Store,
            self.collaborators.store.save(&id, &result),
            |e| PipelineError::Store(e.to_string()),
        )
        .await?
        {
            SaveOutcome::Created => AnalysisOutcome::Analyzed(result),
            SaveOutcome::AlreadyExists(stored) => {
                logger.log_warning(&format!(
                    "{} was stored by another writer first, returning stored result",
                    id.short()
                ));
                AnalysisOutcome::AlreadyAnalyzed(stored)
            }
        };
        clock.advance(PipelineStage::Persisted);

        logger.log_completion(&format!("{} analyzed", id.short()));
        clock.advance(PipelineStage::Done);
        Ok(outcome)
    }

    async fn find_stored(&self, id: &ContentId) -> PipelineResult<Option<AnalysisResult>> {
        bounded(
            self.config.store_timeout,
            ErrorKind::Store,
            self.collaborators.store.find(id),
            |e| PipelineError::Store(e.to_string()),
        )
        .await
    }

    async fn publish(&self, path: &Path, key: &str, content_type: &str) -> PipelineResult<String> {
        let asset = bounded(
            self.config.publish_timeout,
            ErrorKind::Publish,
            self.collaborators.publisher.publish(path, key, content_type),
            |e| PipelineError::Publish(format!("{}: {}", key, e)),
        )
        .await?;
        Ok(asset.public_url)
    }

    /// Publish every frame with bounded concurrency, keeping extraction order.
    async fn publish_frames(&self, id: &ContentId, paths: &[PathBuf]) -> PipelineResult<Vec<Frame>> {
        let permits = Arc::new(Semaphore::new(self.config.publish_concurrency));

        let uploads = paths.iter().enumerate().map(|(index, path)| {
            let permits = Arc::clone(&permits);
            async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|_| PipelineError::Publish("publish pool closed".to_string()))?;

                let key = format!("{}/frames/{}", id, file_name(path)?);
                let asset = bounded(
                    self.config.publish_timeout,
                    ErrorKind::Publish,
                    self.collaborators.publisher.publish(path, &key, "image/jpeg"),
                    |e| PipelineError::Publish(format!("{}: {}", key, e)),
                )
                .await?;
                record_frame_published();

                Ok::<_, PipelineError>(Frame {
                    url: asset.public_url,
                    name: asset.display_name,
                    timestamp: index as u32 + 1,
                })
            }
        });

        try_join_all(uploads).await
    }

    /// Assess all five sections concurrently. The first failure aborts the group.
    async fn assess_sections(
        &self,
        categorized: &CategorizedFrames,
        transcript: &str,
    ) -> PipelineResult<[SegmentAssessment; 5]> {
        let calls = Section::ALL.map(|section| {
            let urls: Vec<&str> = categorized.get(section).iter().map(|f| f.url.as_str()).collect();
            let prompt = section_prompt(section, &urls, transcript);
            async move {
                bounded(
                    self.config.assess_timeout,
                    ErrorKind::Assessment,
                    self.collaborators.assessor.assess_section(&prompt),
                    |e| assessor_error(section.as_str(), e),
                )
                .await
            }
        });

        let results = try_join_all(calls).await?;
        <[SegmentAssessment; 5]>::try_from(results)
            .map_err(|v| PipelineError::assessment("all", format!("expected 5 assessments, got {}", v.len())))
    }
}
