//! In-memory collaborators for exercising the orchestrator without ffmpeg,
//! object storage, an assessor or a database.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reelscore_media::{ProbeReport, StreamInfo};
use reelscore_models::{
    AnalysisResult, AssessmentIndicator, ContentId, Recommendation, SegmentAssessment, Summary,
};

use crate::collaborators::{
    AnalysisStore, AssetPublisher, Assessor, AudioExtractor, CollaboratorError,
    CollaboratorResult, Collaborators, FrameExtractor, MediaProbe, PublishedAsset, SaveOutcome,
    Transcriber,
};

/// Public URL prefix used by [`FakePublisher`].
pub const FAKE_CDN: &str = "https://cdn.test";

/// Names of the eight indicators every fake section assessment reports.
pub const INDICATOR_NAMES: [&str; 8] = [
    "Engaging Hook",
    "Effective Call to Action",
    "Rental Activity Footage",
    "Trending Music",
    "Visual Clarity",
    "Proper Video Format",
    "Content Relevance",
    "Local Context",
];

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

fn video_stream(dimensions: Option<(u32, u32)>) -> StreamInfo {
    StreamInfo {
        codec_type: "video".to_string(),
        codec_name: Some("h264".to_string()),
        width: dimensions.map(|(w, _)| w),
        height: dimensions.map(|(_, h)| h),
        sample_rate: None,
        channels: None,
    }
}

fn audio_stream(sample_rate: u32, channels: u32) -> StreamInfo {
    StreamInfo {
        codec_type: "audio".to_string(),
        codec_name: Some("pcm_s16le".to_string()),
        width: None,
        height: None,
        sample_rate: Some(sample_rate),
        channels: Some(channels),
    }
}

/// Reports a fixed video for any path and a 44.1kHz stereo track for `.wav` files.
pub struct FakeProbe {
    duration: Option<f64>,
    has_video: bool,
    dimensions: Option<(u32, u32)>,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl FakeProbe {
    pub fn with_duration(duration: f64) -> Self {
        Self {
            duration: Some(duration),
            has_video: true,
            dimensions: Some((1080, 1920)),
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn without_duration() -> Self {
        Self {
            duration: None,
            ..Self::with_duration(0.0)
        }
    }

    pub fn audio_only(duration: f64) -> Self {
        Self {
            has_video: false,
            ..Self::with_duration(duration)
        }
    }

    /// A video stream whose width and height are missing.
    pub fn without_dimensions(duration: f64) -> Self {
        Self {
            dimensions: None,
            ..Self::with_duration(duration)
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            failure: Some(msg.to_string()),
            ..Self::with_duration(0.0)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaProbe for FakeProbe {
    async fn probe(&self, path: &Path) -> CollaboratorResult<ProbeReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(msg) = &self.failure {
            return Err(CollaboratorError::failed(msg.clone()));
        }

        if path.extension().is_some_and(|ext| ext == "wav") {
            return Ok(ProbeReport {
                duration: self.duration,
                format_name: Some("wav".to_string()),
                size: None,
                streams: vec![audio_stream(44_100, 2)],
            });
        }

        let mut streams = vec![audio_stream(48_000, 2)];
        if self.has_video {
            streams.insert(0, video_stream(self.dimensions));
        }
        Ok(ProbeReport {
            duration: self.duration,
            format_name: Some("mov,mp4,m4a,3gp,3g2,mj2".to_string()),
            size: None,
            streams,
        })
    }
}

/// Writes `count` placeholder JPEG files named like ffmpeg's frame pattern.
pub struct FakeFrameExtractor {
    count: usize,
    calls: AtomicUsize,
}

impl FakeFrameExtractor {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FrameExtractor for FakeFrameExtractor {
    async fn extract_frames(
        &self,
        _video: &Path,
        out_dir: &Path,
        _interval_secs: u32,
    ) -> CollaboratorResult<Vec<PathBuf>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.count == 0 {
            return Err(CollaboratorError::failed("no frames were extracted"));
        }

        let mut paths = Vec::with_capacity(self.count);
        for i in 1..=self.count {
            let path = out_dir.join(format!("frame-{:03}.jpeg", i));
            tokio::fs::write(&path, [0xFF, 0xD8, 0xFF, 0xD9])
                .await
                .map_err(|e| CollaboratorError::failed(e.to_string()))?;
            paths.push(path);
        }
        Ok(paths)
    }
}

/// Writes an empty `audio.wav` into the output directory.
#[derive(Default)]
pub struct FakeAudioExtractor {
    calls: AtomicUsize,
}

impl FakeAudioExtractor {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioExtractor for FakeAudioExtractor {
    async fn extract_audio(&self, _video: &Path, out_dir: &Path) -> CollaboratorResult<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let path = out_dir.join("audio.wav");
        tokio::fs::write(&path, b"RIFF")
            .await
            .map_err(|e| CollaboratorError::failed(e.to_string()))?;
        Ok(path)
    }
}

/// Publishes to `https://cdn.test/{key}` and records what it saw.
#[derive(Default)]
pub struct FakePublisher {
    fail_on: Option<String>,
    delay: Option<Duration>,
    keys: Mutex<Vec<(String, String)>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl FakePublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any upload whose key contains `fragment`.
    pub fn failing_on(fragment: &str) -> Self {
        Self {
            fail_on: Some(fragment.to_string()),
            ..Self::default()
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Published keys in completion order.
    pub fn keys(&self) -> Vec<String> {
        lock(&self.keys).iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn content_type_of(&self, key: &str) -> Option<String> {
        lock(&self.keys)
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, ct)| ct.clone())
    }

    /// Highest number of uploads observed in progress at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetPublisher for FakePublisher {
    async fn publish(
        &self,
        path: &Path,
        key: &str,
        content_type: &str,
    ) -> CollaboratorResult<PublishedAsset> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.fail_on.as_deref().is_some_and(|f| key.contains(f)) {
            return Err(CollaboratorError::failed("upload rejected"));
        }

        lock(&self.keys).push((key.to_string(), content_type.to_string()));
        let display_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        Ok(PublishedAsset {
            public_url: format!("{}/{}", FAKE_CDN, key),
            display_name,
        })
    }
}

/// Returns a fixed transcript.
pub struct FakeTranscriber {
    transcript: String,
    delay: Option<Duration>,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl FakeTranscriber {
    pub fn new(transcript: &str) -> Self {
        Self {
            transcript: transcript.to_string(),
            delay: None,
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn slow(transcript: &str, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(transcript)
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            failure: Some(msg.to_string()),
            ..Self::new("")
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, _audio: &Path) -> CollaboratorResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.failure {
            Some(msg) => Err(CollaboratorError::failed(msg.clone())),
            None => Ok(self.transcript.clone()),
        }
    }
}

/// Answers every section with the eight standard indicators.
///
/// `positives` indicators (in [`INDICATOR_NAMES`] order) are true, the rest false.
pub struct FakeAssessor {
    positives: usize,
    fail_on: Option<String>,
    malformed_on: Option<String>,
    prompts: Mutex<Vec<String>>,
    summaries: AtomicUsize,
}

impl FakeAssessor {
    pub fn new(positives: usize) -> Self {
        Self {
            positives: positives.min(INDICATOR_NAMES.len()),
            fail_on: None,
            malformed_on: None,
            prompts: Mutex::new(Vec::new()),
            summaries: AtomicUsize::new(0),
        }
    }

    /// Fail any prompt containing `fragment`.
    pub fn failing_on(mut self, fragment: &str) -> Self {
        self.fail_on = Some(fragment.to_string());
        self
    }

    /// Answer with an unusable payload for any prompt containing `fragment`.
    pub fn malformed_on(mut self, fragment: &str) -> Self {
        self.malformed_on = Some(fragment.to_string());
        self
    }

    /// Section prompts received so far.
    pub fn section_prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    pub fn summary_calls(&self) -> usize {
        self.summaries.load(Ordering::SeqCst)
    }

    fn check(&self, prompt: &str) -> CollaboratorResult<()> {
        if self.fail_on.as_deref().is_some_and(|f| prompt.contains(f)) {
            return Err(CollaboratorError::failed("assessor unavailable"));
        }
        if self.malformed_on.as_deref().is_some_and(|f| prompt.contains(f)) {
            return Err(CollaboratorError::malformed("missing field `assessmentIndicators`"));
        }
        Ok(())
    }

    fn indicators(&self) -> Vec<AssessmentIndicator> {
        INDICATOR_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| AssessmentIndicator::new(*name, i < self.positives))
            .collect()
    }
}

#[async_trait]
impl Assessor for FakeAssessor {
    async fn assess_section(&self, prompt: &str) -> CollaboratorResult<SegmentAssessment> {
        lock(&self.prompts).push(prompt.to_string());
        tokio::task::yield_now().await;
        self.check(prompt)?;
        Ok(SegmentAssessment {
            recommendations: vec![Recommendation {
                point: "Show the price on screen".to_string(),
                example: "Overlay \"from $25/day\" while the scooter rolls out".to_string(),
            }],
            assessment_indicators: self.indicators(),
        })
    }

    async fn summarize(&self, prompt: &str) -> CollaboratorResult<Summary> {
        self.summaries.fetch_add(1, Ordering::SeqCst);
        self.check(prompt)?;
        Ok(Summary {
            recommendations: vec!["Open with the rental offer".to_string()],
            assessment_indicators: vec![AssessmentIndicator::new("Content Relevance", true)],
            summary: "A scooter rental shop shows its fleet and a ride along the coast.".to_string(),
        })
    }
}

/// Create-only in-memory store.
#[derive(Default)]
pub struct MemoryStore {
    results: Mutex<HashMap<ContentId, AnalysisResult>>,
    preempt: Mutex<Option<AnalysisResult>>,
    finds: AtomicUsize,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: ContentId, result: AnalysisResult) {
        lock(&self.results).insert(id, result);
    }

    /// Simulate another process storing `result` between our lookup and our save.
    pub fn preempt_next_save(&self, result: AnalysisResult) {
        *lock(&self.preempt) = Some(result);
    }

    pub fn get(&self, id: &ContentId) -> Option<AnalysisResult> {
        lock(&self.results).get(id).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.results).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn finds(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisStore for MemoryStore {
    async fn find(&self, id: &ContentId) -> CollaboratorResult<Option<AnalysisResult>> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        Ok(self.get(id))
    }

    async fn save(&self, id: &ContentId, result: &AnalysisResult) -> CollaboratorResult<SaveOutcome> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        let mut results = lock(&self.results);
        if let Some(other) = lock(&self.preempt).take() {
            results.insert(id.clone(), other);
        }
        match results.get(id) {
            Some(stored) => Ok(SaveOutcome::AlreadyExists(stored.clone())),
            None => {
                results.insert(id.clone(), result.clone());
                Ok(SaveOutcome::Created)
            }
        }
    }
}

/// A full set of fakes with handles kept for assertions.
pub struct FakeCollaborators {
    pub probe: Arc<FakeProbe>,
    pub frames: Arc<FakeFrameExtractor>,
    pub audio: Arc<FakeAudioExtractor>,
    pub publisher: Arc<FakePublisher>,
    pub transcriber: Arc<FakeTranscriber>,
    pub assessor: Arc<FakeAssessor>,
    pub store: Arc<MemoryStore>,
}

impl FakeCollaborators {
    /// A 30 second video sampled into `frames` frames, every indicator positive.
    pub fn new(frames: usize) -> Self {
        Self {
            probe: Arc::new(FakeProbe::with_duration(30.0)),
            frames: Arc::new(FakeFrameExtractor::new(frames)),
            audio: Arc::new(FakeAudioExtractor::default()),
            publisher: Arc::new(FakePublisher::new()),
            transcriber: Arc::new(FakeTranscriber::new("Rent a scooter today, link in bio.")),
            assessor: Arc::new(FakeAssessor::new(INDICATOR_NAMES.len())),
            store: Arc::new(MemoryStore::new()),
        }
    }

    pub fn with_probe(mut self, probe: FakeProbe) -> Self {
        self.probe = Arc::new(probe);
        self
    }

    pub fn with_publisher(mut self, publisher: FakePublisher) -> Self {
        self.publisher = Arc::new(publisher);
        self
    }

    pub fn with_transcriber(mut self, transcriber: FakeTranscriber) -> Self {
        self.transcriber = Arc::new(transcriber);
        self
    }

    pub fn with_assessor(mut self, assessor: FakeAssessor) -> Self {
        self.assessor = Arc::new(assessor);
        self
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            probe: self.probe.clone(),
            frames: self.frames.clone(),
            audio: self.audio.clone(),
            publisher: self.publisher.clone(),
            transcriber: self.transcriber.clone(),
            assessor: self.assessor.clone(),
            store: self.store.clone(),
        }
    }
}
