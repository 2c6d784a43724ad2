//! End-to-end orchestrator runs against in-memory collaborators.

use std::time::Duration;

use reelscore_media::content_hash;
use reelscore_models::{ContentId, VideoSubmission};
use tempfile::TempDir;

use crate::error::{ErrorKind, PipelineError};
use crate::orchestrator::{AnalysisOutcome, Orchestrator};
use crate::testing::{
    FakeAssessor, FakeCollaborators, FakeProbe, FakePublisher, FakeTranscriber, FAKE_CDN,
    INDICATOR_NAMES,
};
use crate::PipelineConfig;

struct Harness {
    _dir: TempDir,
    work_dir: std::path::PathBuf,
    submission: VideoSubmission,
}

impl Harness {
    async fn new() -> Self {
        Self::with_bytes(b"\x00\x00\x00\x18ftypmp42 scooter rental promo").await
    }

    async fn with_bytes(bytes: &[u8]) -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("upload.mp4");
        tokio::fs::write(&path, bytes).await.unwrap();
        let submission = VideoSubmission::new(&path, "video/mp4", bytes.len() as u64)
            .with_original_name("promo.mp4");
        Self {
            work_dir: dir.path().join("work"),
            _dir: dir,
            submission,
        }
    }

    fn config(&self) -> PipelineConfig {
        PipelineConfig {
            work_dir: self.work_dir.clone(),
            ..PipelineConfig::default()
        }
    }

    fn orchestrator(&self, fakes: &FakeCollaborators) -> Orchestrator {
        self.orchestrator_with(self.config(), fakes)
    }

    fn orchestrator_with(&self, config: PipelineConfig, fakes: &FakeCollaborators) -> Orchestrator {
        Orchestrator::new(config, fakes.collaborators()).unwrap()
    }

    async fn content_id(&self) -> ContentId {
        content_hash(&self.submission.path).await.unwrap()
    }

    async fn scratch_entries(&self) -> usize {
        match std::fs::read_dir(&self.work_dir) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }
}

fn timestamps<'a>(frames: impl Iterator<Item = &'a reelscore_models::Frame>) -> Vec<u32> {
    frames.map(|f| f.timestamp).collect()
}

#[tokio::test]
async fn test_full_run_thirty_frames() {
    let h = Harness::new().await;
    let fakes = FakeCollaborators::new(30);
    let orchestrator = h.orchestrator(&fakes);

    let outcome = orchestrator.analyze(&h.submission, "req-1").await.unwrap();
    assert!(matches!(outcome, AnalysisOutcome::Analyzed(_)));
    let result = outcome.into_result();
    let id = h.content_id().await;

    assert_eq!(timestamps(result.frames.opening.iter()), (1..=3).collect::<Vec<_>>());
    assert_eq!(timestamps(result.frames.setup.iter()), (4..=6).collect::<Vec<_>>());
    assert_eq!(timestamps(result.frames.main.iter()), (7..=18).collect::<Vec<_>>());
    assert_eq!(timestamps(result.frames.climax.iter()), (19..=27).collect::<Vec<_>>());
    assert_eq!(timestamps(result.frames.closing.iter()), (28..=30).collect::<Vec<_>>());

    let first = &result.frames.opening[0];
    assert_eq!(first.name, "frame-001");
    assert_eq!(first.url, format!("{}/{}/frames/frame-001.jpeg", FAKE_CDN, id));

    assert_eq!(result.metadata_video.duration, 30.0);
    assert_eq!(result.metadata_video.width, 1080);
    assert_eq!(result.metadata_video.height, 1920);
    assert_eq!(result.metadata_video.format, "video/mp4");
    assert_eq!(result.metadata_video.size, h.submission.size);
    assert_eq!(result.metadata_video.url, format!("{}/{}/video/source.mp4", FAKE_CDN, id));

    assert_eq!(result.metadata_audio.sample_rate, Some(44_100));
    assert_eq!(result.metadata_audio.channels, Some(2));
    assert_eq!(result.metadata_audio.url, format!("{}/{}/audio/audio.wav", FAKE_CDN, id));

    assert_eq!(result.review.total_review, 40);
    assert_eq!(result.review.positive_review, 40);
    assert_eq!(result.review.positive_percentage, 100.0);
    assert!(!result.analyze.summary.summary.is_empty());

    assert_eq!(fakes.store.get(&id), Some(result));
    assert_eq!(fakes.transcriber.calls(), 1);
    assert_eq!(fakes.assessor.section_prompts().len(), 5);
    assert_eq!(fakes.assessor.summary_calls(), 1);
}

#[tokio::test]
async fn test_publishes_with_expected_content_types() {
    let h = Harness::new().await;
    let fakes = FakeCollaborators::new(3);
    h.orchestrator(&fakes).analyze(&h.submission, "req-ct").await.unwrap();

    let id = h.content_id().await;
    let keys = fakes.publisher.keys();
    assert_eq!(keys.len(), 5);
    assert_eq!(
        fakes.publisher.content_type_of(&format!("{}/frames/frame-002.jpeg", id)).as_deref(),
        Some("image/jpeg")
    );
    assert_eq!(
        fakes.publisher.content_type_of(&format!("{}/audio/audio.wav", id)).as_deref(),
        Some("audio/wav")
    );
    assert_eq!(
        fakes.publisher.content_type_of(&format!("{}/video/source.mp4", id)).as_deref(),
        Some("video/mp4")
    );
}

#[tokio::test]
async fn test_section_prompts_carry_their_own_frames() {
    let h = Harness::new().await;
    let fakes = FakeCollaborators::new(30);
    h.orchestrator(&fakes).analyze(&h.submission, "req-prompts").await.unwrap();

    let prompts = fakes.assessor.section_prompts();
    let climax = prompts
        .iter()
        .find(|p| p.contains("Section under review: climax"))
        .unwrap();
    assert!(climax.contains("frame-019.jpeg"));
    assert!(climax.contains("frame-027.jpeg"));
    assert!(!climax.contains("frame-018.jpeg"));
    assert!(!climax.contains("frame-028.jpeg"));
    assert!(climax.contains("Rent a scooter today"));
}

#[tokio::test]
async fn test_second_submission_is_served_from_store() {
    let h = Harness::new().await;
    let fakes = FakeCollaborators::new(10);
    let orchestrator = h.orchestrator(&fakes);

    let first = orchestrator.analyze(&h.submission, "req-a").await.unwrap();
    let second = orchestrator.analyze(&h.submission, "req-b").await.unwrap();

    assert!(second.is_cached());
    assert_eq!(first.result(), second.result());
    assert_eq!(fakes.probe.calls(), 2, "video and audio probe of the first run only");
    assert_eq!(fakes.frames.calls(), 1);
    assert_eq!(fakes.transcriber.calls(), 1);
    assert_eq!(fakes.assessor.section_prompts().len(), 5);
    assert_eq!(fakes.store.saves(), 1);
}

#[tokio::test]
async fn test_cached_result_skips_every_collaborator() {
    let h = Harness::new().await;
    let seeded = FakeCollaborators::new(10);
    let stored = h
        .orchestrator(&seeded)
        .analyze(&h.submission, "seed")
        .await
        .unwrap()
        .into_result();

    let fakes = FakeCollaborators::new(10);
    fakes.store.insert(h.content_id().await, stored.clone());
    let outcome = h.orchestrator(&fakes).analyze(&h.submission, "req").await.unwrap();

    assert!(matches!(outcome, AnalysisOutcome::AlreadyAnalyzed(ref r) if *r == stored));
    assert_eq!(fakes.probe.calls(), 0);
    assert_eq!(fakes.frames.calls(), 0);
    assert!(fakes.publisher.keys().is_empty());
    assert_eq!(fakes.transcriber.calls(), 0);
    assert_eq!(fakes.store.saves(), 0);
}

#[tokio::test]
async fn test_rejects_wrong_mime_type_before_any_work() {
    let h = Harness::new().await;
    let fakes = FakeCollaborators::new(10);
    let mut submission = h.submission.clone();
    submission.mime_type = "video/quicktime".to_string();

    let err = h.orchestrator(&fakes).analyze(&submission, "req").await.unwrap_err();
    assert!(
        matches!(err, PipelineError::InvalidInput(ref m) if m == "Invalid file type. Only MP4 files are allowed.")
    );
    assert_eq!(fakes.store.finds(), 0);
    assert_eq!(fakes.probe.calls(), 0);
}

#[tokio::test]
async fn test_rejects_empty_upload() {
    let h = Harness::with_bytes(b"").await;
    let fakes = FakeCollaborators::new(10);

    let err = h.orchestrator(&fakes).analyze(&h.submission, "req").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(fakes.store.finds(), 0);
}

#[tokio::test]
async fn test_probe_failure_stops_pipeline() {
    let h = Harness::new().await;
    let fakes = FakeCollaborators::new(10).with_probe(FakeProbe::failing("moov atom not found"));

    let err = h.orchestrator(&fakes).analyze(&h.submission, "req").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Probe);
    assert!(err.to_string().contains("moov atom not found"));
    assert_eq!(fakes.frames.calls(), 0);
    assert!(fakes.store.is_empty());
}

#[tokio::test]
async fn test_missing_video_stream_is_probe_error() {
    let h = Harness::new().await;
    let fakes = FakeCollaborators::new(10).with_probe(FakeProbe::audio_only(30.0));

    let err = h.orchestrator(&fakes).analyze(&h.submission, "req").await.unwrap_err();
    assert!(matches!(err, PipelineError::Probe(ref m) if m.contains("no video stream")));
}

#[tokio::test]
async fn test_missing_dimensions_is_probe_error() {
    let h = Harness::new().await;
    let fakes = FakeCollaborators::new(10).with_probe(FakeProbe::without_dimensions(30.0));

    let err = h.orchestrator(&fakes).analyze(&h.submission, "req").await.unwrap_err();
    assert!(matches!(err, PipelineError::Probe(ref m) if m.contains("no dimensions")));
    assert_eq!(fakes.frames.calls(), 0);
    assert!(fakes.store.is_empty());
}

#[tokio::test]
async fn test_missing_duration_is_probe_error() {
    let h = Harness::new().await;
    let fakes = FakeCollaborators::new(10).with_probe(FakeProbe::without_duration());

    let err = h.orchestrator(&fakes).analyze(&h.submission, "req").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Probe);
    assert_eq!(fakes.frames.calls(), 0);
}

#[tokio::test]
async fn test_duration_over_limit_is_rejected() {
    let h = Harness::new().await;
    let fakes = FakeCollaborators::new(10).with_probe(FakeProbe::with_duration(250.0));

    let err = h.orchestrator(&fakes).analyze(&h.submission, "req").await.unwrap_err();
    match err {
        PipelineError::DurationExceeded { duration, max_secs } => {
            assert_eq!(duration, 250.0);
            assert_eq!(max_secs, 200);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(fakes.frames.calls(), 0);
    assert!(fakes.publisher.keys().is_empty());
    assert_eq!(h.scratch_entries().await, 0);
}

#[tokio::test]
async fn test_duration_at_limit_is_accepted() {
    let h = Harness::new().await;
    let fakes = FakeCollaborators::new(10).with_probe(FakeProbe::with_duration(200.0));

    let outcome = h.orchestrator(&fakes).analyze(&h.submission, "req").await.unwrap();
    assert_eq!(outcome.result().metadata_video.duration, 200.0);
}

#[tokio::test]
async fn test_section_failure_fails_the_run() {
    let h = Harness::new().await;
    let fakes = FakeCollaborators::new(30).with_assessor(
        FakeAssessor::new(INDICATOR_NAMES.len()).failing_on("Section under review: climax"),
    );

    let err = h.orchestrator(&fakes).analyze(&h.submission, "req").await.unwrap_err();
    assert!(matches!(err, PipelineError::Assessment { ref section, .. } if section == "climax"));
    assert_eq!(fakes.assessor.summary_calls(), 0);
    assert_eq!(fakes.store.saves(), 0);
}

#[tokio::test]
async fn test_malformed_section_answer() {
    let h = Harness::new().await;
    let fakes = FakeCollaborators::new(30).with_assessor(
        FakeAssessor::new(INDICATOR_NAMES.len()).malformed_on("Section under review: main"),
    );

    let err = h.orchestrator(&fakes).analyze(&h.submission, "req").await.unwrap_err();
    assert!(
        matches!(err, PipelineError::MalformedAssessorResponse { ref section, .. } if section == "main")
    );
    assert!(fakes.store.is_empty());
}

#[tokio::test]
async fn test_summary_failure_is_tagged_summary() {
    let h = Harness::new().await;
    let fakes = FakeCollaborators::new(10)
        .with_assessor(FakeAssessor::new(4).failing_on("Do NOT summarize"));

    let err = h.orchestrator(&fakes).analyze(&h.submission, "req").await.unwrap_err();
    assert!(matches!(err, PipelineError::Assessment { ref section, .. } if section == "summary"));
}

#[tokio::test]
async fn test_partial_indicators_aggregate() {
    let h = Harness::new().await;
    let fakes = FakeCollaborators::new(10).with_assessor(FakeAssessor::new(6));

    let result = h
        .orchestrator(&fakes)
        .analyze(&h.submission, "req")
        .await
        .unwrap()
        .into_result();
    assert_eq!(result.review.total_review, 40);
    assert_eq!(result.review.positive_review, 30);
    assert_eq!(result.review.positive_percentage, 75.0);
}

#[tokio::test]
async fn test_frame_publish_concurrency_is_bounded() {
    let h = Harness::new().await;
    let fakes = FakeCollaborators::new(30)
        .with_publisher(FakePublisher::with_delay(Duration::from_millis(20)));
    let config = PipelineConfig {
        publish_concurrency: 3,
        ..h.config()
    };

    let result = h
        .orchestrator_with(config, &fakes)
        .analyze(&h.submission, "req")
        .await
        .unwrap()
        .into_result();

    assert_eq!(fakes.publisher.peak_concurrency(), 3);
    assert_eq!(timestamps(result.frames.iter()), (1..=30).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_publish_failure_cleans_scratch() {
    let h = Harness::new().await;
    let fakes =
        FakeCollaborators::new(30).with_publisher(FakePublisher::failing_on("frame-017"));

    let err = h.orchestrator(&fakes).analyze(&h.submission, "req").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Publish);
    assert!(err.to_string().contains("frame-017.jpeg"));
    assert_eq!(fakes.transcriber.calls(), 0);
    assert_eq!(h.scratch_entries().await, 0);
}

#[tokio::test]
async fn test_scratch_removed_after_success() {
    let h = Harness::new().await;
    let fakes = FakeCollaborators::new(5);
    h.orchestrator(&fakes).analyze(&h.submission, "req").await.unwrap();

    assert_eq!(h.scratch_entries().await, 0);
    assert!(h.submission.path.exists(), "the upload itself belongs to the caller");
}

#[tokio::test]
async fn test_slow_transcription_times_out() {
    let h = Harness::new().await;
    let fakes = FakeCollaborators::new(5).with_transcriber(FakeTranscriber::slow(
        "too late",
        Duration::from_secs(5),
    ));
    let config = PipelineConfig {
        transcribe_timeout: Duration::from_secs(1),
        ..h.config()
    };

    let err = h
        .orchestrator_with(config, &fakes)
        .analyze(&h.submission, "req")
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Timeout { kind: ErrorKind::Transcription, secs: 1 }));
    assert_eq!(err.to_string(), "Transcription failed: timed out after 1s");
    assert!(fakes.store.is_empty());
}

#[tokio::test]
async fn test_transcription_failure() {
    let h = Harness::new().await;
    let fakes =
        FakeCollaborators::new(5).with_transcriber(FakeTranscriber::failing("quota exceeded"));

    let err = h.orchestrator(&fakes).analyze(&h.submission, "req").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transcription);
    assert_eq!(fakes.assessor.section_prompts().len(), 0);
}

#[tokio::test]
async fn test_concurrent_duplicates_run_once() {
    let h = Harness::new().await;
    let fakes = FakeCollaborators::new(10)
        .with_publisher(FakePublisher::with_delay(Duration::from_millis(5)));
    let orchestrator = h.orchestrator(&fakes);

    let (a, b) = tokio::join!(
        orchestrator.analyze(&h.submission, "req-a"),
        orchestrator.analyze(&h.submission, "req-b"),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.is_cached() as u8 + b.is_cached() as u8, 1);
    assert_eq!(a.result(), b.result());
    assert_eq!(fakes.frames.calls(), 1);
    assert_eq!(fakes.store.saves(), 1);
    assert!(orchestrator.inflight().is_empty());
}

#[tokio::test]
async fn test_lost_save_race_returns_stored_result() {
    let h = Harness::new().await;
    let seeded = FakeCollaborators::new(10).with_assessor(FakeAssessor::new(2));
    let winner = h
        .orchestrator(&seeded)
        .analyze(&h.submission, "other-process")
        .await
        .unwrap()
        .into_result();

    let fakes = FakeCollaborators::new(10);
    fakes.store.preempt_next_save(winner.clone());
    let outcome = h.orchestrator(&fakes).analyze(&h.submission, "req").await.unwrap();

    assert!(outcome.is_cached());
    assert_eq!(outcome.result(), &winner);
    assert_eq!(fakes.store.get(&h.content_id().await), Some(winner));
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let fakes = FakeCollaborators::new(1);
    let config = PipelineConfig {
        publish_concurrency: 0,
        ..PipelineConfig::default()
    };
    let err = Orchestrator::new(config, fakes.collaborators()).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Config);
}
