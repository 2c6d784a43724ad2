//! Pipeline metrics.

use std::time::Duration;

use metrics::{counter, histogram};

use crate::stage::PipelineStage;

pub mod names {
    /// Completed runs by outcome (`analyzed`, `already_analyzed`, or an error kind).
    pub const RUNS_TOTAL: &str = "reelscore_pipeline_runs_total";
    /// Time spent reaching each stage from the previous one.
    pub const STAGE_DURATION_SECONDS: &str = "reelscore_pipeline_stage_duration_seconds";
    pub const FRAMES_PUBLISHED_TOTAL: &str = "reelscore_frames_published_total";
}

pub fn record_run(outcome: &'static str) {
    counter!(names::RUNS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_stage(stage: PipelineStage, elapsed: Duration) {
    histogram!(names::STAGE_DURATION_SECONDS, "stage" => stage.as_str()).record(elapsed.as_secs_f64());
}

pub fn record_frame_published() {
    counter!(names::FRAMES_PUBLISHED_TOTAL).increment(1);
}
