//! Pipeline states.

use std::fmt;

/// Linear progression of one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Received,
    Validated,
    Deduplicated,
    Probed,
    DurationChecked,
    FramesExtracted,
    AudioExtracted,
    AssetsPublished,
    Transcribed,
    SectionsAssessed,
    Aggregated,
    Summarized,
    Persisted,
    Done,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::Deduplicated => "deduplicated",
            Self::Probed => "probed",
            Self::DurationChecked => "duration_checked",
            Self::FramesExtracted => "frames_extracted",
            Self::AudioExtracted => "audio_extracted",
            Self::AssetsPublished => "assets_published",
            Self::Transcribed => "transcribed",
            Self::SectionsAssessed => "sections_assessed",
            Self::Aggregated => "aggregated",
            Self::Summarized => "summarized",
            Self::Persisted => "persisted",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
