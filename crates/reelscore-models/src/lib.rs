//! Shared data models for ReelScore backend.
//!
//! This crate provides Serde-serializable types for:
//! - Content identifiers and submissions
//! - Media metadata for the source video and its audio track
//! - Frames and the five narrative sections they are bucketed into
//! - Assessor payloads (section assessments and summary)
//! - The aggregated review and the persisted analysis result

pub mod assessment;
pub mod content;
pub mod frame;
pub mod metadata;
pub mod result;
pub mod review;
pub mod section;

// Re-export common types
pub use assessment::{
    AssessmentIndicator, PayloadError, Recommendation, SegmentAssessment, Summary,
};
pub use content::{ContentId, ContentIdError, VideoSubmission};
pub use frame::{CategorizedFrames, Frame};
pub use metadata::{AudioMetadata, ChannelLayout, VideoMetadata};
pub use result::{AnalysisResult, SectionAnalyses};
pub use review::Review;
pub use section::Section;
