//! The persisted analysis of one video.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::assessment::{SegmentAssessment, Summary};
use crate::frame::CategorizedFrames;
use crate::metadata::{AudioMetadata, VideoMetadata};
use crate::review::Review;
use crate::section::Section;

/// Assessor output for every section plus the whole-video summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SectionAnalyses {
    pub opening: SegmentAssessment,
    pub setup: SegmentAssessment,
    pub main: SegmentAssessment,
    pub climax: SegmentAssessment,
    pub closing: SegmentAssessment,
    pub summary: Summary,
}

impl SectionAnalyses {
    /// Assemble from assessments given in `Section::ALL` order.
    pub fn new(assessments: [SegmentAssessment; 5], summary: Summary) -> Self {
        let [opening, setup, main, climax, closing] = assessments;
        Self {
            opening,
            setup,
            main,
            climax,
            closing,
            summary,
        }
    }

    pub fn get(&self, section: Section) -> &SegmentAssessment {
        match section {
            Section::Opening => &self.opening,
            Section::Setup => &self.setup,
            Section::Main => &self.main,
            Section::Climax => &self.climax,
            Section::Closing => &self.closing,
        }
    }
}

/// Complete analysis of one distinct video.
///
/// Created once per content identifier and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub metadata_video: VideoMetadata,
    pub metadata_audio: AudioMetadata,
    pub frames: CategorizedFrames,
    pub review: Review,
    pub analyze: SectionAnalyses,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::AssessmentIndicator;

    fn segment(name: &str) -> SegmentAssessment {
        SegmentAssessment {
            recommendations: vec![],
            assessment_indicators: vec![AssessmentIndicator::new(name, true)],
        }
    }

    #[test]
    fn test_section_analyses_keep_order() {
        let analyses = SectionAnalyses::new(
            [
                segment("a"),
                segment("b"),
                segment("c"),
                segment("d"),
                segment("e"),
            ],
            Summary {
                recommendations: vec![],
                assessment_indicators: vec![],
                summary: "A rental showcase".into(),
            },
        );
        assert_eq!(analyses.get(Section::Climax).assessment_indicators[0].name, "d");
        assert_eq!(analyses.get(Section::Opening).assessment_indicators[0].name, "a");
    }

    #[test]
    fn test_result_wire_names() {
        let result = AnalysisResult {
            metadata_video: VideoMetadata {
                duration: 30.0,
                width: 1080,
                height: 1920,
                format: "video/mp4".into(),
                size: 1024,
                url: "https://cdn/v.mp4".into(),
            },
            metadata_audio: AudioMetadata::new(Some(48000), Some(1), "https://cdn/a.wav"),
            frames: CategorizedFrames::default(),
            review: Review::from_counts(0, 0),
            analyze: SectionAnalyses::new(
                [segment("a"), segment("b"), segment("c"), segment("d"), segment("e")],
                Summary {
                    recommendations: vec![],
                    assessment_indicators: vec![],
                    summary: "x".into(),
                },
            ),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("metadataVideo").is_some());
        assert!(json.get("metadataAudio").is_some());
        assert_eq!(json["analyze"]["summary"]["summary"], "x");
        assert_eq!(json["review"]["totalReview"], 0);

        let back: AnalysisResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }
}
