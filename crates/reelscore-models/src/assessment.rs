//! Assessor payloads.
//!
//! These arrive as free-form JSON from an external model, so deserialization
//! is followed by an explicit `validate()` pass before anything downstream
//! reads them.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single rubric check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AssessmentIndicator {
    pub name: String,
    pub value: bool,
}

impl AssessmentIndicator {
    pub fn new(name: impl Into<String>, value: bool) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A concrete improvement suggestion for one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Recommendation {
    pub point: String,
    pub example: String,
}

/// Structured assessment of one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SegmentAssessment {
    pub recommendations: Vec<Recommendation>,
    pub assessment_indicators: Vec<AssessmentIndicator>,
}

/// Whole-video narrative summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub recommendations: Vec<String>,
    pub assessment_indicators: Vec<AssessmentIndicator>,
    pub summary: String,
}

/// Reason an assessor payload was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("indicator #{0} has an empty name")]
    EmptyIndicatorName(usize),

    #[error("recommendation #{0} has an empty point")]
    EmptyRecommendation(usize),

    #[error("summary text is empty")]
    EmptySummary,
}

fn validate_indicators(indicators: &[AssessmentIndicator]) -> Result<(), PayloadError> {
    match indicators.iter().position(|i| i.name.trim().is_empty()) {
        Some(idx) => Err(PayloadError::EmptyIndicatorName(idx)),
        None => Ok(()),
    }
}

impl SegmentAssessment {
    pub fn validate(&self) -> Result<(), PayloadError> {
        validate_indicators(&self.assessment_indicators)?;
        if let Some(idx) = self
            .recommendations
            .iter()
            .position(|r| r.point.trim().is_empty())
        {
            return Err(PayloadError::EmptyRecommendation(idx));
        }
        Ok(())
    }

    /// Number of indicators that passed.
    pub fn positive_count(&self) -> usize {
        self.assessment_indicators.iter().filter(|i| i.value).count()
    }
}

impl Summary {
    pub fn validate(&self) -> Result<(), PayloadError> {
        validate_indicators(&self.assessment_indicators)?;
        if let Some(idx) = self.recommendations.iter().position(|r| r.trim().is_empty()) {
            return Err(PayloadError::EmptyRecommendation(idx));
        }
        if self.summary.trim().is_empty() {
            return Err(PayloadError::EmptySummary);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_segment_parses_wire_shape() {
        let payload = json!({
            "recommendations": [{"point": "Tighter hook", "example": "Open on the car keys"}],
            "assessmentIndicators": [
                {"name": "Engaging Hook", "value": true},
                {"name": "Visual Clarity", "value": false}
            ],
            "extra": "ignored"
        });
        let segment: SegmentAssessment = serde_json::from_value(payload).unwrap();
        assert!(segment.validate().is_ok());
        assert_eq!(segment.positive_count(), 1);
    }

    #[test]
    fn test_segment_rejects_missing_indicators() {
        let payload = json!({"recommendations": []});
        assert!(serde_json::from_value::<SegmentAssessment>(payload).is_err());
    }

    #[test]
    fn test_segment_rejects_non_boolean_value() {
        let payload = json!({
            "recommendations": [],
            "assessmentIndicators": [{"name": "Visual Clarity", "value": "yes"}]
        });
        assert!(serde_json::from_value::<SegmentAssessment>(payload).is_err());
    }

    #[test]
    fn test_segment_rejects_blank_indicator_name() {
        let segment = SegmentAssessment {
            recommendations: vec![],
            assessment_indicators: vec![
                AssessmentIndicator::new("Visual Clarity", true),
                AssessmentIndicator::new("  ", true),
            ],
        };
        assert_eq!(segment.validate(), Err(PayloadError::EmptyIndicatorName(1)));
    }

    #[test]
    fn test_summary_requires_text() {
        let summary = Summary {
            recommendations: vec!["Add captions".into()],
            assessment_indicators: vec![],
            summary: "".into(),
        };
        assert_eq!(summary.validate(), Err(PayloadError::EmptySummary));
    }
}
