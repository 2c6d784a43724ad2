//! Review aggregation over the section assessments.

use reelscore_models::{Review, SegmentAssessment};

/// Count indicators across all sections and derive the positive percentage.
///
/// With no indicators at all the percentage is 0.0.
pub fn aggregate<'a, I>(assessments: I) -> Review
where
    I: IntoIterator<Item = &'a SegmentAssessment>,
{
    let (total, positive) = assessments
        .into_iter()
        .fold((0u32, 0u32), |(total, positive), a| {
            (
                total + a.assessment_indicators.len() as u32,
                positive + a.positive_count() as u32,
            )
        });

    Review::from_counts(total, positive)
}
