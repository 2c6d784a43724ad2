//! Aggregated pass/fail review.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Pass ratio over every indicator returned for the five sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub total_review: u32,
    pub positive_review: u32,
    pub positive_percentage: f64,
}

impl Review {
    /// Build a review from raw counts.
    ///
    /// A review with no indicators at all reports 0%.
    pub fn from_counts(total_review: u32, positive_review: u32) -> Self {
        let positive_percentage = if total_review == 0 {
            0.0
        } else {
            positive_review as f64 / total_review as f64 * 100.0
        };

        Self {
            total_review,
            positive_review,
            positive_percentage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage() {
        let review = Review::from_counts(40, 30);
        assert!((review.positive_percentage - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_total_is_zero_percent() {
        let review = Review::from_counts(0, 0);
        assert_eq!(review.positive_percentage, 0.0);
        assert!(!review.positive_percentage.is_nan());
    }
}
