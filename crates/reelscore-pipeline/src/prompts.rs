//! Prompt construction for the assessor.

use reelscore_models::{Section, SegmentAssessment};

use crate::error::{PipelineError, PipelineResult};

/// Build the assessment prompt for one section.
pub fn section_prompt(section: Section, frame_urls: &[&str], transcript: &str) -> String {
    format!(
        r#"You are reviewing a short promotional video made by a small vehicle-rental business, the way a typical TikTok or Instagram Reels viewer would watch it.

Section under review: {section}
Frames of this section (in order): {frames}

Full transcript of the video:
{transcript}

Evaluate the section against the following indicators. Use exactly these names.
1. Engaging Hook: the first seconds grab attention. Assess only for the opening section.
2. Effective Call to Action: the viewer is told clearly how to rent or get in touch. Assess only for the closing section.
3. Rental Activity Footage: the vehicles are shown being rented or ridden. Assess only for the main section.
4. Trending Music: background music suits short-form trends.
5. Visual Clarity: footage is sharp, well lit and easy to follow.
6. Proper Video Format: vertical orientation and shorter than 60 seconds.
7. Content Relevance: content stays on the rental offer.
8. Local Context: the location or local culture is visible.

Indicators that do not apply to this section should be omitted. Default to true for an indicator unless the footage clearly fails it. If the video has no relation to small-business promotional content, mark every indicator false.

For each weakness, give a recommendation with a concrete example of how to fix it.

Return only a JSON object of this shape:
{{
  "recommendations": [{{"point": "string", "example": "string"}}],
  "assessmentIndicators": [{{"name": "string", "value": true}}]
}}"#,
        section = section,
        frames = frame_urls.join(", "),
        transcript = transcript,
    )
}

/// Build the whole-video summary prompt from the five section results.
pub fn summary_prompt(
    assessments: &[(Section, &SegmentAssessment)],
    transcript: &str,
    frame_urls: &[&str],
) -> PipelineResult<String> {
    let mut results = String::new();
    for (section, assessment) in assessments {
        let json = serde_json::to_string(assessment)
            .map_err(|e| PipelineError::assessment("summary", format!("cannot encode {} result: {}", section, e)))?;
        results.push_str(&format!("{}: {}\n", section, json));
    }

    Ok(format!(
        r#"Below are the assessments already made for each section of a promotional video from a small vehicle-rental business, together with its transcript and sample frames.

Section assessments:
{results}
Transcript:
{transcript}

Frames (in order): {frames}

Do NOT summarize or re-assess the segments. Using the material above, answer: What is the video about, and what happens from beginning to end? If the content is unrelated to small-business promotion, say so plainly in the summary.

Add overall recommendations for the whole video and any whole-video indicators you observe.

Return only a JSON object of this shape:
{{
  "recommendations": ["string"],
  "assessmentIndicators": [{{"name": "string", "value": true}}],
  "summary": "string"
}}"#,
        results = results,
        transcript = transcript,
        frames = frame_urls.join(", "),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelscore_models::AssessmentIndicator;

    #[test]
    fn test_section_prompt_contents() {
        let prompt = section_prompt(
            Section::Main,
            &["https://cdn.test/a.jpeg", "https://cdn.test/b.jpeg"],
            "Rent a jeep today",
        );
        assert!(prompt.contains("Section under review: main"));
        assert!(prompt.contains("https://cdn.test/a.jpeg, https://cdn.test/b.jpeg"));
        assert!(prompt.contains("Rent a jeep today"));
        for indicator in [
            "Engaging Hook",
            "Effective Call to Action",
            "Rental Activity Footage",
            "Trending Music",
            "Visual Clarity",
            "Proper Video Format",
            "Content Relevance",
            "Local Context",
        ] {
            assert!(prompt.contains(indicator), "missing {}", indicator);
        }
        assert!(prompt.contains("\"assessmentIndicators\""));
    }

    #[test]
    fn test_summary_prompt_embeds_results_in_order() {
        let a = SegmentAssessment {
            recommendations: vec![],
            assessment_indicators: vec![AssessmentIndicator::new("Engaging Hook", true)],
        };
        let b = SegmentAssessment {
            recommendations: vec![],
            assessment_indicators: vec![AssessmentIndicator::new("Effective Call to Action", false)],
        };
        let prompt = summary_prompt(
            &[(Section::Opening, &a), (Section::Closing, &b)],
            "hello",
            &["https://cdn.test/1.jpeg"],
        )
        .unwrap();

        let opening = prompt.find("opening: {").unwrap();
        let closing = prompt.find("closing: {").unwrap();
        assert!(opening < closing);
        assert!(prompt.contains("\"name\":\"Engaging Hook\",\"value\":true"));
        assert!(prompt.contains("Do NOT summarize or re-assess the segments"));
        assert!(prompt.contains("What is the video about, and what happens from beginning to end?"));
        assert!(prompt.contains("https://cdn.test/1.jpeg"));
    }
}
