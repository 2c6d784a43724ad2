//! Published frames and their section buckets.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::section::Section;

/// A still image sampled from the video and published to object storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Frame {
    /// Public URL of the published image
    pub url: String,
    /// Display name (file stem)
    pub name: String,
    /// 1-based ordinal in capture order
    pub timestamp: u32,
}

/// Frames bucketed by section, each bucket in capture order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CategorizedFrames {
    pub opening: Vec<Frame>,
    pub setup: Vec<Frame>,
    pub main: Vec<Frame>,
    pub climax: Vec<Frame>,
    pub closing: Vec<Frame>,
}

impl CategorizedFrames {
    pub fn get(&self, section: Section) -> &[Frame] {
        match section {
            Section::Opening => &self.opening,
            Section::Setup => &self.setup,
            Section::Main => &self.main,
            Section::Climax => &self.climax,
            Section::Closing => &self.closing,
        }
    }

    pub fn push(&mut self, section: Section, frame: Frame) {
        match section {
            Section::Opening => self.opening.push(frame),
            Section::Setup => self.setup.push(frame),
            Section::Main => self.main.push(frame),
            Section::Climax => self.climax.push(frame),
            Section::Closing => self.closing.push(frame),
        }
    }

    /// Total number of frames across all sections.
    pub fn len(&self) -> usize {
        Section::ALL.iter().map(|s| self.get(*s).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All frames in capture order.
    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        Section::ALL.into_iter().flat_map(move |s| self.get(s).iter())
    }

    /// Public URLs of all frames in capture order.
    pub fn urls(&self) -> Vec<&str> {
        self.iter().map(|f| f.url.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(n: u32) -> Frame {
        Frame {
            url: format!("https://cdn.example.com/frame-{:03}.jpeg", n),
            name: format!("frame-{:03}", n),
            timestamp: n,
        }
    }

    #[test]
    fn test_push_and_iterate_in_section_order() {
        let mut frames = CategorizedFrames::default();
        frames.push(Section::Opening, frame(1));
        frames.push(Section::Main, frame(2));
        frames.push(Section::Closing, frame(3));

        assert_eq!(frames.len(), 3);
        assert_eq!(frames.get(Section::Setup).len(), 0);
        let order: Vec<u32> = frames.iter().map(|f| f.timestamp).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_serializes_all_sections() {
        let json = serde_json::to_value(CategorizedFrames::default()).unwrap();
        for section in Section::ALL {
            assert!(json.get(section.as_str()).unwrap().as_array().unwrap().is_empty());
        }
    }
}
