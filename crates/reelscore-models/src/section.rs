//! Narrative sections of a video.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the five ordered narrative sections.
///
/// Each section owns a cumulative percentage threshold. Thresholds are strictly
/// increasing and the last one is 100, so every position in a video falls into
/// exactly one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Opening,
    Setup,
    Main,
    Climax,
    Closing,
}

impl Section {
    /// All sections in narrative order.
    pub const ALL: [Section; 5] = [
        Section::Opening,
        Section::Setup,
        Section::Main,
        Section::Climax,
        Section::Closing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Opening => "opening",
            Section::Setup => "setup",
            Section::Main => "main",
            Section::Climax => "climax",
            Section::Closing => "closing",
        }
    }

    /// Cumulative upper bound of this section, in percent of the video.
    pub fn threshold_percent(&self) -> u32 {
        match self {
            Section::Opening => 10,
            Section::Setup => 20,
            Section::Main => 60,
            Section::Climax => 90,
            Section::Closing => 100,
        }
    }

    /// Zero-based position in narrative order.
    pub fn index(&self) -> usize {
        match self {
            Section::Opening => 0,
            Section::Setup => 1,
            Section::Main => 2,
            Section::Climax => 3,
            Section::Closing => 4,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .iter()
            .copied()
            .find(|section| section.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown section: {}", s))
    }
}
