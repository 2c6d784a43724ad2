//! Media metadata recorded in an analysis.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Metadata of the submitted video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoMetadata {
    /// Duration in seconds
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    /// Declared MIME type
    pub format: String,
    /// Byte size
    pub size: u64,
    /// Public URL of the published source video
    pub url: String,
}

/// Channel layout label derived from the channel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChannelLayout {
    Mono,
    Stereo,
}

impl ChannelLayout {
    /// Two channels are stereo, anything else is reported as mono.
    pub fn from_channels(channels: Option<u32>) -> Self {
        match channels {
            Some(2) => ChannelLayout::Stereo,
            _ => ChannelLayout::Mono,
        }
    }
}

/// Metadata of the extracted audio track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AudioMetadata {
    pub sample_rate: Option<u32>,
    pub channels: Option<u32>,
    pub channel_layout: ChannelLayout,
    /// Public URL of the published audio
    pub url: String,
}

impl AudioMetadata {
    pub fn new(sample_rate: Option<u32>, channels: Option<u32>, url: impl Into<String>) -> Self {
        Self {
            sample_rate,
            channels,
            channel_layout: ChannelLayout::from_channels(channels),
            url: url.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_layout() {
        assert_eq!(ChannelLayout::from_channels(Some(2)), ChannelLayout::Stereo);
        assert_eq!(ChannelLayout::from_channels(Some(1)), ChannelLayout::Mono);
        assert_eq!(ChannelLayout::from_channels(Some(6)), ChannelLayout::Mono);
        assert_eq!(ChannelLayout::from_channels(None), ChannelLayout::Mono);
    }

    #[test]
    fn test_audio_metadata_wire_names() {
        let audio = AudioMetadata::new(Some(44100), Some(2), "https://cdn/a.wav");
        let json = serde_json::to_value(&audio).unwrap();
        assert_eq!(json["sampleRate"], 44100);
        assert_eq!(json["channelLayout"], "stereo");
    }
}
