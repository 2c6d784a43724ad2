//! FFprobe container and stream inspection.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// One stream reported by ffprobe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    /// "video", "audio", "subtitle", "data"...
    pub codec_type: String,
    pub codec_name: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Sample rate in Hz (audio only)
    pub sample_rate: Option<u32>,
    /// Channel count (audio only)
    pub channels: Option<u32>,
}

/// Container and stream metadata of a media file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeReport {
    /// Duration in seconds, when the container declares one
    pub duration: Option<f64>,
    pub format_name: Option<String>,
    /// File size in bytes
    pub size: Option<u64>,
    pub streams: Vec<StreamInfo>,
}

impl ProbeReport {
    /// Parse `ffprobe -print_format json -show_format -show_streams` output.
    pub fn from_ffprobe_json(bytes: &[u8]) -> MediaResult<Self> {
        let raw: FfprobeOutput = serde_json::from_slice(bytes)?;

        let format = raw.format.unwrap_or_default();
        Ok(Self {
            duration: format.duration.as_deref().and_then(|d| d.parse().ok()),
            format_name: format.format_name,
            size: format.size.as_deref().and_then(|s| s.parse().ok()),
            streams: raw
                .streams
                .into_iter()
                .map(|s| StreamInfo {
                    codec_type: s.codec_type.unwrap_or_default(),
                    codec_name: s.codec_name,
                    width: s.width,
                    height: s.height,
                    sample_rate: s.sample_rate.as_deref().and_then(|r| r.parse().ok()),
                    channels: s.channels,
                })
                .collect(),
        })
    }

    /// First stream whose codec type is "video".
    pub fn first_video_stream(&self) -> Option<&StreamInfo> {
        self.streams.iter().find(|s| s.codec_type == "video")
    }

    /// First stream whose codec type is "audio".
    pub fn first_audio_stream(&self) -> Option<&StreamInfo> {
        self.streams.iter().find(|s| s.codec_type == "audio")
    }
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    format_name: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    sample_rate: Option<String>,
    channels: Option<u32>,
}

/// Probe a media file for container and stream information.
pub async fn probe_media(path: impl AsRef<Path>, timeout: Duration) -> MediaResult<ProbeReport> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;
    debug!(path = %path.display(), "Probing media");

    let child = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    let output = tokio::time::timeout(timeout, child)
        .await
        .map_err(|_| MediaError::Timeout(timeout.as_secs()))??;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(MediaError::ffprobe_failed(
            format!(
                "ffprobe exited with status {}",
                output.status.code().unwrap_or(-1)
            ),
            (!stderr.is_empty()).then_some(stderr),
        ));
    }

    ProbeReport::from_ffprobe_json(&output.stdout)
}
