//! Frame sampling and audio extraction.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Output pattern for sampled frames. ffmpeg widens the number past 999.
pub const FRAME_FILE_PATTERN: &str = "frame-%03d.jpeg";

const FRAME_PREFIX: &str = "frame-";
const FRAME_EXTENSION: &str = "jpeg";

/// Name of the extracted audio track inside its output directory.
pub const AUDIO_FILE_NAME: &str = "audio.wav";

/// Sample one frame every `interval_secs` seconds into `out_dir`.
///
/// Returns the written frame paths in capture order.
pub async fn extract_frames(
    video: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    interval_secs: u32,
    timeout_secs: u64,
) -> MediaResult<Vec<PathBuf>> {
    let video = video.as_ref();
    let out_dir = out_dir.as_ref();

    if !video.exists() {
        return Err(MediaError::FileNotFound(video.to_path_buf()));
    }
    tokio::fs::create_dir_all(out_dir).await?;

    let cmd = FfmpegCommand::new(video, out_dir.join(FRAME_FILE_PATTERN))
        .video_filter(format!("fps=1/{}", interval_secs.max(1)))
        .output_args(["-q:v", "2"]);

    FfmpegRunner::new()
        .with_timeout(timeout_secs)
        .run_with_progress(&cmd, |p| debug!(frame = p.frame, "Frame extraction progress"))
        .await?;

    let frames = list_frames(out_dir).await?;
    if frames.is_empty() {
        return Err(MediaError::NoFrames(video.to_path_buf()));
    }

    info!(frames = frames.len(), "Extracted frames from {}", video.display());
    Ok(frames)
}

/// List extracted frame files in `dir`, in capture order.
pub async fn list_frames(dir: impl AsRef<Path>) -> MediaResult<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir.as_ref()).await?;
    let mut frames = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if let Some(seq) = frame_sequence(&path) {
            frames.push((seq, path));
        }
    }

    frames.sort_by_key(|(seq, _)| *seq);
    Ok(frames.into_iter().map(|(_, path)| path).collect())
}

/// Sequence number of a `frame-N.jpeg` file, `None` for anything else.
fn frame_sequence(path: &Path) -> Option<u64> {
    if path.extension().and_then(|e| e.to_str()) != Some(FRAME_EXTENSION) {
        return None;
    }
    path.file_stem()?
        .to_str()?
        .strip_prefix(FRAME_PREFIX)?
        .parse()
        .ok()
}

/// Extract the audio track of `video` as 16-bit PCM WAV into `out_dir`.
pub async fn extract_audio(
    video: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    timeout_secs: u64,
) -> MediaResult<PathBuf> {
    let video = video.as_ref();
    let out_dir = out_dir.as_ref();

    if !video.exists() {
        return Err(MediaError::FileNotFound(video.to_path_buf()));
    }
    tokio::fs::create_dir_all(out_dir).await?;

    let output = out_dir.join(AUDIO_FILE_NAME);
    let cmd = FfmpegCommand::new(video, &output)
        .no_video()
        .audio_codec("pcm_s16le")
        .format("wav");

    FfmpegRunner::new().with_timeout(timeout_secs).run(&cmd).await?;

    info!("Extracted audio from {}", video.display());
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_list_frames_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        for name in ["frame-010.jpeg", "frame-002.jpeg", "frame-001.jpeg", "audio.wav", "frame-003.png"] {
            tokio::fs::write(dir.path().join(name), b"x").await.unwrap();
        }

        let frames = list_frames(dir.path()).await.unwrap();
        let names: Vec<_> = frames
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();

        assert_eq!(names, vec!["frame-001.jpeg", "frame-002.jpeg", "frame-010.jpeg"]);
    }

    #[tokio::test]
    async fn test_list_frames_orders_past_three_digits() {
        let dir = TempDir::new().unwrap();
        for name in ["frame-999.jpeg", "frame-1000.jpeg", "frame-101.jpeg", "frame-cover.jpeg"] {
            tokio::fs::write(dir.path().join(name), b"x").await.unwrap();
        }

        let frames = list_frames(dir.path()).await.unwrap();
        let names: Vec<_> = frames
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();

        assert_eq!(names, vec!["frame-101.jpeg", "frame-999.jpeg", "frame-1000.jpeg"]);
    }

    #[tokio::test]
    async fn test_extract_frames_missing_input() {
        let dir = TempDir::new().unwrap();
        let result = extract_frames(dir.path().join("missing.mp4"), dir.path(), 1, 5).await;
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }
}
