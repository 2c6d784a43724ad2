//! FFmpeg CLI wrapper for the analysis pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and a runner with timeouts
//! - FFprobe container/stream inspection
//! - Frame sampling and audio track extraction
//! - Streaming SHA-256 content identifiers
//! - Scoped scratch directories that clean up on drop

pub mod command;
pub mod error;
pub mod extract;
pub mod hash;
pub mod probe;
pub mod progress;
pub mod scratch;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use extract::{extract_audio, extract_frames, list_frames, AUDIO_FILE_NAME, FRAME_FILE_PATTERN};
pub use hash::content_hash;
pub use probe::{probe_media, ProbeReport, StreamInfo};
pub use progress::FfmpegProgress;
pub use scratch::ScratchDir;
