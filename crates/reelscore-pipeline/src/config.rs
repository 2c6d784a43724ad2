//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{PipelineError, PipelineResult};

/// Policy knobs and per-call time budgets for one orchestrator.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Longest accepted video, in seconds of content
    pub max_video_duration_secs: u64,
    /// Seconds between sampled frames
    pub frame_interval_secs: u32,
    /// The only MIME type accepted for submissions
    pub accepted_mime_type: String,
    /// Maximum concurrent frame uploads
    pub publish_concurrency: usize,
    /// Frame URLs included in the summary prompt
    pub summary_frame_limit: usize,
    /// Root for per-run scratch directories
    pub work_dir: PathBuf,
    pub probe_timeout: Duration,
    pub extract_timeout: Duration,
    pub publish_timeout: Duration,
    pub transcribe_timeout: Duration,
    pub assess_timeout: Duration,
    pub store_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_video_duration_secs: 200,
            frame_interval_secs: 1,
            accepted_mime_type: "video/mp4".to_string(),
            publish_concurrency: 8,
            summary_frame_limit: 20,
            work_dir: std::env::temp_dir().join("reelscore"),
            probe_timeout: Duration::from_secs(30),
            extract_timeout: Duration::from_secs(300),
            publish_timeout: Duration::from_secs(120),
            transcribe_timeout: Duration::from_secs(180),
            assess_timeout: Duration::from_secs(180),
            store_timeout: Duration::from_secs(30),
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_secs(name: &str, default: Duration) -> Duration {
    Duration::from_secs(env_or(name, default.as_secs()))
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            max_video_duration_secs: env_or("MAX_VIDEO_DURATION_SECS", d.max_video_duration_secs),
            frame_interval_secs: env_or("FRAME_INTERVAL_SECS", d.frame_interval_secs),
            accepted_mime_type: std::env::var("ACCEPTED_MIME_TYPE").unwrap_or(d.accepted_mime_type),
            publish_concurrency: env_or("PUBLISH_CONCURRENCY", d.publish_concurrency),
            summary_frame_limit: env_or("SUMMARY_FRAME_LIMIT", d.summary_frame_limit),
            work_dir: std::env::var("WORK_DIR").map(PathBuf::from).unwrap_or(d.work_dir),
            probe_timeout: env_secs("PROBE_TIMEOUT_SECS", d.probe_timeout),
            extract_timeout: env_secs("EXTRACT_TIMEOUT_SECS", d.extract_timeout),
            publish_timeout: env_secs("PUBLISH_TIMEOUT_SECS", d.publish_timeout),
            transcribe_timeout: env_secs("TRANSCRIBE_TIMEOUT_SECS", d.transcribe_timeout),
            assess_timeout: env_secs("ASSESS_TIMEOUT_SECS", d.assess_timeout),
            store_timeout: env_secs("STORE_TIMEOUT_SECS", d.store_timeout),
        }
    }

    /// Reject values the orchestrator cannot run with.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.publish_concurrency == 0 {
            return Err(PipelineError::config("PUBLISH_CONCURRENCY must be at least 1"));
        }
        if self.frame_interval_secs == 0 {
            return Err(PipelineError::config("FRAME_INTERVAL_SECS must be at least 1"));
        }
        if self.accepted_mime_type.trim().is_empty() {
            return Err(PipelineError::config("ACCEPTED_MIME_TYPE cannot be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_video_duration_secs, 200);
        assert_eq!(config.frame_interval_secs, 1);
        assert_eq!(config.accepted_mime_type, "video/mp4");
        assert_eq!(config.summary_frame_limit, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides_and_fallbacks() {
        std::env::set_var("MAX_VIDEO_DURATION_SECS", "90");
        std::env::set_var("PUBLISH_CONCURRENCY", "lots");
        std::env::set_var("STORE_TIMEOUT_SECS", "5");

        let config = PipelineConfig::from_env();
        assert_eq!(config.max_video_duration_secs, 90);
        assert_eq!(config.publish_concurrency, 8);
        assert_eq!(config.store_timeout, Duration::from_secs(5));

        for name in ["MAX_VIDEO_DURATION_SECS", "PUBLISH_CONCURRENCY", "STORE_TIMEOUT_SECS"] {
            std::env::remove_var(name);
        }
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let config = PipelineConfig {
            publish_concurrency: 0,
            ..PipelineConfig::default()
        };
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }
}
