//! Pipeline error types.

use std::fmt;

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Error category, independent of the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    DurationExceeded,
    Io,
    Probe,
    Extraction,
    Publish,
    Transcription,
    Assessment,
    MalformedAssessorResponse,
    Store,
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::DurationExceeded => "duration_exceeded",
            Self::Io => "io",
            Self::Probe => "probe",
            Self::Extraction => "extraction",
            Self::Publish => "publish",
            Self::Transcription => "transcription",
            Self::Assessment => "assessment",
            Self::MalformedAssessorResponse => "malformed_assessor_response",
            Self::Store => "store",
            Self::Config => "config",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::InvalidInput => "Invalid input",
            Self::DurationExceeded => "Duration check failed",
            Self::Io => "IO error",
            Self::Probe => "Probe failed",
            Self::Extraction => "Extraction failed",
            Self::Publish => "Publish failed",
            Self::Transcription => "Transcription failed",
            Self::Assessment => "Assessment failed",
            Self::MalformedAssessorResponse => "Malformed assessor response",
            Self::Store => "Store failed",
            Self::Config => "Configuration error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Video duration {duration:.1}s exceeds the maximum of {max_secs}s")]
    DurationExceeded { duration: f64, max_secs: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Probe failed: {0}")]
    Probe(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Assessment failed for {section}: {message}")]
    Assessment { section: String, message: String },

    #[error("Malformed assessor response for {section}: {message}")]
    MalformedAssessorResponse { section: String, message: String },

    #[error("Store failed: {0}")]
    Store(String),

    /// A collaborator call exceeded its time budget.
    #[error("{kind}: timed out after {secs}s")]
    Timeout { kind: ErrorKind, secs: u64 },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn assessment(section: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Assessment {
            section: section.into(),
            message: msg.into(),
        }
    }

    pub fn malformed(section: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::MalformedAssessorResponse {
            section: section.into(),
            message: msg.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::DurationExceeded { .. } => ErrorKind::DurationExceeded,
            Self::Io(_) => ErrorKind::Io,
            Self::Probe(_) => ErrorKind::Probe,
            Self::Extraction(_) => ErrorKind::Extraction,
            Self::Publish(_) => ErrorKind::Publish,
            Self::Transcription(_) => ErrorKind::Transcription,
            Self::Assessment { .. } => ErrorKind::Assessment,
            Self::MalformedAssessorResponse { .. } => ErrorKind::MalformedAssessorResponse,
            Self::Store(_) => ErrorKind::Store,
            Self::Timeout { kind, .. } => *kind,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Caused by the submission itself rather than by a failing dependency.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidInput | ErrorKind::DurationExceeded
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_reports_stage_kind() {
        let err = PipelineError::Timeout {
            kind: ErrorKind::Transcription,
            secs: 180,
        };
        assert_eq!(err.kind(), ErrorKind::Transcription);
        assert_eq!(err.to_string(), "Transcription failed: timed out after 180s");
        assert!(!err.is_user_facing());
    }

    #[test]
    fn test_user_facing_kinds() {
        assert!(PipelineError::invalid_input("x").is_user_facing());
        assert!(PipelineError::DurationExceeded {
            duration: 250.0,
            max_secs: 200
        }
        .is_user_facing());
        assert!(!PipelineError::Probe("no video stream".into()).is_user_facing());
        assert!(!PipelineError::malformed("main", "bad json").is_user_facing());
    }

    #[test]
    fn test_display_chain() {
        let err = PipelineError::assessment("climax", "OpenAI API returned 500: boom");
        assert_eq!(
            err.to_string(),
            "Assessment failed for climax: OpenAI API returned 500: boom"
        );
    }
}
