//! OpenAI client error types.

use thiserror::Error;

pub type OpenAiResult<T> = Result<T, OpenAiError>;

#[derive(Debug, Error)]
pub enum OpenAiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("OpenAI API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OpenAiError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }
}
