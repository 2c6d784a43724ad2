//! OpenAI client configuration.

use std::time::Duration;

use crate::error::{OpenAiError, OpenAiResult};

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub transcription_model: String,
    /// HTTP timeout per request
    pub timeout: Duration,
    /// Request `json_schema` structured output instead of plain JSON mode
    pub structured_output: bool,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-4o".to_string(),
            transcription_model: "whisper-1".to_string(),
            timeout: Duration::from_secs(120),
            structured_output: false,
        }
    }
}

impl OpenAiConfig {
    /// Load from environment variables. `OPENAI_API_KEY` is required.
    pub fn from_env() -> OpenAiResult<Self> {
        let defaults = Self::default();

        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| OpenAiError::config_error("OPENAI_API_KEY not set"))?;

        Ok(Self {
            api_key,
            base_url: std::env::var("OPENAI_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            chat_model: std::env::var("OPENAI_CHAT_MODEL").unwrap_or(defaults.chat_model),
            transcription_model: std::env::var("OPENAI_TRANSCRIPTION_MODEL")
                .unwrap_or(defaults.transcription_model),
            timeout: std::env::var("OPENAI_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            structured_output: std::env::var("OPENAI_STRUCTURED_OUTPUT")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
        })
    }
}
