//! OpenAI HTTP client.
//!
//! Chat calls run in JSON mode and are parsed straight into the model types,
//! then validated. Anything that does not parse or validate comes back as
//! `MalformedResponse`, never as a partially filled value.

use std::path::Path;

use reelscore_models::{SegmentAssessment, Summary};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, info_span, Instrument};

use crate::config::OpenAiConfig;
use crate::error::{OpenAiError, OpenAiResult};

/// System message sent with every chat completion.
pub const SYSTEM_PROMPT: &str = "You are a professional video analyzer.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// OpenAI API client.
#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> OpenAiResult<Self> {
        if config.api_key.is_empty() {
            return Err(OpenAiError::config_error("OpenAI API key is empty"));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("reelscore-openai/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, config })
    }

    pub fn from_env() -> OpenAiResult<Self> {
        Self::new(OpenAiConfig::from_env()?)
    }

    /// Assess one section of the video.
    pub async fn assess_section(&self, prompt: &str) -> OpenAiResult<SegmentAssessment> {
        let assessment: SegmentAssessment = self.chat_json("segment_assessment", prompt).await?;
        assessment
            .validate()
            .map_err(|e| OpenAiError::malformed(e.to_string()))?;
        Ok(assessment)
    }

    /// Produce the whole-video summary.
    pub async fn summarize(&self, prompt: &str) -> OpenAiResult<Summary> {
        let summary: Summary = self.chat_json("video_summary", prompt).await?;
        summary
            .validate()
            .map_err(|e| OpenAiError::malformed(e.to_string()))?;
        Ok(summary)
    }

    /// Transcribe an audio file with Whisper.
    pub async fn transcribe(&self, audio: impl AsRef<Path>) -> OpenAiResult<String> {
        let audio = audio.as_ref();
        let file_name = audio
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();
        let bytes = tokio::fs::read(audio).await?;

        let form = Form::new()
            .text("model", self.config.transcription_model.clone())
            .text("response_format", "json")
            .part("file", Part::bytes(bytes).file_name(file_name).mime_str("audio/wav")?);

        let url = format!("{}/audio/transcriptions", self.config.base_url);
        let span = info_span!("openai_request", operation = "transcribe", model = %self.config.transcription_model);

        let body = async {
            let response = self
                .http
                .post(&url)
                .bearer_auth(&self.config.api_key)
                .multipart(form)
                .send()
                .await?;
            Self::read_body(response).await
        }
        .instrument(span)
        .await?;

        let parsed: TranscriptionResponse = serde_json::from_str(&body)
            .map_err(|e| OpenAiError::malformed(format!("transcription response: {}", e)))?;

        info!(chars = parsed.text.len(), "Transcribed {}", audio.display());
        Ok(parsed.text)
    }

    /// Run a chat completion and parse its content as `T`.
    pub async fn chat_json<T>(&self, schema_name: &str, prompt: &str) -> OpenAiResult<T>
    where
        T: DeserializeOwned + JsonSchema,
    {
        let request = ChatRequest {
            model: &self.config.chat_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            response_format: self.response_format::<T>(schema_name),
        };

        let url = format!("{}/chat/completions", self.config.base_url);
        let span = info_span!("openai_request", operation = %schema_name, model = %self.config.chat_model);

        let body = async {
            let response = self
                .http
                .post(&url)
                .bearer_auth(&self.config.api_key)
                .json(&request)
                .send()
                .await?;
            Self::read_body(response).await
        }
        .instrument(span)
        .await?;

        let chat: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| OpenAiError::malformed(format!("chat response: {}", e)))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| OpenAiError::malformed("no content in chat response"))?;

        debug!(chars = content.len(), "Received {} payload", schema_name);

        serde_json::from_str(strip_code_fence(&content))
            .map_err(|e| OpenAiError::malformed(format!("{}: {}", schema_name, e)))
    }

    fn response_format<T: JsonSchema>(&self, schema_name: &str) -> serde_json::Value {
        if self.config.structured_output {
            let schema = schemars::schema_for!(T);
            json!({
                "type": "json_schema",
                "json_schema": {
                    "name": schema_name,
                    "schema": schema,
                    "strict": false
                }
            })
        } else {
            json!({ "type": "json_object" })
        }
    }

    async fn read_body(response: reqwest::Response) -> OpenAiResult<String> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(OpenAiError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(body)
    }
}

/// Unwrap a ```json fenced block if the model wrapped its answer in one.
pub fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, structured: bool) -> OpenAiClient {
        OpenAiClient::new(OpenAiConfig {
            api_key: "sk-test".into(),
            base_url: format!("{}/v1", server.uri()),
            timeout: Duration::from_secs(5),
            structured_output: structured,
            ..OpenAiConfig::default()
        })
        .unwrap()
    }

    fn chat_body(content: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}]
        })
    }

    async fn mount_chat(server: &MockServer, content: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(content)))
            .mount(server)
            .await;
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_assess_section_parses_fenced_payload() {
        let server = MockServer::start().await;
        mount_chat(
            &server,
            "```json\n{\"recommendations\":[{\"point\":\"Shorter intro\",\"example\":\"Cut to the bikes\"}],\
             \"assessmentIndicators\":[{\"name\":\"Engaging Hook\",\"value\":true},{\"name\":\"Local Context\",\"value\":false}],\
             \"extra\":\"ignored\"}\n```",
        )
        .await;

        let assessment = client(&server, false).assess_section("prompt").await.unwrap();
        assert_eq!(assessment.assessment_indicators.len(), 2);
        assert_eq!(assessment.positive_count(), 1);
        assert_eq!(assessment.recommendations[0].point, "Shorter intro");

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["content"], SYSTEM_PROMPT);
        assert_eq!(body["messages"][1]["content"], "prompt");
    }

    #[tokio::test]
    async fn test_assess_section_rejects_wrong_types() {
        let server = MockServer::start().await;
        mount_chat(
            &server,
            "{\"recommendations\":[],\"assessmentIndicators\":[{\"name\":\"Visual Clarity\",\"value\":\"yes\"}]}",
        )
        .await;

        let err = client(&server, false).assess_section("p").await.unwrap_err();
        assert!(matches!(err, OpenAiError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_assess_section_rejects_empty_indicator_name() {
        let server = MockServer::start().await;
        mount_chat(
            &server,
            "{\"recommendations\":[],\"assessmentIndicators\":[{\"name\":\"\",\"value\":true}]}",
        )
        .await;

        let err = client(&server, false).assess_section("p").await.unwrap_err();
        assert!(matches!(err, OpenAiError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_empty_choices_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = client(&server, false).summarize("p").await.unwrap_err();
        assert!(matches!(err, OpenAiError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_summarize_with_structured_output() {
        let server = MockServer::start().await;
        mount_chat(
            &server,
            "{\"recommendations\":[\"Add a price overlay\"],\"assessmentIndicators\":[],\"summary\":\"A jeep tour rental ad.\"}",
        )
        .await;

        let summary = client(&server, true).summarize("p").await.unwrap();
        assert_eq!(summary.summary, "A jeep tour rental ad.");

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "video_summary");
        assert!(body["response_format"]["json_schema"]["schema"].is_object());
    }

    #[tokio::test]
    async fn test_api_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = client(&server, false).assess_section("p").await.unwrap_err();
        match err {
            OpenAiError::Api { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "slow down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transcribe() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "Rent a scooter today"})))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let audio = dir.path().join("audio.wav");
        tokio::fs::write(&audio, b"RIFF....WAVE").await.unwrap();

        let text = client(&server, false).transcribe(&audio).await.unwrap();
        assert_eq!(text, "Rent a scooter today");

        let requests = server.received_requests().await.unwrap();
        let raw = String::from_utf8_lossy(&requests[0].body);
        assert!(raw.contains("whisper-1"));
        assert!(raw.contains("filename=\"audio.wav\""));
    }

    #[test]
    fn test_new_rejects_empty_key() {
        assert!(matches!(
            OpenAiClient::new(OpenAiConfig::default()),
            Err(OpenAiError::ConfigError(_))
        ));
    }
}
