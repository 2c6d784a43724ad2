//! API error types.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reelscore_pipeline::PipelineError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Message returned for every unexpected pipeline failure.
pub const ANALYSIS_FAILED: &str = "Failed to analyze video";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Multipart(#[from] MultipartError),

    #[error("Failed to analyze video: {0}")]
    AnalysisFailed(PipelineError),

    #[error("Upload failed: {0}")]
    Upload(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Multipart(e) => e.status(),
            ApiError::AnalysisFailed(_) | ApiError::Upload(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::InvalidInput(msg) => ApiError::BadRequest(msg),
            PipelineError::DurationExceeded { max_secs, .. } => ApiError::BadRequest(format!(
                "Video is too long. Maximum duration is {} seconds.",
                max_secs
            )),
            other => ApiError::AnalysisFailed(other),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            ApiError::BadRequest(msg) => ErrorResponse {
                message: msg.clone(),
                error: None,
            },
            ApiError::Multipart(e) => ErrorResponse {
                message: e.body_text(),
                error: None,
            },
            ApiError::AnalysisFailed(cause) => ErrorResponse {
                message: ANALYSIS_FAILED.to_string(),
                error: Some(cause.to_string()),
            },
            ApiError::Upload(_) | ApiError::Internal(_) => {
                error!(error = %self, "Request failed");
                ErrorResponse {
                    message: ANALYSIS_FAILED.to_string(),
                    error: Some(self.to_string()),
                }
            }
        };

        (status, Json(body)).into_response()
    }
}
