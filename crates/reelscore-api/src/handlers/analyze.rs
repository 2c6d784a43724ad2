//! Video upload and analysis.

use std::path::{Path, PathBuf};

use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use axum::{Extension, Json};
use reelscore_models::{AnalysisResult, VideoSubmission};
use reelscore_pipeline::AnalysisOutcome;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::middleware::RequestId;
use crate::state::AppState;

/// Multipart field carrying the video.
pub const VIDEO_FIELD: &str = "video";

const NO_FILE: &str = "No file uploaded.";

/// Successful analysis response.
#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub message: &'static str,
    pub data: AnalysisResult,
}

impl From<AnalysisOutcome> for AnalyzeResponse {
    fn from(outcome: AnalysisOutcome) -> Self {
        let message = if outcome.is_cached() {
            "Video Already Analyzed"
        } else {
            "Video analyzed successfully"
        };
        Self {
            message,
            data: outcome.into_result(),
        }
    }
}

/// A spooled upload on local disk.
struct Upload {
    path: PathBuf,
    content_type: String,
    file_name: Option<String>,
    size: u64,
}

/// Stream one multipart field into `path`, returning the bytes written.
async fn spool(field: &mut Field<'_>, path: &Path) -> ApiResult<u64> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut size = 0u64;
    while let Some(chunk) = field.chunk().await? {
        file.write_all(&chunk).await?;
        size += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(size)
}

/// Analyze an uploaded video.
///
/// Accepts `multipart/form-data` with the video in the `video` field. The
/// spooled copy is removed when the request finishes, whatever the outcome.
pub async fn analyze_video(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    mut multipart: Multipart,
) -> ApiResult<Json<AnalyzeResponse>> {
    let upload_dir = &state.config.upload_dir;
    tokio::fs::create_dir_all(upload_dir).await?;

    let path = upload_dir.join(format!("{}.upload", Uuid::new_v4()));
    let _cleanup = scopeguard::guard(path.clone(), |p| {
        if let Err(e) = std::fs::remove_file(&p) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %p.display(), error = %e, "Failed to remove upload");
            }
        }
    });

    let mut upload = None;
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(VIDEO_FIELD) {
            debug!(field = ?field.name(), "Ignoring multipart field");
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let size = spool(&mut field, &path).await?;
        upload = Some(Upload {
            path: path.clone(),
            content_type,
            file_name,
            size,
        });
        break;
    }

    let upload = upload.ok_or_else(|| ApiError::bad_request(NO_FILE))?;
    metrics::record_upload_bytes(upload.size);
    info!(
        request_id = %request_id.as_str(),
        size = upload.size,
        content_type = %upload.content_type,
        "Video received"
    );

    let mut submission = VideoSubmission::new(upload.path, upload.content_type, upload.size);
    if let Some(name) = upload.file_name {
        submission = submission.with_original_name(name);
    }

    let outcome = state
        .orchestrator
        .analyze(&submission, request_id.as_str())
        .await?;

    Ok(Json(outcome.into()))
}
