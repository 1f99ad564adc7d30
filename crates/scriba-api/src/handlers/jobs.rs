//! Job submission and status polling handlers.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::info;

use scriba_models::{ProjectId, ProjectStatus};
use scriba_worker::{JobSnapshot, SubmitRequest};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Submission response.
#[derive(Serialize)]
pub struct SubmitResponse {
    pub job_id: String,
    pub status: ProjectStatus,
}

/// Accept a media upload and queue it for transcription.
///
/// Multipart fields: `file` (required), `model`, `language`,
/// `diarization`. Missing optional fields fall back to server defaults.
pub async fn submit_transcription(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    let mut file_name = String::new();
    let mut bytes: Vec<u8> = Vec::new();
    let mut model = String::new();
    let mut language = "auto".to_string();
    let mut diarization = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?
    {
        match field.name().unwrap_or_default() {
            "file" => {
                file_name = field.file_name().unwrap_or_default().to_string();
                bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {e}")))?
                    .to_vec();
            }
            "model" => model = read_text_field(field).await?,
            "language" => language = read_text_field(field).await?,
            "diarization" => {
                let value = read_text_field(field).await?;
                diarization = matches!(value.as_str(), "true" | "1" | "on");
            }
            _ => {}
        }
    }

    let id = state
        .orchestrator
        .submit(SubmitRequest {
            file_name,
            bytes,
            model,
            language,
            diarization,
        })
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            job_id: id.to_string(),
            status: ProjectStatus::Queued,
        }),
    ))
}

/// Poll a job's status, progress and (when completed) its segments.
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobSnapshot>> {
    let snapshot = state.orchestrator.status(&ProjectId::from_string(job_id))?;
    Ok(Json(snapshot))
}

/// Re-attach the media file to a project after the cache was cleared.
pub async fn reupload_media(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<Json<serde_json::Value>> {
    let mut file_name = String::new();
    let mut bytes: Vec<u8> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().unwrap_or_default().to_string();
            bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {e}")))?
                .to_vec();
        }
    }

    let id = ProjectId::from_string(project_id);
    state.orchestrator.reupload(&id, &file_name, &bytes).await?;
    info!(project = %id, "media re-attached");
    Ok(Json(serde_json::json!({ "success": true })))
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> ApiResult<String> {
    field
        .text()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid field value: {e}")))
}
