//! Transcript export handler.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use scriba_models::ProjectId;
use scriba_worker::ExportRequest;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

fn default_true() -> bool {
    true
}

/// Export request body.
#[derive(Debug, Deserialize)]
pub struct ExportBody {
    pub job_id: String,
    pub format: String,
    #[serde(default = "default_true")]
    pub include_speakers: bool,
}

/// Render the transcript in the requested format and return it as a
/// downloadable attachment.
pub async fn export_transcript(
    State(state): State<AppState>,
    Json(body): Json<ExportBody>,
) -> ApiResult<Response> {
    let rendering = state.orchestrator.export(&ExportRequest {
        job_id: ProjectId::from_string(&body.job_id),
        format: body.format,
        include_speakers: body.include_speakers,
    })?;

    let file_name = format!("transcript_{}.{}", body.job_id, rendering.format);
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, rendering.mime_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_name}\""),
        )
        .body(rendering.content.into())
        .map_err(|e| ApiError::internal(format!("Failed to build response: {e}")))
}
