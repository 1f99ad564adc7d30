//! Project listing, detail, media streaming and deletion handlers.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use serde::Serialize;
use tracing::info;

use scriba_models::{Project, ProjectId, Segment};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Project list response.
#[derive(Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<Project>,
}

/// Project detail response.
#[derive(Serialize)]
pub struct ProjectDetailResponse {
    #[serde(flatten)]
    pub project: Project,
    pub segments: Vec<Segment>,
}

/// List all projects, newest first.
pub async fn list_projects(State(state): State<AppState>) -> ApiResult<Json<ProjectListResponse>> {
    let projects = state.orchestrator.list_projects()?;
    Ok(Json(ProjectListResponse { projects }))
}

/// Get one project with its segments.
pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<ProjectDetailResponse>> {
    let (project, segments) = state
        .orchestrator
        .project_detail(&ProjectId::from_string(project_id))?;
    Ok(Json(ProjectDetailResponse { project, segments }))
}

/// Serve the project's original media file.
pub async fn stream_media(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> ApiResult<Response> {
    let path = state
        .orchestrator
        .media_path(&ProjectId::from_string(project_id))?;

    let content_type = media_content_type(&path);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to read media file: {e}")))?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, bytes.len())
        .header(header::CACHE_CONTROL, "no-store")
        .body(bytes.into())
        .map_err(|e| ApiError::internal(format!("Failed to build response: {e}")))
}

/// Delete a project, its segments and its media file.
pub async fn delete_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = ProjectId::from_string(project_id);
    state.orchestrator.delete(&id).await?;
    info!(project = %id, "project deleted");
    Ok(Json(serde_json::json!({ "success": true })))
}

fn media_content_type(path: &std::path::Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("m4a") => "audio/mp4",
        Some("ogg") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("mov") => "video/quicktime",
        _ => "application/octet-stream",
    }
}
