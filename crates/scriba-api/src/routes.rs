//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::exports::export_transcript;
use crate::handlers::health::health;
use crate::handlers::jobs::{get_job_status, reupload_media, submit_transcription};
use crate::handlers::projects::{delete_project, get_project, list_projects, stream_media};
use crate::handlers::system::{clear_cache, get_system_status};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/transcribe", post(submit_transcription))
        .route("/transcribe/:job_id", get(get_job_status))
        .route("/projects", get(list_projects))
        .route("/projects/:project_id", get(get_project))
        .route("/projects/:project_id", delete(delete_project))
        .route("/projects/:project_id/media", get(stream_media))
        .route("/projects/:project_id/reupload", post(reupload_media))
        .route("/export", post(export_transcript))
        .route("/system/status", get(get_system_status))
        .route("/system/cache", delete(clear_cache));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
