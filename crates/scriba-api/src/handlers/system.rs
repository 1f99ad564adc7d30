//! System status and cache maintenance handlers.

use axum::extract::State;
use axum::Json;
use serde_json::json;
use tracing::info;

use scriba_worker::SystemStatus;

use crate::error::ApiResult;
use crate::state::AppState;

/// GPU, disk and queue capability report.
pub async fn get_system_status(State(state): State<AppState>) -> ApiResult<Json<SystemStatus>> {
    let status = state.orchestrator.system_status().await?;
    Ok(Json(status))
}

/// Empty the filesystem cache and the in-memory job registry.
pub async fn clear_cache(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    state.orchestrator.clear_cache().await?;
    info!("cache cleared");
    Ok(Json(json!({ "success": true })))
}
