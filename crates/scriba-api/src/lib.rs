//! HTTP API server for the transcription backend.
//!
//! Thin axum layer over [`scriba_worker::Orchestrator`]: multipart
//! uploads in, JSON snapshots and rendered exports out. All domain
//! decisions live in the worker crate; this one only maps transport.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
