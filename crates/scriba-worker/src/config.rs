//! Worker configuration.

use std::path::PathBuf;

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Directory holding uploaded source files and transient WAVs
    pub cache_dir: PathBuf,
    /// Maximum simultaneously active (queued or running) jobs;
    /// 0 means unbounded
    pub max_active_jobs: usize,
    /// Default model when a submit names none
    pub default_model: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("data/cache"),
            max_active_jobs: 4,
            default_model: "medium".to_string(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_dir: std::env::var("SCRIBA_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            max_active_jobs: std::env::var("SCRIBA_MAX_ACTIVE_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_active_jobs),
            default_model: std::env::var("SCRIBA_DEFAULT_MODEL")
                .unwrap_or(defaults.default_model),
        }
    }
}
