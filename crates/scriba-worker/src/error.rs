//! Worker error types.
//!
//! Each pipeline stage has its own error enum; this folds them into one
//! taxonomy and classifies failures as retryable or terminal.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Uploaded file does not match the original (hash mismatch)")]
    HashMismatch,

    #[error("Too many active jobs: {0}")]
    Busy(String),

    #[error("Media error: {0}")]
    Media(#[from] scriba_media::MediaError),

    #[error("Inference error: {0}")]
    Inference(#[from] scriba_engine::EngineError),

    #[error("Store error: {0}")]
    Store(#[from] scriba_store::StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn busy(msg: impl Into<String>) -> Self {
        Self::Busy(msg.into())
    }

    /// Whether the caller may usefully retry the same request later.
    ///
    /// Admission-control rejections pass once capacity frees up; bad
    /// input, missing tools and hash mismatches are terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WorkerError::Busy(_))
    }
}
