//! Engine error types.

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Transcriber command not found: {0}")]
    CommandNotFound(String),

    #[error("Inference failed: {message}")]
    InferenceFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Unsupported configuration: {0}")]
    Unsupported(String),

    #[error("Malformed engine output: {0}")]
    MalformedOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn inference_failed(message: impl Into<String>, stderr: Option<String>) -> Self {
        Self::InferenceFailed {
            message: message.into(),
            stderr,
        }
    }
}
