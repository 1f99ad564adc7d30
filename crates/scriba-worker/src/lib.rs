//! Job orchestration.
//!
//! The long-running, resumable, progress-reporting core that wraps the
//! speech engine: an in-memory job registry for live polling, a per-job
//! executor pipeline with fixed progress checkpoints, a progress event
//! channel decoupling the two, and the orchestrator facade that ties them
//! to the durable transcript store.

pub mod config;
pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod progress;
pub mod registry;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use orchestrator::{
    ExportRendering, ExportRequest, JobSnapshot, Orchestrator, SubmitRequest, SystemStatus,
};
pub use progress::ProgressEvent;
pub use registry::{JobRegistry, JobState};
