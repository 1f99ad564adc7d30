//! Speech engine seam.
//!
//! The inference engine is an external collaborator: this crate defines
//! the trait the pipeline consumes, a configuration-keyed pool with an
//! explicit single-slot eviction policy, a process-backed implementation
//! that talks to an external transcriber over JSON lines, and a scripted
//! engine for tests.

pub mod engine;
pub mod error;
pub mod pool;
pub mod process;
pub mod scripted;

pub use engine::{EngineConfig, EngineUpdate, ProgressSink, SpeechEngine, Transcription};
pub use error::{EngineError, EngineResult};
pub use pool::{EngineFactory, EnginePool};
pub use process::{ProcessEngine, ProcessEngineFactory};
pub use scripted::{ScriptedEngine, ScriptedFactory};
