//! The `SpeechEngine` trait and its associated types.

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use scriba_models::Segment;

use crate::error::EngineResult;

/// Engine configuration. Only one configuration can be resident at a time;
/// the pool keys its slot on this value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Model identifier (tiny, base, small, medium, large-v3)
    pub model: String,
    /// Execution device: "cuda" or "cpu"
    pub device: String,
    /// Compute type: "float16", "int8", "float32"
    pub compute: String,
}

impl EngineConfig {
    pub fn new(
        model: impl Into<String>,
        device: impl Into<String>,
        compute: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            device: device.into(),
            compute: compute.into(),
        }
    }
}

impl fmt::Display for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.model, self.device, self.compute)
    }
}

/// A mid-transcription progress report.
///
/// `segments` holds every segment decoded so far, in emission order;
/// `seconds_done` is the end offset of the latest segment.
#[derive(Debug, Clone)]
pub struct EngineUpdate {
    pub seconds_done: f64,
    pub total_seconds: f64,
    pub segments: Vec<Segment>,
}

/// Callback the engine invokes as segments are decoded.
pub type ProgressSink = Box<dyn Fn(EngineUpdate) + Send + Sync>;

/// Result of a completed transcription.
#[derive(Debug, Clone)]
pub struct Transcription {
    /// Segments in emission order (monotonic start time by construction
    /// of VAD-segmented decoding)
    pub segments: Vec<Segment>,
    /// Detected (or requested) language
    pub language: Option<String>,
    /// Detection confidence, when the language was auto-detected
    pub language_probability: Option<f64>,
    /// Audio duration in seconds
    pub duration: f64,
}

impl Transcription {
    /// Trimmed segment texts joined by single spaces.
    pub fn full_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.trim())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// An opaque speech-to-text collaborator.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Transcribe a mono 16 kHz WAV file.
    ///
    /// `language` is `None` for auto-detection. The sink is invoked for
    /// every decoded segment; implementations must emit segments in
    /// decoding order and never reorder them.
    async fn transcribe(
        &self,
        audio: &Path,
        language: Option<&str>,
        sink: &ProgressSink,
    ) -> EngineResult<Transcription>;
}
