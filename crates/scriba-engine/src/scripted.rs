//! Scripted engine for tests.

use std::path::Path;

use async_trait::async_trait;
use parking_lot::Mutex;

use scriba_models::Segment;

use crate::engine::{EngineUpdate, ProgressSink, SpeechEngine, Transcription};
use crate::error::{EngineError, EngineResult};

/// Replays canned segments through the progress sink, one update per
/// segment, then returns them as the final transcription. Can be armed to
/// fail instead, for error-path tests.
pub struct ScriptedEngine {
    segments: Vec<Segment>,
    duration: f64,
    language: Option<String>,
    fail_with: Mutex<Option<String>>,
}

impl ScriptedEngine {
    pub fn new(segments: Vec<Segment>, duration: f64) -> Self {
        Self {
            segments,
            duration,
            language: Some("it".to_string()),
            fail_with: Mutex::new(None),
        }
    }

    /// Engine that produces no segments at all.
    pub fn empty() -> Self {
        Self::new(Vec::new(), 0.0)
    }

    /// Arm the next `transcribe` call to fail with the given message.
    pub fn fail_next(&self, message: impl Into<String>) {
        *self.fail_with.lock() = Some(message.into());
    }
}

/// Factory producing [`ScriptedEngine`]s with the same canned segments,
/// regardless of configuration.
pub struct ScriptedFactory {
    segments: Vec<Segment>,
    duration: f64,
}

impl ScriptedFactory {
    pub fn new(segments: Vec<Segment>, duration: f64) -> Self {
        Self { segments, duration }
    }
}

#[async_trait]
impl crate::pool::EngineFactory for ScriptedFactory {
    async fn build(
        &self,
        _config: &crate::engine::EngineConfig,
    ) -> EngineResult<std::sync::Arc<dyn SpeechEngine>> {
        Ok(std::sync::Arc::new(ScriptedEngine::new(
            self.segments.clone(),
            self.duration,
        )))
    }
}

#[async_trait]
impl SpeechEngine for ScriptedEngine {
    async fn transcribe(
        &self,
        _audio: &Path,
        language: Option<&str>,
        sink: &ProgressSink,
    ) -> EngineResult<Transcription> {
        if let Some(message) = self.fail_with.lock().take() {
            return Err(EngineError::inference_failed(message, None));
        }

        let mut emitted = Vec::with_capacity(self.segments.len());
        for seg in &self.segments {
            emitted.push(seg.clone());
            sink(EngineUpdate {
                seconds_done: seg.end,
                total_seconds: self.duration,
                segments: emitted.clone(),
            });
        }

        Ok(Transcription {
            segments: self.segments.clone(),
            language: language
                .map(str::to_string)
                .or_else(|| self.language.clone()),
            language_probability: Some(1.0),
            duration: self.duration,
        })
    }
}
