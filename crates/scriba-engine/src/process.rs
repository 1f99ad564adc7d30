//! Process-backed speech engine.
//!
//! Talks to an external transcriber command over a JSON-lines protocol:
//! the command receives the model configuration and audio path as
//! arguments and writes one JSON object per line on stdout, a `start`
//! event with the audio duration followed by one `segment` event per
//! decoded segment.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use scriba_models::Segment;

use crate::engine::{EngineConfig, EngineUpdate, ProgressSink, SpeechEngine, Transcription};
use crate::error::{EngineError, EngineResult};
use crate::pool::EngineFactory;

/// Environment variable naming the transcriber command.
pub const ENGINE_CMD_VAR: &str = "SCRIBA_ENGINE_CMD";

const DEFAULT_ENGINE_CMD: &str = "scriba-whisper";

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum EngineEvent {
    Start {
        duration: f64,
        #[serde(default)]
        language: Option<String>,
        #[serde(default)]
        language_probability: Option<f64>,
    },
    Segment {
        start: f64,
        end: f64,
        text: String,
        #[serde(default)]
        confidence: Option<f64>,
    },
}

/// Speech engine backed by an external transcriber process.
#[derive(Debug)]
pub struct ProcessEngine {
    command: PathBuf,
    config: EngineConfig,
}

impl ProcessEngine {
    /// Create an engine, verifying the command is resolvable.
    pub fn new(command: impl AsRef<Path>, config: EngineConfig) -> EngineResult<Self> {
        let command = command.as_ref();
        let resolved = which::which(command)
            .map_err(|_| EngineError::CommandNotFound(command.display().to_string()))?;
        Ok(Self {
            command: resolved,
            config,
        })
    }
}

#[async_trait]
impl SpeechEngine for ProcessEngine {
    async fn transcribe(
        &self,
        audio: &Path,
        language: Option<&str>,
        sink: &ProgressSink,
    ) -> EngineResult<Transcription> {
        let mut cmd = Command::new(&self.command);
        cmd.arg("--model")
            .arg(&self.config.model)
            .arg("--device")
            .arg(&self.config.device)
            .arg("--compute")
            .arg(&self.config.compute)
            .arg("--audio")
            .arg(audio);
        if let Some(lang) = language {
            cmd.arg("--language").arg(lang);
        }

        debug!(command = %self.command.display(), config = %self.config, "starting transcriber");

        let mut child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::MalformedOutput("no stdout pipe".to_string()))?;
        let mut stderr = child.stderr.take();

        // Drain stderr concurrently so a chatty transcriber cannot block.
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            if let Some(pipe) = stderr.as_mut() {
                let _ = pipe.read_to_string(&mut buf).await;
            }
            buf
        });

        let mut lines = BufReader::new(stdout).lines();
        let mut segments: Vec<Segment> = Vec::new();
        let mut duration = 0.0;
        let mut detected_language = language.map(str::to_string);
        let mut language_probability = None;

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<EngineEvent>(line) {
                Ok(EngineEvent::Start {
                    duration: d,
                    language: lang,
                    language_probability: prob,
                }) => {
                    duration = d;
                    if detected_language.is_none() {
                        detected_language = lang;
                    }
                    language_probability = prob;
                }
                Ok(EngineEvent::Segment {
                    start,
                    end,
                    text,
                    confidence,
                }) => {
                    let mut seg = Segment::new(segments.len().to_string(), start, end, text);
                    seg.confidence = confidence;
                    segments.push(seg);
                    sink(EngineUpdate {
                        seconds_done: end,
                        total_seconds: duration,
                        segments: segments.clone(),
                    });
                }
                Err(e) => {
                    warn!(error = %e, "skipping unparsable transcriber line");
                }
            }
        }

        let status = child.wait().await?;
        let stderr_text = stderr_task.await.unwrap_or_default();

        if !status.success() {
            let message = stderr_text
                .lines()
                .last()
                .unwrap_or("transcriber exited with an error")
                .to_string();
            return Err(EngineError::inference_failed(message, Some(stderr_text)));
        }

        Ok(Transcription {
            segments,
            language: detected_language,
            language_probability,
            duration,
        })
    }
}

/// Builds [`ProcessEngine`]s for the pool.
pub struct ProcessEngineFactory {
    command: PathBuf,
}

impl ProcessEngineFactory {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Command from `SCRIBA_ENGINE_CMD`, defaulting to `scriba-whisper`.
    pub fn from_env() -> Self {
        let command =
            std::env::var(ENGINE_CMD_VAR).unwrap_or_else(|_| DEFAULT_ENGINE_CMD.to_string());
        Self::new(command)
    }
}

#[async_trait]
impl EngineFactory for ProcessEngineFactory {
    async fn build(&self, config: &EngineConfig) -> EngineResult<Arc<dyn SpeechEngine>> {
        Ok(Arc::new(ProcessEngine::new(&self.command, config.clone())?))
    }
}
