//! Per-job pipeline executor.
//!
//! Runs one job to completion or failure on its own task, reporting fixed
//! fractional checkpoints: 0.1 pipeline started, 0.2 audio extracted,
//! 0.3 engine ready, 0.3..0.95 inference driven by the engine's own
//! progress, 1.0 once the transcript is persisted.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use scriba_engine::{EngineConfig, EnginePool, ProgressSink};
use scriba_media::{extract_audio, pick_device, probe_gpu};
use scriba_models::{ProjectId, Segment};

use crate::error::WorkerResult;
use crate::progress::ProgressEvent;

/// Pipeline started on its task.
pub const CHECKPOINT_STARTED: f32 = 0.1;
/// Audio extraction/resampling completed.
pub const CHECKPOINT_AUDIO_READY: f32 = 0.2;
/// Engine loaded for the requested configuration.
pub const CHECKPOINT_ENGINE_READY: f32 = 0.3;
/// Ceiling for inference-driven progress, reserving headroom for
/// persistence.
pub const INFERENCE_CEILING: f32 = 0.95;

/// Everything the pipeline needs for one job.
#[derive(Debug, Clone)]
pub struct JobContext {
    pub id: ProjectId,
    pub source_path: PathBuf,
    pub cache_dir: PathBuf,
    pub model: String,
    pub language: String,
    pub diarization: bool,
}

/// Map inference position to the 0.3..0.95 progress band.
pub fn inference_progress(seconds_done: f64, total_seconds: f64) -> f32 {
    if total_seconds <= 0.0 {
        return CHECKPOINT_ENGINE_READY;
    }
    let fraction = (seconds_done / total_seconds) as f32;
    (CHECKPOINT_ENGINE_READY + 0.65 * fraction).min(INFERENCE_CEILING)
}

/// Run the pipeline, routing the outcome into the event channel.
///
/// Never returns an error: every failure becomes a `Failed` event so the
/// consumer records it on the project and the process keeps running.
pub async fn execute(
    ctx: JobContext,
    pool: Arc<EnginePool>,
    tx: mpsc::UnboundedSender<ProgressEvent>,
) {
    match run_pipeline(&ctx, &pool, &tx).await {
        Ok(segments) => {
            info!(project = %ctx.id, segments = segments.len(), "transcription completed");
            let _ = tx.send(ProgressEvent::Completed { segments });
        }
        Err(e) => {
            warn!(project = %ctx.id, error = %e, "transcription failed");
            let _ = tx.send(ProgressEvent::Failed {
                error: e.to_string(),
            });
        }
    }
}

async fn run_pipeline(
    ctx: &JobContext,
    pool: &EnginePool,
    tx: &mpsc::UnboundedSender<ProgressEvent>,
) -> WorkerResult<Vec<Segment>> {
    let _ = tx.send(ProgressEvent::Checkpoint {
        progress: CHECKPOINT_STARTED,
    });

    // Resample to the mono 16 kHz WAV the engine requires
    let wav_path = ctx.cache_dir.join(format!("{}.wav", ctx.id));
    extract_audio(&ctx.source_path, &wav_path).await?;
    let _ = tx.send(ProgressEvent::Checkpoint {
        progress: CHECKPOINT_AUDIO_READY,
    });

    // Pick device by available VRAM; no GPU means CPU float32
    let gpu = probe_gpu().await;
    let vram = if gpu.available { gpu.vram_total_mb } else { 0 };
    let pick = pick_device(vram);
    let config = EngineConfig::new(&ctx.model, pick.device, pick.compute);
    let engine = pool.acquire(&config).await?;
    let _ = tx.send(ProgressEvent::Checkpoint {
        progress: CHECKPOINT_ENGINE_READY,
    });

    if ctx.diarization {
        debug!(project = %ctx.id, "diarization requested; assigning placeholder speaker labels");
    }

    let language = (ctx.language != "auto").then_some(ctx.language.as_str());
    let sink_tx = tx.clone();
    let sink: ProgressSink = Box::new(move |update| {
        let progress = inference_progress(update.seconds_done, update.total_seconds);
        let _ = sink_tx.send(ProgressEvent::Partial {
            progress,
            segments: update.segments,
        });
    });

    let transcription = engine.transcribe(&wav_path, language, &sink).await?;

    // The resampled artifact is transient; the uploaded source stays
    if let Err(e) = tokio::fs::remove_file(&wav_path).await {
        debug!(path = %wav_path.display(), error = %e, "temp wav not removed");
    }

    Ok(transcription.segments)
}
