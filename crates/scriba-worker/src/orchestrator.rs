//! Job lifecycle controller.
//!
//! The facade the transport layer talks to: creates jobs, dispatches them
//! to the executor, and reconciles registry and store when answering
//! status queries. The registry answers while a job is resident; the
//! store is the authoritative fallback.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::sync::mpsc;
use tracing::{info, warn};

use scriba_engine::EnginePool;
use scriba_export::{ExportFormat, ExportOptions};
use scriba_media::{disk_usage, probe_gpu, DiskUsage, GpuInfo};
use scriba_models::{Project, ProjectId, ProjectStatus, Segment};
use scriba_store::TranscriptStore;

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::executor::{self, JobContext};
use crate::progress;
use crate::registry::{JobRegistry, JobState};

/// Backend version reported by the system status endpoint.
pub const BACKEND_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A new transcription job.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub model: String,
    pub language: String,
    pub diarization: bool,
}

/// Answer to a poll query.
#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot {
    pub status: ProjectStatus,
    pub progress: f32,
    pub segments: Vec<Segment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// An export request.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub job_id: ProjectId,
    pub format: String,
    pub include_speakers: bool,
}

/// Rendered export content.
#[derive(Debug, Clone, Serialize)]
pub struct ExportRendering {
    pub content: String,
    pub format: &'static str,
    #[serde(skip)]
    pub mime_type: &'static str,
}

/// System capability report.
#[derive(Debug, Clone, Serialize)]
pub struct SystemStatus {
    pub gpu: GpuInfo,
    pub disk: DiskUsage,
    pub active_jobs: usize,
    pub backend_version: &'static str,
}

/// Orchestrates the full job lifecycle.
#[derive(Clone)]
pub struct Orchestrator {
    config: WorkerConfig,
    registry: JobRegistry,
    store: TranscriptStore,
    pool: Arc<EnginePool>,
}

impl Orchestrator {
    /// Create an orchestrator, ensuring the cache directory exists.
    pub fn new(
        config: WorkerConfig,
        store: TranscriptStore,
        pool: Arc<EnginePool>,
    ) -> WorkerResult<Self> {
        std::fs::create_dir_all(&config.cache_dir)?;
        Ok(Self {
            config,
            registry: JobRegistry::new(),
            store,
            pool,
        })
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn store(&self) -> &TranscriptStore {
        &self.store
    }

    /// Accept an upload and dispatch its pipeline.
    ///
    /// The project record and the registry entry are created together,
    /// both `queued` at progress 0.0, before the executor task starts.
    pub async fn submit(&self, req: SubmitRequest) -> WorkerResult<ProjectId> {
        let file_name = sanitize_file_name(&req.file_name)
            .ok_or_else(|| WorkerError::validation("empty file name"))?;
        if req.bytes.is_empty() {
            return Err(WorkerError::validation("no file provided"));
        }

        let id = ProjectId::new();
        let model = if req.model.is_empty() {
            self.config.default_model.clone()
        } else {
            req.model.clone()
        };

        let admitted = self.registry.try_admit(
            JobState::queued(id.clone(), &file_name, &model, &req.language, req.diarization),
            self.config.max_active_jobs,
        );
        if !admitted {
            return Err(WorkerError::busy(format!(
                "{} jobs already active",
                self.config.max_active_jobs
            )));
        }

        // The registry entry is in; roll it back if persisting the upload
        // or the project record fails.
        let file_path = self.config.cache_dir.join(format!("{id}_{file_name}"));
        if let Err(e) = tokio::fs::write(&file_path, &req.bytes).await {
            self.registry.remove(&id);
            return Err(e.into());
        }
        let file_hash = sha256_hex(&req.bytes);

        let project = Project::new(
            id.clone(),
            &file_name,
            &file_name,
            file_path.to_string_lossy(),
            &file_hash,
            &model,
            &req.language,
            req.diarization,
        );
        if let Err(e) = self.store.create_project(&project) {
            self.registry.remove(&id);
            return Err(e.into());
        }

        info!(project = %id, file = %file_name, model = %model, "job submitted");

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(progress::apply_events(
            id.clone(),
            rx,
            self.registry.clone(),
            self.store.clone(),
        ));

        let ctx = JobContext {
            id: id.clone(),
            source_path: file_path,
            cache_dir: self.config.cache_dir.clone(),
            model,
            language: req.language,
            diarization: req.diarization,
        };
        tokio::spawn(executor::execute(ctx, Arc::clone(&self.pool), tx));

        Ok(id)
    }

    /// Poll a job: registry first for live progress, store as fallback.
    pub fn status(&self, id: &ProjectId) -> WorkerResult<JobSnapshot> {
        if let Some(state) = self.registry.get(id) {
            return Ok(JobSnapshot {
                status: state.status,
                progress: state.progress,
                segments: state.segments,
                error: state.error,
            });
        }

        let project = self
            .store
            .get_project(id)?
            .ok_or_else(|| WorkerError::not_found(format!("job {id}")))?;
        let segments = if project.status == ProjectStatus::Completed {
            self.store.get_segments(id)?
        } else {
            Vec::new()
        };
        Ok(JobSnapshot {
            status: project.status,
            progress: project.progress,
            segments,
            error: project.error,
        })
    }

    /// All projects, newest first.
    pub fn list_projects(&self) -> WorkerResult<Vec<Project>> {
        Ok(self.store.list_projects()?)
    }

    /// One project with its segments.
    pub fn project_detail(&self, id: &ProjectId) -> WorkerResult<(Project, Vec<Segment>)> {
        let project = self
            .store
            .get_project(id)?
            .ok_or_else(|| WorkerError::not_found(format!("project {id}")))?;
        let segments = self.store.get_segments(id)?;
        Ok((project, segments))
    }

    /// Path of the original media file, when it is still on disk.
    pub fn media_path(&self, id: &ProjectId) -> WorkerResult<PathBuf> {
        let project = self
            .store
            .get_project(id)?
            .ok_or_else(|| WorkerError::not_found(format!("project {id}")))?;
        let path = PathBuf::from(&project.file_path);
        if !path.exists() {
            return Err(WorkerError::not_found("media file missing on disk"));
        }
        Ok(path)
    }

    /// Re-attach the media file for an existing project.
    ///
    /// Only accepted when the new content hashes to the originally
    /// recorded digest; a mismatch rejects the upload without mutating
    /// any stored state.
    pub async fn reupload(
        &self,
        id: &ProjectId,
        file_name: &str,
        bytes: &[u8],
    ) -> WorkerResult<()> {
        let project = self
            .store
            .get_project(id)?
            .ok_or_else(|| WorkerError::not_found(format!("project {id}")))?;
        let file_name = sanitize_file_name(file_name)
            .ok_or_else(|| WorkerError::validation("empty file name"))?;
        if bytes.is_empty() {
            return Err(WorkerError::validation("no file provided"));
        }

        let new_hash = sha256_hex(bytes);
        if let Some(stored) = project.file_hash.as_deref() {
            if stored != new_hash {
                return Err(WorkerError::HashMismatch);
            }
        }

        let file_path = self.config.cache_dir.join(format!("{id}_{file_name}"));
        tokio::fs::write(&file_path, bytes).await?;
        self.store
            .update_file_path(id, &file_path.to_string_lossy())?;

        info!(project = %id, "media re-uploaded");
        Ok(())
    }

    /// Render the stored transcript in the requested format.
    pub fn export(&self, req: &ExportRequest) -> WorkerResult<ExportRendering> {
        let format: ExportFormat = req
            .format
            .parse()
            .map_err(|e: scriba_export::format::UnknownFormat| {
                WorkerError::validation(e.to_string())
            })?;

        let segments = self.store.get_segments(&req.job_id)?;
        if segments.is_empty() {
            return Err(WorkerError::not_found("no segments for this job"));
        }

        let source_name = self
            .store
            .get_project(&req.job_id)?
            .map(|p| p.name)
            .unwrap_or_else(|| "transcription".to_string());

        let opts = ExportOptions {
            speaker_labels: req.include_speakers,
            source_name,
        };
        Ok(ExportRendering {
            content: scriba_export::render(format, &segments, &opts),
            format: format.as_str(),
            mime_type: format.mime_type(),
        })
    }

    /// Delete a project: media file, registry entry and rows (segments
    /// cascade).
    pub async fn delete(&self, id: &ProjectId) -> WorkerResult<()> {
        if let Some(project) = self.store.get_project(id)? {
            let path = PathBuf::from(&project.file_path);
            if path.exists() {
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    warn!(project = %id, error = %e, "media file not removed");
                }
            }
        }
        self.store.delete_project(id)?;
        self.registry.remove(id);
        Ok(())
    }

    /// Empty the filesystem cache and the registry.
    pub async fn clear_cache(&self) -> WorkerResult<()> {
        let mut entries = tokio::fs::read_dir(&self.config.cache_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let removed = if path.is_dir() {
                tokio::fs::remove_dir_all(&path).await
            } else {
                tokio::fs::remove_file(&path).await
            };
            if let Err(e) = removed {
                warn!(path = %path.display(), error = %e, "cache entry not removed");
            }
        }
        self.registry.clear();
        Ok(())
    }

    /// GPU, disk and queue capability report.
    pub async fn system_status(&self) -> WorkerResult<SystemStatus> {
        let gpu = probe_gpu().await;
        let disk = disk_usage(&self.config.cache_dir)?;
        Ok(SystemStatus {
            gpu,
            disk,
            active_jobs: self.registry.active_count(),
            backend_version: BACKEND_VERSION,
        })
    }

    /// Startup sweep: a durably `queued`/`running` project with no
    /// registry entry was orphaned by a restart; mark it failed so it
    /// does not stay active forever.
    pub fn recover_orphans(&self) -> WorkerResult<usize> {
        let mut recovered = 0;
        for project in self.store.list_projects()? {
            if project.status.is_active() && self.registry.get(&project.id).is_none() {
                self.store.update_status(
                    &project.id,
                    ProjectStatus::Failed,
                    None,
                    Some("interrupted by backend restart"),
                )?;
                recovered += 1;
            }
        }
        if recovered > 0 {
            info!(count = recovered, "orphaned jobs marked failed");
        }
        Ok(recovered)
    }
}

/// Strip directories and suspicious characters from an uploaded name.
fn sanitize_file_name(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.').to_string();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_') {
        None
    } else {
        Some(cleaned)
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriba_engine::ScriptedFactory;
    use tempfile::TempDir;

    fn orchestrator(cache: &TempDir, max_active: usize) -> Orchestrator {
        let config = WorkerConfig {
            cache_dir: cache.path().to_path_buf(),
            max_active_jobs: max_active,
            default_model: "medium".to_string(),
        };
        let pool = Arc::new(EnginePool::new(Arc::new(ScriptedFactory::new(
            Vec::new(),
            0.0,
        ))));
        Orchestrator::new(config, TranscriptStore::in_memory().unwrap(), pool).unwrap()
    }

    fn seeded_project(orch: &Orchestrator, bytes: &[u8]) -> ProjectId {
        let id = ProjectId::new();
        let project = Project::new(
            id.clone(),
            "audio.mp3",
            "audio.mp3",
            "/tmp/cache/audio.mp3",
            sha256_hex(bytes),
            "medium",
            "auto",
            false,
        );
        orch.store.create_project(&project).unwrap();
        id
    }

    #[test]
    fn sanitize_file_name_strips_paths_and_specials() {
        assert_eq!(sanitize_file_name("a b.mp3").as_deref(), Some("a_b.mp3"));
        assert_eq!(
            sanitize_file_name("../../etc/passwd").as_deref(),
            Some("passwd")
        );
        assert_eq!(
            sanitize_file_name("C:\\clip.mp4").as_deref(),
            Some("clip.mp4")
        );
        assert_eq!(sanitize_file_name(""), None);
        assert_eq!(sanitize_file_name("???"), None);
    }

    #[test]
    fn sha256_matches_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn submit_rejects_empty_upload() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir, 0);

        let err = orch
            .submit(SubmitRequest {
                file_name: "a.mp3".into(),
                bytes: Vec::new(),
                model: "medium".into(),
                language: "auto".into(),
                diarization: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::Validation(_)));

        let err = orch
            .submit(SubmitRequest {
                file_name: "".into(),
                bytes: b"data".to_vec(),
                model: "medium".into(),
                language: "auto".into(),
                diarization: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::Validation(_)));
    }

    #[tokio::test]
    async fn submit_enforces_admission_cap() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir, 1);

        // Fill the single slot by hand
        orch.registry.insert(JobState::queued(
            ProjectId::new(),
            "busy.mp3",
            "medium",
            "auto",
            false,
        ));

        let err = orch
            .submit(SubmitRequest {
                file_name: "b.mp3".into(),
                bytes: b"data".to_vec(),
                model: "medium".into(),
                language: "auto".into(),
                diarization: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::Busy(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn reupload_rejects_hash_mismatch_without_mutation() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir, 0);
        let id = seeded_project(&orch, b"original bytes");

        let err = orch
            .reupload(&id, "audio.mp3", b"different bytes")
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::HashMismatch));

        let project = orch.store.get_project(&id).unwrap().unwrap();
        assert_eq!(project.file_path, "/tmp/cache/audio.mp3");
    }

    #[tokio::test]
    async fn reupload_accepts_matching_content() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir, 0);
        let id = seeded_project(&orch, b"original bytes");

        orch.reupload(&id, "audio.mp3", b"original bytes")
            .await
            .unwrap();

        let project = orch.store.get_project(&id).unwrap().unwrap();
        assert!(project.file_path.contains(&format!("{id}_audio.mp3")));
        assert!(PathBuf::from(&project.file_path).exists());
    }

    #[tokio::test]
    async fn status_falls_back_to_store_when_not_resident() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir, 0);
        let id = seeded_project(&orch, b"x");

        orch.store
            .update_status(&id, ProjectStatus::Running, Some(0.4), None)
            .unwrap();
        // Not completed: no segments surfaced
        let snap = orch.status(&id).unwrap();
        assert_eq!(snap.status, ProjectStatus::Running);
        assert!(snap.segments.is_empty());

        orch.store
            .replace_segments(&id, &[Segment::new("0", 0.0, 1.0, "ciao")])
            .unwrap();
        orch.store
            .update_status(&id, ProjectStatus::Completed, Some(1.0), None)
            .unwrap();
        let snap = orch.status(&id).unwrap();
        assert_eq!(snap.status, ProjectStatus::Completed);
        assert_eq!(snap.segments.len(), 1);
    }

    #[tokio::test]
    async fn status_of_unknown_job_is_not_found() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir, 0);
        let err = orch.status(&ProjectId::new()).unwrap_err();
        assert!(matches!(err, WorkerError::NotFound(_)));
    }

    #[tokio::test]
    async fn export_unknown_format_is_a_validation_error() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir, 0);
        let id = seeded_project(&orch, b"x");

        let err = orch
            .export(&ExportRequest {
                job_id: id,
                format: "docx".into(),
                include_speakers: true,
            })
            .unwrap_err();
        assert!(matches!(err, WorkerError::Validation(_)));
    }

    #[tokio::test]
    async fn export_renders_stored_segments() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir, 0);
        let id = seeded_project(&orch, b"x");
        orch.store
            .replace_segments(
                &id,
                &[
                    Segment::new("0", 0.0, 2.0, "Ciao a tutti."),
                    Segment::new("1", 2.0, 4.0, "Questa è una prova."),
                ],
            )
            .unwrap();

        let rendering = orch
            .export(&ExportRequest {
                job_id: id.clone(),
                format: "mcp".into(),
                include_speakers: true,
            })
            .unwrap();
        let data: serde_json::Value = serde_json::from_str(&rendering.content).unwrap();
        assert_eq!(data["metadata"]["source"], "audio.mp3");
        assert_eq!(data["text"], "Ciao a tutti. Questa è una prova.");

        // A job with no segments has nothing to export
        orch.store.replace_segments(&id, &[]).unwrap();
        let err = orch
            .export(&ExportRequest {
                job_id: id,
                format: "srt".into(),
                include_speakers: true,
            })
            .unwrap_err();
        assert!(matches!(err, WorkerError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_removes_rows_registry_and_media() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir, 0);
        let id = seeded_project(&orch, b"original bytes");
        orch.reupload(&id, "audio.mp3", b"original bytes")
            .await
            .unwrap();
        orch.store
            .replace_segments(&id, &[Segment::new("0", 0.0, 1.0, "ciao")])
            .unwrap();
        let media = orch.media_path(&id).unwrap();

        orch.delete(&id).await.unwrap();

        assert!(!media.exists());
        assert!(orch.store.get_segments(&id).unwrap().is_empty());
        assert!(matches!(
            orch.status(&id).unwrap_err(),
            WorkerError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn clear_cache_empties_dir_and_registry() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir, 0);
        std::fs::write(dir.path().join("stale.wav"), b"x").unwrap();
        orch.registry.insert(JobState::queued(
            ProjectId::new(),
            "a.mp3",
            "medium",
            "auto",
            false,
        ));

        orch.clear_cache().await.unwrap();

        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
        assert_eq!(orch.registry.active_count(), 0);
    }

    #[tokio::test]
    async fn recover_orphans_fails_stranded_jobs() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir, 0);
        let id = seeded_project(&orch, b"x");
        orch.store
            .update_status(&id, ProjectStatus::Running, Some(0.4), None)
            .unwrap();

        let recovered = orch.recover_orphans().unwrap();
        assert_eq!(recovered, 1);

        let project = orch.store.get_project(&id).unwrap().unwrap();
        assert_eq!(project.status, ProjectStatus::Failed);
        assert_eq!(
            project.error.as_deref(),
            Some("interrupted by backend restart")
        );

        // Second sweep finds nothing
        assert_eq!(orch.recover_orphans().unwrap(), 0);
    }
}
