//! In-memory job registry.
//!
//! Process-wide table of in-flight job state serving low-latency progress
//! polling while a job runs. A pure cache: losing it on restart never
//! corrupts the durable transcript store, which remains authoritative.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;

use scriba_models::{ProjectId, ProjectStatus, Segment};

/// Live state of one job.
#[derive(Debug, Clone, Serialize)]
pub struct JobState {
    pub id: ProjectId,
    pub status: ProjectStatus,
    pub progress: f32,
    pub file_name: String,
    pub model: String,
    pub language: String,
    pub diarization: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Partial segments streamed by the engine; final segments once
    /// the job completes
    pub segments: Vec<Segment>,
}

impl JobState {
    /// Freshly queued job state.
    pub fn queued(
        id: ProjectId,
        file_name: impl Into<String>,
        model: impl Into<String>,
        language: impl Into<String>,
        diarization: bool,
    ) -> Self {
        Self {
            id,
            status: ProjectStatus::Queued,
            progress: 0.0,
            file_name: file_name.into(),
            model: model.into(),
            language: language.into(),
            diarization,
            error: None,
            segments: Vec::new(),
        }
    }
}

/// Concurrently accessed job table with per-key locking.
///
/// Cheap to clone; all clones share the same map. Explicitly owned and
/// injected, never global, so orchestrators can be tested in isolation.
#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<DashMap<ProjectId, JobState>>,
    // Serializes count-then-insert admission; plain inserts bypass it
    admission: Arc<Mutex<()>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, state: JobState) {
        self.jobs.insert(state.id.clone(), state);
    }

    /// Insert a job only while the active count is under `cap`.
    ///
    /// The count and the insert happen under one lock, so concurrent
    /// admissions cannot both squeeze past the cap. `cap == 0` means
    /// unbounded.
    pub fn try_admit(&self, state: JobState, cap: usize) -> bool {
        let _guard = self.admission.lock();
        if cap > 0 && self.active_count() >= cap {
            return false;
        }
        self.insert(state);
        true
    }

    /// Snapshot of a job's state, if resident.
    pub fn get(&self, id: &ProjectId) -> Option<JobState> {
        self.jobs.get(id).map(|entry| entry.clone())
    }

    /// Mutate a job's state in place under its shard lock.
    pub fn update<F>(&self, id: &ProjectId, mutate: F)
    where
        F: FnOnce(&mut JobState),
    {
        if let Some(mut entry) = self.jobs.get_mut(id) {
            mutate(&mut entry);
        }
    }

    pub fn remove(&self, id: &ProjectId) {
        self.jobs.remove(id);
    }

    /// Number of jobs whose status is queued or running.
    pub fn active_count(&self) -> usize {
        self.jobs
            .iter()
            .filter(|entry| entry.status.is_active())
            .count()
    }

    pub fn clear(&self) {
        self.jobs.clear();
    }
}
