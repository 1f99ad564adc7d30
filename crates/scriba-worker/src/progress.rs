//! Progress event channel.
//!
//! The executor never touches the registry or store from inside the
//! inference loop: it pushes events down an mpsc channel and this
//! consumer applies them, keeping registry writes off the decoding path.
//! The consumer also enforces the monotonic-progress invariant.

use tokio::sync::mpsc;
use tracing::{error, warn};

use scriba_models::{ProjectId, ProjectStatus, Segment};
use scriba_store::TranscriptStore;

use crate::registry::JobRegistry;

/// Events emitted by the executor pipeline.
#[derive(Debug)]
pub enum ProgressEvent {
    /// A fixed pipeline checkpoint was reached (durably recorded)
    Checkpoint { progress: f32 },
    /// Inference advanced; partial segments for polling clients
    /// (registry only, not persisted)
    Partial { progress: f32, segments: Vec<Segment> },
    /// Pipeline finished; segments are the final transcript
    Completed { segments: Vec<Segment> },
    /// Pipeline aborted
    Failed { error: String },
}

/// Apply a job's progress events until its channel closes.
///
/// Checkpoints are mirrored into both registry and store; partials only
/// into the registry. On `Completed` the segments are persisted before
/// the completed status, so a crash in between leaves a running job with
/// its transcript already durable, never a completed job without one.
pub async fn apply_events(
    id: ProjectId,
    mut rx: mpsc::UnboundedReceiver<ProgressEvent>,
    registry: JobRegistry,
    store: TranscriptStore,
) {
    let mut last_progress: f32 = 0.0;

    while let Some(event) = rx.recv().await {
        match event {
            ProgressEvent::Checkpoint { progress } => {
                let progress = progress.max(last_progress);
                last_progress = progress;
                registry.update(&id, |state| {
                    state.status = ProjectStatus::Running;
                    state.progress = progress;
                });
                if let Err(e) =
                    store.update_status(&id, ProjectStatus::Running, Some(progress), None)
                {
                    warn!(project = %id, error = %e, "checkpoint not persisted");
                }
            }
            ProgressEvent::Partial { progress, segments } => {
                let progress = progress.max(last_progress);
                last_progress = progress;
                registry.update(&id, |state| {
                    state.progress = progress;
                    state.segments = segments;
                });
            }
            ProgressEvent::Completed { segments } => {
                let persisted = store
                    .replace_segments(&id, &segments)
                    .and_then(|_| {
                        store.update_status(&id, ProjectStatus::Completed, Some(1.0), None)
                    });
                match persisted {
                    Ok(()) => {
                        last_progress = 1.0;
                        registry.update(&id, |state| {
                            state.status = ProjectStatus::Completed;
                            state.progress = 1.0;
                            state.segments = segments;
                        });
                    }
                    Err(e) => {
                        error!(project = %id, error = %e, "failed to persist transcript");
                        fail(&id, &registry, &store, format!("persistence failed: {e}"));
                    }
                }
            }
            ProgressEvent::Failed { error } => {
                fail(&id, &registry, &store, error);
            }
        }
    }
}

fn fail(id: &ProjectId, registry: &JobRegistry, store: &TranscriptStore, message: String) {
    // Partial segments already cached stay readable for inspection
    registry.update(id, |state| {
        state.status = ProjectStatus::Failed;
        state.error = Some(message.clone());
    });
    if let Err(e) = store.update_status(id, ProjectStatus::Failed, None, Some(&message)) {
        warn!(project = %id, error = %e, "failure not persisted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::JobState;
    use scriba_models::Project;

    fn setup() -> (ProjectId, JobRegistry, TranscriptStore) {
        let id = ProjectId::new();
        let registry = JobRegistry::new();
        registry.insert(JobState::queued(id.clone(), "a.mp3", "medium", "auto", false));

        let store = TranscriptStore::in_memory().unwrap();
        store
            .create_project(&Project::new(
                id.clone(),
                "a.mp3",
                "a.mp3",
                "/tmp/a.mp3",
                "0".repeat(64),
                "medium",
                "auto",
                false,
            ))
            .unwrap();
        (id, registry, store)
    }

    fn segs() -> Vec<Segment> {
        vec![
            Segment::new("0", 0.0, 2.0, "Ciao a tutti."),
            Segment::new("1", 2.0, 4.0, "Questa è una prova."),
        ]
    }

    #[tokio::test]
    async fn checkpoints_hit_registry_and_store() {
        let (id, registry, store) = setup();
        let (tx, rx) = mpsc::unbounded_channel();

        tx.send(ProgressEvent::Checkpoint { progress: 0.1 }).unwrap();
        tx.send(ProgressEvent::Checkpoint { progress: 0.2 }).unwrap();
        drop(tx);
        apply_events(id.clone(), rx, registry.clone(), store.clone()).await;

        let state = registry.get(&id).unwrap();
        assert_eq!(state.status, ProjectStatus::Running);
        assert!((state.progress - 0.2).abs() < 1e-6);

        let project = store.get_project(&id).unwrap().unwrap();
        assert_eq!(project.status, ProjectStatus::Running);
        assert!((project.progress - 0.2).abs() < 1e-6);
    }

    #[tokio::test]
    async fn partials_update_registry_only() {
        let (id, registry, store) = setup();
        let (tx, rx) = mpsc::unbounded_channel();

        tx.send(ProgressEvent::Checkpoint { progress: 0.3 }).unwrap();
        tx.send(ProgressEvent::Partial {
            progress: 0.6,
            segments: segs(),
        })
        .unwrap();
        drop(tx);
        apply_events(id.clone(), rx, registry.clone(), store.clone()).await;

        assert_eq!(registry.get(&id).unwrap().segments.len(), 2);
        // Store progress stays at the last checkpoint; no segments persisted
        let project = store.get_project(&id).unwrap().unwrap();
        assert!((project.progress - 0.3).abs() < 1e-6);
        assert!(store.get_segments(&id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn progress_never_regresses() {
        let (id, registry, store) = setup();
        let (tx, rx) = mpsc::unbounded_channel();

        tx.send(ProgressEvent::Checkpoint { progress: 0.3 }).unwrap();
        tx.send(ProgressEvent::Partial {
            progress: 0.2,
            segments: Vec::new(),
        })
        .unwrap();
        drop(tx);
        apply_events(id.clone(), rx, registry.clone(), store.clone()).await;

        assert!((registry.get(&id).unwrap().progress - 0.3).abs() < 1e-6);
    }

    #[tokio::test]
    async fn completed_persists_segments_then_status() {
        let (id, registry, store) = setup();
        let (tx, rx) = mpsc::unbounded_channel();

        tx.send(ProgressEvent::Checkpoint { progress: 0.3 }).unwrap();
        tx.send(ProgressEvent::Completed { segments: segs() }).unwrap();
        drop(tx);
        apply_events(id.clone(), rx, registry.clone(), store.clone()).await;

        let project = store.get_project(&id).unwrap().unwrap();
        assert_eq!(project.status, ProjectStatus::Completed);
        assert_eq!(project.progress, 1.0);
        assert_eq!(store.get_segments(&id).unwrap().len(), 2);
        assert_eq!(registry.get(&id).unwrap().status, ProjectStatus::Completed);
    }

    #[tokio::test]
    async fn failure_records_error_and_keeps_partials() {
        let (id, registry, store) = setup();
        let (tx, rx) = mpsc::unbounded_channel();

        tx.send(ProgressEvent::Checkpoint { progress: 0.3 }).unwrap();
        tx.send(ProgressEvent::Partial {
            progress: 0.5,
            segments: segs(),
        })
        .unwrap();
        tx.send(ProgressEvent::Failed {
            error: "engine crashed".to_string(),
        })
        .unwrap();
        drop(tx);
        apply_events(id.clone(), rx, registry.clone(), store.clone()).await;

        let state = registry.get(&id).unwrap();
        assert_eq!(state.status, ProjectStatus::Failed);
        assert_eq!(state.error.as_deref(), Some("engine crashed"));
        // Partials remain inspectable in the registry
        assert_eq!(state.segments.len(), 2);

        let project = store.get_project(&id).unwrap().unwrap();
        assert_eq!(project.status, ProjectStatus::Failed);
        assert_eq!(project.error.as_deref(), Some("engine crashed"));
        // The store's segment table is untouched for failed jobs
        assert!(store.get_segments(&id).unwrap().is_empty());
    }
}
