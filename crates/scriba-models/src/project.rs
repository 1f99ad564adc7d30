//! Project (transcription job) definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a project / transcription job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl ProjectId {
    /// Generate a new random project ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Project lifecycle status.
///
/// `queued -> running -> {completed | failed}`. The terminal states have
/// no outgoing transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Job accepted, waiting for its pipeline task to start
    #[default]
    Queued,
    /// Pipeline task is running
    Running,
    /// Transcript persisted successfully
    Completed,
    /// Pipeline aborted with an error
    Failed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Queued => "queued",
            ProjectStatus::Running => "running",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Failed => "failed",
        }
    }

    /// Parse from the stored string form.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "running" => ProjectStatus::Running,
            "completed" => ProjectStatus::Completed,
            "failed" => ProjectStatus::Failed,
            _ => ProjectStatus::Queued,
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProjectStatus::Completed | ProjectStatus::Failed)
    }

    /// Whether a job in this state counts toward the active-job cap.
    pub fn is_active(&self) -> bool {
        matches!(self, ProjectStatus::Queued | ProjectStatus::Running)
    }

    /// Check whether `next` is a legal successor of `self`.
    pub fn can_transition(&self, next: ProjectStatus) -> bool {
        match self {
            ProjectStatus::Queued => matches!(next, ProjectStatus::Running | ProjectStatus::Failed),
            ProjectStatus::Running => {
                matches!(next, ProjectStatus::Completed | ProjectStatus::Failed)
            }
            ProjectStatus::Completed | ProjectStatus::Failed => false,
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A transcription project: one uploaded media file and its job state.
///
/// The durable record in the transcript store. Invariants:
/// - `progress` is monotonically non-decreasing over a job's lifetime
/// - `status == Completed` iff `progress == 1.0`
/// - `status == Failed` iff `error` is set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique project ID
    pub id: ProjectId,

    /// Display name (defaults to the uploaded file name)
    pub name: String,

    /// Original uploaded file name
    pub file_name: String,

    /// Path of the uploaded file in the cache directory
    pub file_path: String,

    /// SHA-256 hex digest of the uploaded bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_hash: Option<String>,

    /// Requested model identifier (e.g. "medium", "large-v3")
    pub model: String,

    /// Requested language: "auto" or an ISO code
    pub language: String,

    /// Whether speaker diarization was requested
    pub diarization: bool,

    /// Lifecycle status
    pub status: ProjectStatus,

    /// Progress in [0.0, 1.0]
    pub progress: f32,

    /// Error message, set only when `status == Failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// Create a freshly queued project.
    pub fn new(
        id: ProjectId,
        name: impl Into<String>,
        file_name: impl Into<String>,
        file_path: impl Into<String>,
        file_hash: impl Into<String>,
        model: impl Into<String>,
        language: impl Into<String>,
        diarization: bool,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            file_name: file_name.into(),
            file_path: file_path.into(),
            file_hash: Some(file_hash.into()),
            model: model.into(),
            language: language.into(),
            diarization,
            status: ProjectStatus::Queued,
            progress: 0.0,
            error: None,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_machine_legal_transitions() {
        assert!(ProjectStatus::Queued.can_transition(ProjectStatus::Running));
        assert!(ProjectStatus::Queued.can_transition(ProjectStatus::Failed));
        assert!(ProjectStatus::Running.can_transition(ProjectStatus::Completed));
        assert!(ProjectStatus::Running.can_transition(ProjectStatus::Failed));
    }

    #[test]
    fn test_state_machine_terminal_states() {
        for next in [
            ProjectStatus::Queued,
            ProjectStatus::Running,
            ProjectStatus::Completed,
            ProjectStatus::Failed,
        ] {
            assert!(!ProjectStatus::Completed.can_transition(next));
            assert!(!ProjectStatus::Failed.can_transition(next));
        }
    }

    #[test]
    fn test_completed_requires_running_first() {
        // Queued cannot skip straight to Completed
        assert!(!ProjectStatus::Queued.can_transition(ProjectStatus::Completed));
    }

    #[test]
    fn test_active_states() {
        assert!(ProjectStatus::Queued.is_active());
        assert!(ProjectStatus::Running.is_active());
        assert!(!ProjectStatus::Completed.is_active());
        assert!(!ProjectStatus::Failed.is_active());
    }

    #[test]
    fn test_status_serde_snake_case() {
        let json = serde_json::to_string(&ProjectStatus::Running).unwrap();
        assert_eq!(json, "\"running\"");
        let back: ProjectStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(back, ProjectStatus::Completed);
    }
}
