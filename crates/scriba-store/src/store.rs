//! Project and segment persistence.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use tracing::debug;

use scriba_models::{Project, ProjectId, ProjectStatus, Segment};

use crate::database::Database;
use crate::error::{StoreError, StoreResult};

/// Durable record of projects and their segments.
#[derive(Clone)]
pub struct TranscriptStore {
    db: Database,
}

impl TranscriptStore {
    /// Open or create the store at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        Ok(Self {
            db: Database::open(path)?,
        })
    }

    /// In-memory store for tests.
    pub fn in_memory() -> StoreResult<Self> {
        Ok(Self {
            db: Database::in_memory()?,
        })
    }

    /// Insert a freshly queued project.
    pub fn create_project(&self, project: &Project) -> StoreResult<()> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO projects \
                 (id, name, file_name, file_path, file_hash, model, language, diarization, \
                  status, progress, error, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    project.id.as_str(),
                    project.name,
                    project.file_name,
                    project.file_path,
                    project.file_hash,
                    project.model,
                    project.language,
                    project.diarization,
                    project.status.as_str(),
                    project.progress as f64,
                    project.error,
                    project.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    /// Update status, and progress or error when given.
    pub fn update_status(
        &self,
        id: &ProjectId,
        status: ProjectStatus,
        progress: Option<f32>,
        error: Option<&str>,
    ) -> StoreResult<()> {
        debug!(project = %id, status = %status, ?progress, "status update");
        self.db.with_conn(|conn| {
            let changed = match (progress, error) {
                (Some(p), Some(e)) => conn.execute(
                    "UPDATE projects SET status = ?1, progress = ?2, error = ?3 WHERE id = ?4",
                    params![status.as_str(), p as f64, e, id.as_str()],
                )?,
                (Some(p), None) => conn.execute(
                    "UPDATE projects SET status = ?1, progress = ?2 WHERE id = ?3",
                    params![status.as_str(), p as f64, id.as_str()],
                )?,
                (None, Some(e)) => conn.execute(
                    "UPDATE projects SET status = ?1, error = ?2 WHERE id = ?3",
                    params![status.as_str(), e, id.as_str()],
                )?,
                (None, None) => conn.execute(
                    "UPDATE projects SET status = ?1 WHERE id = ?2",
                    params![status.as_str(), id.as_str()],
                )?,
            };
            if changed == 0 {
                return Err(StoreError::NotFound(id.to_string()));
            }
            Ok(())
        })
    }

    /// Swap the media file path after a verified re-upload.
    pub fn update_file_path(&self, id: &ProjectId, file_path: &str) -> StoreResult<()> {
        self.db.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE projects SET file_path = ?1 WHERE id = ?2",
                params![file_path, id.as_str()],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(id.to_string()));
            }
            Ok(())
        })
    }

    /// Atomically replace all segments of a project.
    ///
    /// Previous segments are deleted and the new set inserted inside one
    /// transaction, so readers never observe a partial replacement.
    pub fn replace_segments(&self, id: &ProjectId, segments: &[Segment]) -> StoreResult<()> {
        self.db.with_conn(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM segments WHERE project_id = ?1",
                params![id.as_str()],
            )?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO segments (project_id, start, \"end\", text, speaker, confidence) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )?;
                for seg in segments {
                    stmt.execute(params![
                        id.as_str(),
                        seg.start,
                        seg.end,
                        seg.text,
                        seg.speaker,
                        seg.confidence,
                    ])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
    }

    /// Fetch one project.
    pub fn get_project(&self, id: &ProjectId) -> StoreResult<Option<Project>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, file_name, file_path, file_hash, model, language, \
                 diarization, status, progress, error, created_at \
                 FROM projects WHERE id = ?1",
            )?;
            let mut rows = stmt.query_map(params![id.as_str()], project_from_row)?;
            match rows.next() {
                Some(row) => Ok(Some(row?)),
                None => Ok(None),
            }
        })
    }

    /// All projects, newest first.
    pub fn list_projects(&self) -> StoreResult<Vec<Project>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, file_name, file_path, file_hash, model, language, \
                 diarization, status, progress, error, created_at \
                 FROM projects ORDER BY created_at DESC",
            )?;
            let rows = stmt.query_map([], project_from_row)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
    }

    /// Segments of a project, ordered by start time ascending.
    pub fn get_segments(&self, id: &ProjectId) -> StoreResult<Vec<Segment>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, start, \"end\", text, speaker, confidence \
                 FROM segments WHERE project_id = ?1 ORDER BY start ASC",
            )?;
            let rows = stmt.query_map(params![id.as_str()], |row| {
                let rowid: i64 = row.get(0)?;
                Ok(Segment {
                    id: rowid.to_string(),
                    start: row.get(1)?,
                    end: row.get(2)?,
                    text: row.get(3)?,
                    speaker: row.get(4)?,
                    confidence: row.get(5)?,
                })
            })?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
    }

    /// Delete a project; segments cascade.
    pub fn delete_project(&self, id: &ProjectId) -> StoreResult<()> {
        self.db.with_conn(|conn| {
            conn.execute("DELETE FROM projects WHERE id = ?1", params![id.as_str()])?;
            Ok(())
        })
    }

    /// Remove every project and segment.
    pub fn clear_all(&self) -> StoreResult<()> {
        self.db.with_conn(|conn| {
            conn.execute("DELETE FROM projects", [])?;
            conn.execute("DELETE FROM segments", [])?;
            Ok(())
        })
    }
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    let status: String = row.get(8)?;
    let progress: f64 = row.get(9)?;
    let created_at: String = row.get(11)?;
    Ok(Project {
        id: ProjectId::from_string(row.get::<_, String>(0)?),
        name: row.get(1)?,
        file_name: row.get(2)?,
        file_path: row.get(3)?,
        file_hash: row.get(4)?,
        model: row.get(5)?,
        language: row.get(6)?,
        diarization: row.get(7)?,
        status: ProjectStatus::from_str_lossy(&status),
        progress: progress as f32,
        error: row.get(10)?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_default(),
    })
}
