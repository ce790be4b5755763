use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::state::{ParsingTask, TaskState};
use crate::broadcast::{TaskEvent, TaskEventBroadcaster};
use crate::error::TaskError;
use crate::model::ModelMetadata;
use crate::storage::ArtifactPaths;

/// An uploaded model file and its parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    /// Name the file was uploaded under.
    pub display_name: String,
    pub path: PathBuf,
    pub metadata: ModelMetadata,
    pub task: ParsingTask,
    /// Persisted property table, once one has been written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_table: Option<PathBuf>,
    pub submitted_at: DateTime<Utc>,
}

/// Polling view of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    pub file_id: String,
    pub filename: String,
    pub state: TaskState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<ArtifactPaths>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&FileRecord> for TaskStatus {
    fn from(record: &FileRecord) -> Self {
        Self {
            file_id: record.id.clone(),
            filename: record.display_name.clone(),
            state: record.task.state,
            artifacts: record.task.artifacts.clone(),
            error: record.task.error.clone(),
        }
    }
}

/// Process-wide store of file records. Each record sits behind its own shard
/// lock, so a status read never sees a half-applied transition and unrelated
/// files do not contend.
pub struct FileRegistry {
    records: DashMap<String, FileRecord>,
    events: TaskEventBroadcaster,
}

impl FileRegistry {
    pub fn new(events: TaskEventBroadcaster) -> Self {
        Self {
            records: DashMap::new(),
            events,
        }
    }

    /// Registers a file under a fresh id with its task in `pending`.
    pub fn register(&self, path: &Path, metadata: ModelMetadata) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.register_with_id(&id, path, metadata);
        id
    }

    pub fn register_with_id(&self, id: &str, path: &Path, metadata: ModelMetadata) {
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| id.to_string());

        let record = FileRecord {
            id: id.to_string(),
            display_name: display_name.clone(),
            path: path.to_path_buf(),
            metadata,
            task: ParsingTask::new(),
            cached_table: None,
            submitted_at: Utc::now(),
        };
        if self.records.insert(id.to_string(), record).is_some() {
            warn!("File id {} registered twice, previous record replaced", id);
        }
        info!("Registered {} as {}", display_name, id);
        self.events
            .send(TaskEvent::new(id, &display_name, TaskState::Pending, "Queued"));
    }

    pub fn get(&self, id: &str) -> Option<FileRecord> {
        self.records.get(id).map(|r| r.value().clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn state(&self, id: &str) -> Option<TaskState> {
        self.records.get(id).map(|r| r.task.state)
    }

    pub fn status(&self, id: &str) -> Result<TaskStatus, TaskError> {
        match self.records.get(id) {
            Some(record) => Ok(TaskStatus::from(record.value())),
            None => {
                debug!("Status requested for unknown file {}", id);
                Err(TaskError::NotFound(id.to_string()))
            }
        }
    }

    pub fn statuses(&self) -> Vec<TaskStatus> {
        let mut all: Vec<(DateTime<Utc>, TaskStatus)> = self
            .records
            .iter()
            .map(|r| (r.submitted_at, TaskStatus::from(r.value())))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.file_id.cmp(&b.1.file_id)));
        all.into_iter().map(|(_, s)| s).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn start(&self, id: &str) -> Result<(), TaskError> {
        let name = self.update(id, |task| task.start())?;
        debug!("Parsing {} ({})", name, id);
        self.events
            .send(TaskEvent::new(id, &name, TaskState::Processing, "Parsing started"));
        Ok(())
    }

    pub fn complete(&self, id: &str, artifacts: ArtifactPaths) -> Result<(), TaskError> {
        let event_artifacts = artifacts.clone();
        let name = self.update(id, move |task| task.complete(artifacts))?;
        info!("Parsing {} ({}) completed", name, id);
        self.events
            .send(TaskEvent::completed(id, &name, event_artifacts));
        Ok(())
    }

    pub fn fail(&self, id: &str, error: &str) -> Result<(), TaskError> {
        let name = self.update(id, |task| task.fail(error))?;
        warn!("Parsing {} ({}) failed: {}", name, id, error);
        self.events.send(TaskEvent::failed(id, &name, error));
        Ok(())
    }

    /// Removes a record whose job never reached the queue.
    pub fn withdraw(&self, id: &str) -> Option<FileRecord> {
        let removed = self.records.remove(id).map(|(_, record)| record);
        if removed.is_some() {
            debug!("Withdrew {}", id);
        }
        removed
    }

    pub fn set_cached_table(&self, id: &str, location: Option<PathBuf>) {
        if let Some(mut record) = self.records.get_mut(id) {
            record.cached_table = location;
        }
    }

    /// Applies `f` to the task under the record's lock. Returns the display
    /// name for logging.
    fn update<F>(&self, id: &str, f: F) -> Result<String, TaskError>
    where
        F: FnOnce(&mut ParsingTask) -> Result<(), TaskState>,
    {
        let mut record = self
            .records
            .get_mut(id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        let from = record.task.state;
        f(&mut record.task).map_err(|to| TaskError::InvalidTransition {
            id: id.to_string(),
            from,
            to,
        })?;
        Ok(record.display_name.clone())
    }
}

impl Default for FileRegistry {
    fn default() -> Self {
        Self::new(TaskEventBroadcaster::default())
    }
}
