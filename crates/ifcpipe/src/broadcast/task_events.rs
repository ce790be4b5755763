//! Task lifecycle events for hosts that want to stream progress instead of
//! polling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::storage::ArtifactPaths;
use crate::tasks::TaskState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEvent {
    pub file_id: String,
    /// Name the file was submitted under.
    pub filename: String,
    pub state: TaskState,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<ArtifactPaths>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskEvent {
    pub fn new(file_id: &str, filename: &str, state: TaskState, message: &str) -> Self {
        Self {
            file_id: file_id.to_string(),
            filename: filename.to_string(),
            state,
            message: message.to_string(),
            timestamp: Utc::now(),
            artifacts: None,
            error: None,
        }
    }

    pub fn completed(file_id: &str, filename: &str, artifacts: ArtifactPaths) -> Self {
        Self {
            artifacts: Some(artifacts),
            ..Self::new(file_id, filename, TaskState::Completed, "Parsing completed")
        }
    }

    pub fn failed(file_id: &str, filename: &str, error: &str) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new(file_id, filename, TaskState::Failed, "Parsing failed")
        }
    }
}

/// Fan-out of [`TaskEvent`]s. Sending never blocks and is a no-op without
/// subscribers.
#[derive(Clone)]
pub struct TaskEventBroadcaster {
    sender: broadcast::Sender<TaskEvent>,
}

impl TaskEventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn send(&self, event: TaskEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for TaskEventBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}
