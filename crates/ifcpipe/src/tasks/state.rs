use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::ArtifactPaths;

/// Lifecycle of a parse.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }

    /// pending -> processing -> completed | failed, nothing else.
    pub fn can_transition_to(self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (TaskState::Pending, TaskState::Processing)
                | (TaskState::Processing, TaskState::Completed)
                | (TaskState::Processing, TaskState::Failed)
        )
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskState::Pending => write!(f, "pending"),
            TaskState::Processing => write!(f, "processing"),
            TaskState::Completed => write!(f, "completed"),
            TaskState::Failed => write!(f, "failed"),
        }
    }
}

/// The parse attached to one uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsingTask {
    pub state: TaskState,
    /// Set exactly when `state` is `Completed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<ArtifactPaths>,
    /// Set exactly when `state` is `Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Default for ParsingTask {
    fn default() -> Self {
        Self::new()
    }
}

impl ParsingTask {
    pub fn new() -> Self {
        Self {
            state: TaskState::Pending,
            artifacts: None,
            error: None,
            started_at: None,
            finished_at: None,
        }
    }

    /// Applies a transition; returns the rejected target state on an
    /// illegal move and leaves the task untouched.
    fn transition(&mut self, next: TaskState) -> Result<(), TaskState> {
        if !self.state.can_transition_to(next) {
            return Err(next);
        }
        self.state = next;
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), TaskState> {
        self.transition(TaskState::Processing)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    pub fn complete(&mut self, artifacts: ArtifactPaths) -> Result<(), TaskState> {
        self.transition(TaskState::Completed)?;
        self.artifacts = Some(artifacts);
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), TaskState> {
        self.transition(TaskState::Failed)?;
        self.error = Some(error.into());
        self.finished_at = Some(Utc::now());
        Ok(())
    }
}
