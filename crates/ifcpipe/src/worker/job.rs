use std::path::PathBuf;

use crate::storage::ArtifactPaths;

/// One queued parse of a registered file.
#[derive(Debug, Clone)]
pub struct ParseJob {
    pub file_id: String,
    pub source_path: PathBuf,
}

impl ParseJob {
    pub fn new(file_id: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            file_id: file_id.into(),
            source_path: source_path.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JobResult {
    pub file_id: String,
    pub success: bool,
    pub rows: usize,
    pub artifacts: Option<ArtifactPaths>,
    pub error: Option<String>,
}

impl JobResult {
    pub fn success(job: &ParseJob, rows: usize, artifacts: ArtifactPaths) -> Self {
        Self {
            file_id: job.file_id.clone(),
            success: true,
            rows,
            artifacts: Some(artifacts),
            error: None,
        }
    }

    pub fn failure(job: &ParseJob, error: String) -> Self {
        Self {
            file_id: job.file_id.clone(),
            success: false,
            rows: 0,
            artifacts: None,
            error: Some(error),
        }
    }
}
