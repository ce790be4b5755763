use std::sync::Arc;

use tracing::{debug, info_span, warn};

use crate::cache::CacheManager;
use crate::sanitize;
use crate::storage::{ArtifactPaths, ArtifactWriter};
use crate::tasks::FileRegistry;
use crate::worker::job::{JobResult, ParseJob};

use super::error::PipelineError;

/// Per-file parse: extract through the cache, write both exports, record
/// the outcome on the file's task.
pub struct ParsePipeline {
    registry: Arc<FileRegistry>,
    cache: Arc<CacheManager>,
    artifacts: ArtifactWriter,
}

impl ParsePipeline {
    pub fn new(
        registry: Arc<FileRegistry>,
        cache: Arc<CacheManager>,
        artifacts: ArtifactWriter,
    ) -> Self {
        Self {
            registry,
            cache,
            artifacts,
        }
    }

    pub fn run(&self, job: &ParseJob) -> JobResult {
        let _pipeline_span = info_span!("pipeline",
            file_id = %job.file_id,
            filename = %sanitize::redact_path(&job.source_path),
            path_hash = %sanitize::hash_path(&job.source_path),
        )
        .entered();

        if let Err(e) = self.registry.start(&job.file_id) {
            warn!(error = %e, "Task cannot be started");
            return JobResult::failure(job, e.to_string());
        }

        match self.process(job) {
            Ok((rows, artifacts)) => {
                if let Err(e) = self.registry.complete(&job.file_id, artifacts.clone()) {
                    warn!(error = %e, "Failed to record completion");
                    return JobResult::failure(job, e.to_string());
                }
                JobResult::success(job, rows, artifacts)
            }
            Err(e) => {
                let message = e.to_string();
                self.record_failure(job, &message);
                JobResult::failure(job, message)
            }
        }
    }

    /// Marks the task failed after the worker running it panicked.
    pub fn fail_after_panic(&self, job: &ParseJob) -> JobResult {
        let message = "Parsing aborted unexpectedly".to_string();
        self.record_failure(job, &message);
        JobResult::failure(job, message)
    }

    /// Fails a job that was still queued when the workers shut down.
    pub fn cancel(&self, job: &ParseJob) -> JobResult {
        let message = "Parsing cancelled by shutdown".to_string();
        if let Err(e) = self.registry.start(&job.file_id) {
            warn!(file_id = %job.file_id, error = %e, "Cancelled task cannot be started");
            return JobResult::failure(job, e.to_string());
        }
        self.record_failure(job, &message);
        JobResult::failure(job, message)
    }

    fn process(&self, job: &ParseJob) -> Result<(usize, ArtifactPaths), PipelineError> {
        let computed = {
            let _step = info_span!("extract_properties").entered();
            self.cache.compute(&job.file_id, &job.source_path)?
        };
        self.registry
            .set_cached_table(&job.file_id, computed.persisted.clone());

        if computed.table.is_empty() {
            return Err(PipelineError::NoOutput);
        }

        let _step = info_span!("write_artifacts").entered();
        let artifacts = self.artifacts.write(&job.file_id, &computed.table)?;
        debug!(rows = computed.table.len(), "Artifacts written");
        Ok((computed.table.len(), artifacts))
    }

    fn record_failure(&self, job: &ParseJob, message: &str) {
        if let Err(e) = self.registry.fail(&job.file_id, message) {
            warn!(error = %e, "Failed to record failure");
        }
    }
}
