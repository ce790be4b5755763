//! Entry point wiring the registry, cache, worker pool and batch coordinator.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::batch::{BatchCoordinator, CombinedTable, EntityCounts};
use crate::broadcast::{TaskEvent, TaskEventBroadcaster};
use crate::cache::CacheManager;
use crate::config::Config;
use crate::error::{Result, TaskError, WorkerError};
use crate::extract::{Extractor, IfcExtractor};
use crate::graph::{self, GraphBuild};
use crate::model::{self, ModelMetadata};
use crate::pipeline::ParsePipeline;
use crate::sanitize;
use crate::storage::{ArtifactWriter, FileStorage};
use crate::tasks::{FileRecord, FileRegistry, TaskState, TaskStatus};
use crate::worker::{ParseJob, ParseWorkerPool};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// A running ingestion service. Dropping it without [`IfcPipe::close`]
/// detaches the workers.
pub struct IfcPipe {
    config: Config,
    registry: Arc<FileRegistry>,
    batch: BatchCoordinator,
    pool: ParseWorkerPool,
    events: TaskEventBroadcaster,
}

impl IfcPipe {
    /// Starts the service with the on-disk extractor. The storage
    /// directories must already exist (see [`Config::ensure_directories`]).
    pub fn new(config: Config) -> Result<Self> {
        Self::with_extractor(config, Arc::new(IfcExtractor))
    }

    pub fn with_extractor(config: Config, extractor: Arc<dyn Extractor>) -> Result<Self> {
        let events = TaskEventBroadcaster::default();
        let registry = Arc::new(FileRegistry::new(events.clone()));
        let cache = Arc::new(CacheManager::new(
            FileStorage::new(config.cache_dir()),
            config.memory_cache_capacity,
            extractor,
        ));

        let pipeline = Arc::new(ParsePipeline::new(
            Arc::clone(&registry),
            Arc::clone(&cache),
            ArtifactWriter::new(FileStorage::new(config.artifact_dir())),
        ));
        let pool = ParseWorkerPool::new(
            pipeline,
            config.worker_count,
            config.effective_queue_capacity(),
        )?;
        let batch = BatchCoordinator::new(Arc::clone(&registry), cache, config.batch_concurrency);

        info!(
            workers = config.worker_count,
            queue = config.effective_queue_capacity(),
            batch_concurrency = config.batch_concurrency,
            "ifcpipe started"
        );

        Ok(Self {
            config,
            registry,
            batch,
            pool,
            events,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Arc<FileRegistry> {
        &self.registry
    }

    /// Registers `path` and queues its parse, waiting for queue room if
    /// needed. Returns the new file id without waiting for the parse.
    pub fn submit(&self, path: &Path) -> Result<String> {
        let (id, job) = self.register(path);
        if let Err(e) = self.pool.submit(job) {
            self.reject(&id, &e);
            return Err(e.into());
        }
        Ok(id)
    }

    /// Like [`IfcPipe::submit`] but fails with [`WorkerError::QueueFull`]
    /// instead of waiting. A rejected file is not registered.
    pub fn try_submit(&self, path: &Path) -> Result<String> {
        let (id, job) = self.register(path);
        if let Err(e) = self.pool.try_submit(job) {
            self.reject(&id, &e);
            return Err(e.into());
        }
        Ok(id)
    }

    fn register(&self, path: &Path) -> (String, ParseJob) {
        let metadata = model::extract_metadata(path).unwrap_or_else(|e| {
            warn!(file = %sanitize::redact_path(path), error = %e, "Metadata unavailable");
            ModelMetadata::default()
        });
        let id = self.registry.register(path, metadata);
        let job = ParseJob::new(id.clone(), path);
        (id, job)
    }

    fn reject(&self, id: &str, error: &WorkerError) {
        warn!(file_id = id, error = %error, "Submission rejected");
        self.registry.withdraw(id);
    }

    pub fn status(&self, file_id: &str) -> Result<TaskStatus> {
        Ok(self.registry.status(file_id)?)
    }

    pub fn statuses(&self) -> Vec<TaskStatus> {
        self.registry.statuses()
    }

    pub fn file(&self, file_id: &str) -> Option<FileRecord> {
        self.registry.get(file_id)
    }

    /// Polls until the task of `file_id` is completed or failed.
    pub fn wait_for(&self, file_id: &str, timeout: Duration) -> Result<TaskStatus> {
        let deadline = Instant::now() + timeout;
        loop {
            let status = self.registry.status(file_id)?;
            if status.state.is_terminal() {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                return Err(TaskError::Timeout(file_id.to_string()).into());
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    /// Waits for every id in turn, sharing one deadline.
    pub fn wait_all(&self, file_ids: &[String], timeout: Duration) -> Result<Vec<TaskStatus>> {
        let deadline = Instant::now() + timeout;
        file_ids
            .iter()
            .map(|id| self.wait_for(id, deadline.saturating_duration_since(Instant::now())))
            .collect()
    }

    /// Combined property table of the completed files in `file_ids`.
    pub fn extract_table(&self, file_ids: &[String]) -> CombinedTable {
        self.batch.extract_table(file_ids)
    }

    pub fn entity_counts(&self, file_ids: &[String]) -> Vec<EntityCounts> {
        self.batch.entity_counts(file_ids)
    }

    /// Builds the relationship graph of a completed file.
    pub fn render_graph(&self, file_id: &str) -> Result<GraphBuild> {
        let Some(record) = self.registry.get(file_id) else {
            debug!(file_id, "Graph requested for unknown file");
            return Err(TaskError::NotFound(file_id.to_string()).into());
        };
        if record.task.state != TaskState::Completed {
            return Err(TaskError::NotCompleted {
                id: file_id.to_string(),
                state: record.task.state,
            }
            .into());
        }
        Ok(graph::build_from_path(&record.path)?)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.events.subscribe()
    }

    /// Processes everything still queued, then stops the workers.
    pub fn close(self) {
        self.pool.wait();
    }

    /// Stops the workers after their current file; queued files are failed.
    pub fn shutdown(self) {
        self.pool.shutdown();
        self.pool.wait();
    }
}
