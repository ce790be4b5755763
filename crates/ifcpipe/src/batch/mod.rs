//! Bounded fan-out of cache-backed operations over a set of files.

pub mod combine;

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::unbounded;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};

use crate::cache::CacheManager;
use crate::extract::PropertyTable;
use crate::tasks::{FileRecord, FileRegistry, TaskState};

pub use combine::{CombinedTable, EntityCount, EntityCounts, TaggedRecord, SOURCE_COLUMN};

/// Default upper bound on batch workers.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Why a requested id took no part in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum SkipReason {
    Unknown,
    NotCompleted { state: TaskState },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skipped {
    pub file_id: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

impl std::fmt::Display for Skipped {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            SkipReason::Unknown => write!(f, "{}: unknown file id", self.file_id),
            SkipReason::NotCompleted { state } => {
                write!(f, "{}: not completed (state: {})", self.file_id, state)
            }
        }
    }
}

/// Outcome of one file in a batch.
#[derive(Debug, Clone)]
pub struct FileOutcome<T> {
    pub file_id: String,
    pub display_name: String,
    pub result: Result<T, String>,
}

/// Per-file outcomes in input order, plus the ids that were skipped.
#[derive(Debug, Clone)]
pub struct BatchOutcome<T> {
    pub outcomes: Vec<FileOutcome<T>>,
    pub skipped: Vec<Skipped>,
}

impl<T> BatchOutcome<T> {
    pub fn succeeded(&self) -> impl Iterator<Item = (&FileOutcome<T>, &T)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|v| (o, v)))
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileOutcome<T>> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }
}

pub struct BatchCoordinator {
    registry: Arc<FileRegistry>,
    cache: Arc<CacheManager>,
    concurrency: usize,
}

impl BatchCoordinator {
    pub fn new(registry: Arc<FileRegistry>, cache: Arc<CacheManager>, concurrency: usize) -> Self {
        Self {
            registry,
            cache,
            concurrency: concurrency.max(1),
        }
    }

    /// Resolves the property table of every completed file in `file_ids` and
    /// applies `operation` to it on at most `min(concurrency, n)` threads.
    ///
    /// Unknown and not-yet-completed ids are skipped. A panicking operation
    /// only fails its own file.
    pub fn run<T, F>(&self, file_ids: &[String], operation: F) -> BatchOutcome<T>
    where
        T: Send,
        F: Fn(&FileRecord, &PropertyTable) -> T + Sync,
    {
        let _span = info_span!("batch", requested = file_ids.len()).entered();

        let (eligible, skipped) = self.partition(file_ids);
        let workers = self.concurrency.min(eligible.len());
        if workers == 0 {
            info!(skipped = skipped.len(), "No eligible files in batch");
            return BatchOutcome {
                outcomes: Vec::new(),
                skipped,
            };
        }

        let (job_tx, job_rx) = unbounded::<(usize, &FileRecord)>();
        let (result_tx, result_rx) = unbounded::<(usize, Result<T, String>)>();
        for job in eligible.iter().enumerate() {
            let _ = job_tx.send(job);
        }
        drop(job_tx);

        thread::scope(|s| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                let operation = &operation;
                s.spawn(move || {
                    for (index, record) in job_rx.iter() {
                        let result = self.run_one(record, operation);
                        let _ = result_tx.send((index, result));
                    }
                });
            }
        });
        drop(result_tx);

        let mut results: Vec<Option<Result<T, String>>> =
            std::iter::repeat_with(|| None).take(eligible.len()).collect();
        for (index, result) in result_rx.iter() {
            results[index] = Some(result);
        }

        let outcomes: Vec<FileOutcome<T>> = eligible
            .iter()
            .zip(results)
            .map(|(record, result)| FileOutcome {
                file_id: record.id.clone(),
                display_name: record.display_name.clone(),
                result: result.unwrap_or_else(|| Err("Worker exited without a result".to_string())),
            })
            .collect();

        info!(
            files = outcomes.len(),
            workers,
            skipped = skipped.len(),
            "Batch finished"
        );
        BatchOutcome { outcomes, skipped }
    }

    /// Combines the tables of the completed files in `file_ids`, tagging each
    /// row with its file's display name. Files keep their row order and are
    /// appended in input order.
    pub fn extract_table(&self, file_ids: &[String]) -> CombinedTable {
        let outcome = self.run(file_ids, |_, table| table.clone());
        CombinedTable::from_outcome(outcome)
    }

    /// Element type counts per completed file.
    pub fn entity_counts(&self, file_ids: &[String]) -> Vec<EntityCounts> {
        let outcome = self.run(file_ids, |record, table| EntityCounts::from_table(record, table));
        for failed in outcome.failed() {
            warn!(file_id = %failed.file_id, "Entity counts failed");
        }
        outcome
            .outcomes
            .into_iter()
            .filter_map(|o| o.result.ok())
            .filter(|counts| !counts.counts.is_empty())
            .collect()
    }

    fn partition(&self, file_ids: &[String]) -> (Vec<FileRecord>, Vec<Skipped>) {
        let mut eligible = Vec::new();
        let mut skipped = Vec::new();

        for id in file_ids {
            let reason = match self.registry.get(id) {
                Some(record) if record.task.state == TaskState::Completed => {
                    eligible.push(record);
                    continue;
                }
                Some(record) => SkipReason::NotCompleted {
                    state: record.task.state,
                },
                None => SkipReason::Unknown,
            };
            let skip = Skipped {
                file_id: id.clone(),
                reason,
            };
            warn!("Skipping {}", skip);
            skipped.push(skip);
        }

        (eligible, skipped)
    }

    fn run_one<T, F>(&self, record: &FileRecord, operation: &F) -> Result<T, String>
    where
        F: Fn(&FileRecord, &PropertyTable) -> T,
    {
        panic::catch_unwind(AssertUnwindSafe(|| {
            let table = self.cache.resolve(&record.id, &record.path);
            debug!(file_id = %record.id, rows = table.len(), "Resolved table");
            operation(record, &table)
        }))
        .map_err(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "operation panicked".to_string());
            warn!(file_id = %record.id, error = %message, "Batch operation failed");
            message
        })
    }
}
