use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{debug, error, info};

use crate::error::WorkerError;
use crate::pipeline::ParsePipeline;
use crate::worker::job::ParseJob;

/// Fixed set of parse workers fed from a bounded queue. A full queue blocks
/// `submit` and rejects `try_submit`, so intake never outruns processing.
pub struct ParseWorkerPool {
    job_sender: Sender<ParseJob>,
    /// Kept to drain jobs left behind by a shutdown.
    job_receiver: Receiver<ParseJob>,
    pipeline: Arc<ParsePipeline>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl ParseWorkerPool {
    /// Starts `worker_count` workers (at least one) behind a queue holding
    /// `queue_capacity` jobs.
    pub fn new(
        pipeline: Arc<ParsePipeline>,
        worker_count: usize,
        queue_capacity: usize,
    ) -> Result<Self, WorkerError> {
        let worker_count = worker_count.max(1);
        let (job_sender, job_receiver) = bounded::<ParseJob>(queue_capacity.max(1));
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let job_rx = job_receiver.clone();
            let shutdown_flag = Arc::clone(&shutdown);
            let worker_pipeline = Arc::clone(&pipeline);

            let handle = thread::Builder::new()
                .name(format!("ifcpipe-parse-{}", worker_id))
                .spawn(move || run_worker(worker_id, job_rx, shutdown_flag, worker_pipeline))
                .map_err(|e| WorkerError::SpawnFailed(e.to_string()))?;

            workers.push(handle);
        }

        info!("Started {} parse workers", worker_count);

        Ok(Self {
            job_sender,
            job_receiver,
            pipeline,
            workers,
            shutdown,
        })
    }

    /// Enqueues a job, waiting for room when the queue is full.
    pub fn submit(&self, job: ParseJob) -> Result<(), WorkerError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(WorkerError::ChannelClosed);
        }

        self.job_sender
            .send(job)
            .map_err(|_| WorkerError::ChannelClosed)
    }

    /// Enqueues a job only if the queue has room.
    pub fn try_submit(&self, job: ParseJob) -> Result<(), WorkerError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(WorkerError::ChannelClosed);
        }

        self.job_sender.try_send(job).map_err(|e| match e {
            TrySendError::Full(_) => WorkerError::QueueFull,
            TrySendError::Disconnected(_) => WorkerError::ChannelClosed,
        })
    }

    pub fn queued(&self) -> usize {
        self.job_sender.len()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stops accepting jobs; workers exit after their current job and
    /// [`ParseWorkerPool::wait`] fails anything still queued.
    pub fn shutdown(&self) {
        info!("Shutting down parse workers...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Closes the queue and joins the workers. Queued jobs are still
    /// processed unless [`ParseWorkerPool::shutdown`] was called first, in
    /// which case their tasks are failed.
    pub fn wait(self) {
        drop(self.job_sender);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }

        let mut cancelled = 0;
        for job in self.job_receiver.try_iter() {
            self.pipeline.cancel(&job);
            cancelled += 1;
        }
        if cancelled > 0 {
            info!("Cancelled {} queued parse jobs", cancelled);
        }

        info!("All parse workers have stopped");
    }
}

fn run_worker(
    worker_id: usize,
    job_receiver: Receiver<ParseJob>,
    shutdown: Arc<AtomicBool>,
    pipeline: Arc<ParsePipeline>,
) {
    debug!("Worker {} started", worker_id);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Worker {} received shutdown signal", worker_id);
            break;
        }

        match job_receiver.recv_timeout(std::time::Duration::from_millis(100)) {
            Ok(job) => {
                debug!("Worker {} processing {}", worker_id, job.file_id);

                let result = match panic::catch_unwind(AssertUnwindSafe(|| pipeline.run(&job))) {
                    Ok(result) => result,
                    Err(_) => {
                        error!("Worker {} panicked while parsing {}", worker_id, job.file_id);
                        pipeline.fail_after_panic(&job)
                    }
                };

                if result.success {
                    debug!(
                        "Worker {} finished {} ({} rows)",
                        worker_id, result.file_id, result.rows
                    );
                } else {
                    debug!(
                        "Worker {} failed {}: {}",
                        worker_id,
                        result.file_id,
                        result.error.as_deref().unwrap_or("unknown error")
                    );
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                continue;
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                debug!("Worker {} job channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Worker {} stopped", worker_id);
}
