use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, error, info};
use tokio::sync::broadcast;

use crate::error::WorkerError;
use crate::pipeline::{
    BroadcastProgress, IngestEvent, IngestPhase, NoopProgress, Pipeline, ProgressEvent,
    ProgressReporter,
};
use crate::store::ensure_user_store;
use crate::worker::job::{IngestOutcome, IngestPayload, IngestRequest};

/// A pool of ingestion workers.
///
/// Requests go in over a bounded channel, outcomes come back over
/// another; hashing, I/O and catalog access all happen on pool threads so
/// a presentation layer is never blocked. Workers resolve each request's
/// user store on demand; `ensure_user_store` is idempotent and cheap
/// once provisioned.
pub struct WorkerPool {
    request_sender: Sender<IngestRequest>,
    outcome_receiver: Receiver<IngestOutcome>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    /// Kept to hold the channel open for late subscribers; workers use
    /// cloned Arcs.
    #[allow(dead_code)]
    progress_sender: Option<Arc<broadcast::Sender<IngestEvent>>>,
}

impl WorkerPool {
    pub fn new(base_dir: PathBuf, worker_count: usize) -> Self {
        Self::with_progress_sender(base_dir, worker_count, None)
    }

    /// Pool sized to the machine.
    pub fn with_default_size(base_dir: PathBuf) -> Self {
        Self::new(base_dir, num_cpus::get().max(1))
    }

    /// Creates a pool with an optional progress broadcaster.
    ///
    /// # Panics
    /// Panics if `worker_count` is 0.
    pub fn with_progress_sender(
        base_dir: PathBuf,
        worker_count: usize,
        progress_sender: Option<Arc<broadcast::Sender<IngestEvent>>>,
    ) -> Self {
        assert!(worker_count > 0, "worker_count must be > 0");
        let (request_sender, request_receiver) = bounded::<IngestRequest>(worker_count * 2);
        let (outcome_sender, outcome_receiver) = bounded::<IngestOutcome>(worker_count * 2);
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let request_rx = request_receiver.clone();
            let outcome_tx = outcome_sender.clone();
            let shutdown_flag = Arc::clone(&shutdown);
            let base = base_dir.clone();
            let progress = progress_sender.clone();

            let handle = thread::spawn(move || {
                run_worker(worker_id, request_rx, outcome_tx, shutdown_flag, base, progress);
            });

            workers.push(handle);
        }

        info!("Started {} ingestion workers", worker_count);

        Self {
            request_sender,
            outcome_receiver,
            workers,
            shutdown,
            progress_sender,
        }
    }

    pub fn submit(&self, request: IngestRequest) -> Result<(), WorkerError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(WorkerError::ChannelClosed);
        }

        self.request_sender
            .send(request)
            .map_err(|_| WorkerError::ChannelClosed)
    }

    pub fn try_recv_outcome(&self) -> Option<IngestOutcome> {
        self.outcome_receiver.try_recv().ok()
    }

    pub fn recv_outcome(&self) -> Option<IngestOutcome> {
        self.outcome_receiver.recv().ok()
    }

    pub fn shutdown(&self) {
        info!("Shutting down ingestion workers...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn wait(self) {
        // Drop sender to signal workers to exit
        drop(self.request_sender);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }

        info!("All ingestion workers have stopped");
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

fn run_worker(
    worker_id: usize,
    request_receiver: Receiver<IngestRequest>,
    outcome_sender: Sender<IngestOutcome>,
    shutdown: Arc<AtomicBool>,
    base_dir: PathBuf,
    progress_sender: Option<Arc<broadcast::Sender<IngestEvent>>>,
) {
    debug!("Worker {} started", worker_id);

    let pipeline = Pipeline::new();

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Worker {} received shutdown signal", worker_id);
            break;
        }

        match request_receiver.recv_timeout(std::time::Duration::from_millis(100)) {
            Ok(request) => {
                debug!(
                    "Worker {} ingesting {} for '{}'",
                    worker_id,
                    request.display_name(),
                    request.username
                );

                let outcome = if let Some(ref sender) = progress_sender {
                    let progress = BroadcastProgress::new(
                        &request.id,
                        &request.display_name(),
                        Arc::clone(sender),
                    );

                    progress.report(ProgressEvent::Phase {
                        phase: IngestPhase::Queued,
                        message: "Queued for ingestion".to_string(),
                    });

                    process_request(&pipeline, &base_dir, request, &progress)
                } else {
                    process_request(&pipeline, &base_dir, request, &NoopProgress)
                };

                if outcome_sender.send(outcome).is_err() {
                    error!("Worker {} failed to send outcome; receiver gone", worker_id);
                    break;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                continue;
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                debug!("Worker {} request channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Worker {} stopped", worker_id);
}

fn process_request(
    pipeline: &Pipeline,
    base_dir: &std::path::Path,
    request: IngestRequest,
    progress: &dyn ProgressReporter,
) -> IngestOutcome {
    let result = ensure_user_store(base_dir, &request.username).and_then(|store| {
        let entry = match &request.payload {
            IngestPayload::File(path) => pipeline.ingest_file(&store, path, progress)?,
            IngestPayload::JsonText(raw) => pipeline.ingest_json_text(&store, raw, progress)?,
        };
        Ok(entry)
    });

    IngestOutcome {
        request_id: request.id,
        username: request.username,
        result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Category;
    use tempfile::TempDir;

    #[test]
    fn test_pool_creation_and_shutdown() {
        let base = TempDir::new().unwrap();
        let pool = WorkerPool::new(base.path().to_path_buf(), 2);

        assert!(!pool.is_shutdown());
        pool.shutdown();
        assert!(pool.is_shutdown());
        pool.wait();
    }

    #[test]
    fn test_submit_and_process_file() {
        let base = TempDir::new().unwrap();
        let pool = WorkerPool::new(base.path().to_path_buf(), 2);

        let src = base.path().join("hello.txt");
        std::fs::write(&src, b"Hello, World!").unwrap();

        let request = IngestRequest::file("alice", src);
        let request_id = request.id.clone();
        pool.submit(request).unwrap();

        let outcome = pool.recv_outcome().unwrap();
        assert_eq!(outcome.request_id, request_id);
        assert_eq!(outcome.username, "alice");
        let entry = outcome.result.unwrap();
        assert_eq!(entry.category, Category::Text);

        pool.shutdown();
        pool.wait();
    }

    #[test]
    fn test_submit_json_text_and_failure_reporting() {
        let base = TempDir::new().unwrap();
        let pool = WorkerPool::new(base.path().to_path_buf(), 1);

        pool.submit(IngestRequest::json_text("bob", r#"{"ok":true}"#))
            .unwrap();
        pool.submit(IngestRequest::json_text("bob", "{broken"))
            .unwrap();

        let first = pool.recv_outcome().unwrap();
        assert!(first.result.is_ok());
        let second = pool.recv_outcome().unwrap();
        assert!(second.result.is_err());

        pool.shutdown();
        pool.wait();
    }

    #[test]
    fn test_submit_after_shutdown_is_rejected() {
        let base = TempDir::new().unwrap();
        let pool = WorkerPool::new(base.path().to_path_buf(), 1);
        pool.shutdown();

        let err = pool
            .submit(IngestRequest::json_text("alice", "{}"))
            .unwrap_err();
        assert!(matches!(err, WorkerError::ChannelClosed));
        pool.wait();
    }

    #[test]
    fn test_progress_events_reach_subscribers() {
        let base = TempDir::new().unwrap();
        let (tx, mut rx) = broadcast::channel(64);
        let pool =
            WorkerPool::with_progress_sender(base.path().to_path_buf(), 1, Some(Arc::new(tx)));

        pool.submit(IngestRequest::json_text("alice", r#"{"a":1}"#))
            .unwrap();
        let outcome = pool.recv_outcome().unwrap();
        assert!(outcome.result.is_ok());

        let mut statuses = Vec::new();
        while let Ok(event) = rx.try_recv() {
            statuses.push(event.status);
        }
        assert!(statuses.contains(&"completed".to_string()));

        pool.shutdown();
        pool.wait();
    }
}
