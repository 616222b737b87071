use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

/// Phases an ingestion passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestPhase {
    Queued,
    Reading,
    Classifying,
    Enriching,
    Storing,
    Indexing,
}

/// Events emitted by the pipeline during one ingestion.
pub enum ProgressEvent {
    Phase { phase: IngestPhase, message: String },
    Completed { stored_path: String, category: String },
    Failed { error: String },
}

/// Serializable event pushed to broadcast subscribers (the UI shell).
#[derive(Debug, Clone, Serialize)]
pub struct IngestEvent {
    pub request_id: String,
    pub filename: String,
    pub status: String,
    pub message: String,
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for direct calls and unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Bridges pipeline events onto a broadcast channel. Send failures are
/// ignored; no subscriber just means nobody is watching.
pub struct BroadcastProgress {
    request_id: String,
    filename: String,
    sender: Arc<broadcast::Sender<IngestEvent>>,
}

impl BroadcastProgress {
    pub fn new(
        request_id: &str,
        filename: &str,
        sender: Arc<broadcast::Sender<IngestEvent>>,
    ) -> Self {
        Self {
            request_id: request_id.to_string(),
            filename: filename.to_string(),
            sender,
        }
    }

    fn emit(&self, status: &str, message: String) {
        let _ = self.sender.send(IngestEvent {
            request_id: self.request_id.clone(),
            filename: self.filename.clone(),
            status: status.to_string(),
            message,
        });
    }
}

impl ProgressReporter for BroadcastProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Phase { phase, message } => {
                self.emit(&format!("{phase:?}").to_lowercase(), message);
            }
            ProgressEvent::Completed {
                stored_path,
                category,
            } => {
                self.emit("completed", format!("[{category}] {stored_path}"));
            }
            ProgressEvent::Failed { error } => {
                self.emit("failed", error);
            }
        }
    }
}
