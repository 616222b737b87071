use std::path::PathBuf;

use crate::catalog::Entry;
use crate::error::FilecabError;

/// What one ingestion request carries.
#[derive(Debug, Clone)]
pub enum IngestPayload {
    /// A file on disk to copy into the store.
    File(PathBuf),
    /// Raw JSON text pasted by the user.
    JsonText(String),
}

/// A unit of ingestion work, addressed to one user's store.
///
/// There is no ambient "current user": every request names its owner and
/// workers resolve the store per request.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub id: String,
    pub username: String,
    pub payload: IngestPayload,
}

impl IngestRequest {
    pub fn file(username: impl Into<String>, path: PathBuf) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.into(),
            payload: IngestPayload::File(path),
        }
    }

    pub fn json_text(username: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.into(),
            payload: IngestPayload::JsonText(raw.into()),
        }
    }

    /// Display name for progress events.
    pub(super) fn display_name(&self) -> String {
        match &self.payload {
            IngestPayload::File(path) => crate::sanitize::redact_path(path),
            IngestPayload::JsonText(_) => "pasted.json".to_string(),
        }
    }
}

/// Completion record delivered back over the pool's result channel.
#[derive(Debug)]
pub struct IngestOutcome {
    pub request_id: String,
    pub username: String,
    pub result: Result<Entry, FilecabError>,
}
