use std::path::Path;

use tracing::info_span;

use crate::catalog::{repo, Entry, NewEntry};
use crate::classify::{classify, detect_mime, Category};
use crate::fingerprint::{sha256_bytes, sha256_file, unique_stored_name};
use crate::json::{self, JsonMetadata};
use crate::sanitize;
use crate::store::{PlacementSource, UserStore};

use super::error::PipelineError;
use super::progress::{IngestPhase, ProgressEvent, ProgressReporter};

/// `original_path` marker recorded for pasted JSON submissions.
pub const PASTED_JSON_ORIGIN: &str = "<pasted-json>";

/// Basename used to build stored names for pasted JSON.
const PASTED_JSON_BASENAME: &str = "pasted.json";

/// Orchestrates one ingestion: classify, fingerprint, JSON-gate, place,
/// record. Side effects are strictly ordered: the file write always
/// precedes the catalog write, so a catalog row pointing at a missing
/// file cannot occur under correct operation; only the reverse (orphan
/// file on a failed insert) is possible, and it is reported as such.
#[derive(Default)]
pub struct Pipeline;

impl Pipeline {
    pub fn new() -> Self {
        Self
    }

    /// Ingests a file from disk into the user's store.
    pub fn ingest_file(
        &self,
        store: &UserStore,
        source: &Path,
        progress: &dyn ProgressReporter,
    ) -> Result<Entry, PipelineError> {
        let filename = sanitize::redact_path(source);
        let _span = info_span!("ingest_file",
            user = store.username(),
            filename = %filename,
        )
        .entered();

        match self.run_file(store, source, progress) {
            Ok(entry) => {
                progress.report(ProgressEvent::Completed {
                    stored_path: entry.stored_path.clone(),
                    category: entry.category.to_string(),
                });
                Ok(entry)
            }
            Err(e) => {
                progress.report(ProgressEvent::Failed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Ingests pasted JSON text. The parse gate runs before anything is
    /// written: malformed input mutates nothing.
    pub fn ingest_json_text(
        &self,
        store: &UserStore,
        raw: &str,
        progress: &dyn ProgressReporter,
    ) -> Result<Entry, PipelineError> {
        let _span = info_span!("ingest_json_text", user = store.username()).entered();

        match self.run_json_text(store, raw, progress) {
            Ok(entry) => {
                progress.report(ProgressEvent::Completed {
                    stored_path: entry.stored_path.clone(),
                    category: entry.category.to_string(),
                });
                Ok(entry)
            }
            Err(e) => {
                progress.report(ProgressEvent::Failed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn run_file(
        &self,
        store: &UserStore,
        source: &Path,
        progress: &dyn ProgressReporter,
    ) -> Result<Entry, PipelineError> {
        progress.report(ProgressEvent::Phase {
            phase: IngestPhase::Reading,
            message: "Detecting media type...".to_string(),
        });
        let mime = {
            let _step = info_span!("detect_mime").entered();
            detect_mime(source)
        };

        progress.report(ProgressEvent::Phase {
            phase: IngestPhase::Classifying,
            message: format!("Classifying {mime}..."),
        });
        let category = classify(&mime);
        let sha256 = {
            let _step = info_span!("fingerprint").entered();
            sha256_file(source).map_err(|e| crate::error::StorageError::ReadSource {
                path: source.to_path_buf(),
                source: e,
            })?
        };

        // JSON gate: parse failures abort before any write.
        let metadata = if category == Category::Json {
            progress.report(ProgressEvent::Phase {
                phase: IngestPhase::Enriching,
                message: "Parsing JSON...".to_string(),
            });
            let _step = info_span!("json_enrich").entered();
            let raw = std::fs::read_to_string(source).map_err(|e| {
                crate::error::StorageError::ReadSource {
                    path: source.to_path_buf(),
                    source: e,
                }
            })?;
            let (_, meta) = json::parse_and_analyze(&raw)?;
            meta
        } else {
            JsonMetadata::default()
        };

        let basename = source
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file");
        let unique_name = unique_stored_name(basename);

        self.place_and_record(
            store,
            category,
            &unique_name,
            PlacementSource::Path(source),
            source.display().to_string(),
            mime,
            sha256,
            metadata,
            progress,
        )
    }

    fn run_json_text(
        &self,
        store: &UserStore,
        raw: &str,
        progress: &dyn ProgressReporter,
    ) -> Result<Entry, PipelineError> {
        let mime = "application/json".to_string();
        let category = classify(&mime);
        let sha256 = sha256_bytes(raw.as_bytes());

        progress.report(ProgressEvent::Phase {
            phase: IngestPhase::Enriching,
            message: "Parsing JSON...".to_string(),
        });
        let (_, metadata) = {
            let _step = info_span!("json_enrich").entered();
            json::parse_and_analyze(raw)?
        };

        let unique_name = unique_stored_name(PASTED_JSON_BASENAME);

        self.place_and_record(
            store,
            category,
            &unique_name,
            PlacementSource::Bytes(raw.as_bytes()),
            PASTED_JSON_ORIGIN.to_string(),
            mime,
            sha256,
            metadata,
            progress,
        )
    }

    /// Shared tail of both ingestion paths: place the bytes, then record
    /// the entry.
    #[allow(clippy::too_many_arguments)]
    fn place_and_record(
        &self,
        store: &UserStore,
        category: Category,
        unique_name: &str,
        source: PlacementSource<'_>,
        original_path: String,
        mime: String,
        sha256: String,
        metadata: JsonMetadata,
        progress: &dyn ProgressReporter,
    ) -> Result<Entry, PipelineError> {
        progress.report(ProgressEvent::Phase {
            phase: IngestPhase::Storing,
            message: format!("Placing into {category}/..."),
        });
        let stored_path = {
            let _step = info_span!("place_file").entered();
            store.place_file(category, unique_name, source)?
        };

        progress.report(ProgressEvent::Phase {
            phase: IngestPhase::Indexing,
            message: "Recording catalog entry...".to_string(),
        });
        let new = NewEntry {
            original_path,
            stored_path: stored_path.display().to_string(),
            mime,
            category,
            sha256,
            json_keys: metadata.keys,
            json_preview: metadata.preview,
            json_search_text: metadata.search_text,
        };

        let _step = info_span!("record_entry").entered();
        repo::insert(store.db(), new).map_err(|source| PipelineError::Indexing {
            stored_path,
            source,
        })
    }
}
