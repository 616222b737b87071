pub mod catalog;
pub mod classify;
pub mod error;
pub mod fingerprint;
pub mod json;
pub mod pipeline;
pub mod sanitize;
pub mod search;
pub mod store;
pub mod worker;

pub use catalog::{Database, Entry, NewEntry};
pub use classify::{classify, detect_mime, Category};
pub use error::{FilecabError, Result, StorageError, WorkerError};
pub use pipeline::{NoopProgress, Pipeline, PipelineError, ProgressReporter};
pub use search::{search, ResultOrigin, ResultView, SearchError};
pub use store::{default_base_dir, ensure_user_store, PlacementSource, UserStore};
pub use worker::{IngestOutcome, IngestPayload, IngestRequest, WorkerPool};
