use std::path::PathBuf;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::error::StorageError;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// The submitted content is not valid JSON. Nothing was written and
    /// no entry was created.
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Reading the source or writing into the store failed before any
    /// catalog mutation.
    #[error("Storage failed: {0}")]
    Storage(#[from] StorageError),

    /// The file was placed but the catalog insert failed: "file saved,
    /// not indexed". The stored file is left in place for later
    /// reconciliation.
    #[error("File stored at '{stored_path}' but not indexed: {source}")]
    Indexing {
        stored_path: PathBuf,
        #[source]
        source: CatalogError,
    },
}
