//! Catalog error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from catalog operations.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// SQLite error from rusqlite.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error when creating the catalog file's parent directory.
    #[error("IO error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An existing catalog file lacks expected columns. Fatal for that
    /// user's store; never auto-repaired.
    #[error("catalog schema mismatch: table 'files' is missing columns {missing:?}")]
    SchemaMismatch { missing: Vec<String> },

    /// The catalog lock was poisoned.
    #[error("catalog lock poisoned")]
    LockPoisoned,
}
