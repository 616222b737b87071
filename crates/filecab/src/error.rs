use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilecabError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] crate::catalog::CatalogError),

    #[error("Ingestion error: {0}")]
    Pipeline(#[from] crate::pipeline::PipelineError),

    #[error("Search error: {0}")]
    Search(#[from] crate::search::SearchError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),
}

#[derive(Error, Debug)]
pub enum StorageError {
    /// The store's directory tree could not be created.
    #[error("Failed to provision store directory '{path}': {source}")]
    Provision {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing or copying content into a category folder failed.
    #[error("Failed to write file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source of a file ingestion could not be read.
    #[error("Failed to read source '{path}': {source}")]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Worker channel closed unexpectedly")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, FilecabError>;
