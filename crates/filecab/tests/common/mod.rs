//! Shared harness for integration tests.
//!
//! Provides an isolated base directory holding any number of user stores,
//! plus helpers for creating source files and running ingestions.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use filecab::pipeline::NoopProgress;
use filecab::{ensure_user_store, Entry, Pipeline, UserStore};

/// Isolated environment: one temp base dir, one pipeline.
pub struct Harness {
    base: TempDir,
    pipeline: Pipeline,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            base: TempDir::new().expect("failed to create temp base dir"),
            pipeline: Pipeline::new(),
        }
    }

    pub fn base(&self) -> &Path {
        self.base.path()
    }

    /// Provisions (or reopens) a user's store.
    pub fn store(&self, username: &str) -> UserStore {
        ensure_user_store(self.base(), username).expect("store provisioning failed")
    }

    /// Drops a source file outside any store, returning its path.
    pub fn source_file(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.base().join(name);
        std::fs::write(&path, content).expect("failed to write source file");
        path
    }

    pub fn ingest_file(&self, store: &UserStore, path: &Path) -> Entry {
        self.pipeline
            .ingest_file(store, path, &NoopProgress)
            .expect("ingestion failed")
    }

    pub fn ingest_json(&self, store: &UserStore, raw: &str) -> Entry {
        self.pipeline
            .ingest_json_text(store, raw, &NoopProgress)
            .expect("JSON ingestion failed")
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}
