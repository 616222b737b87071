//! The per-user metadata catalog.
//!
//! One SQLite file per user, wrapped in a thread-safe `Database` handle.
//! All access is serialized through a `Mutex`, which is fine for SQLite
//! (which serializes writes anyway). WAL mode is enabled for concurrent
//! read performance. The schema is bootstrapped on open and verified
//! against the contract column set; mismatches are fatal for the store.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

pub mod entry;
pub mod error;
pub mod repo;
pub mod schema;

pub use entry::{Entry, NewEntry};
pub use error::CatalogError;

/// Thread-safe catalog handle wrapping a single rusqlite connection.
///
/// Cloning is cheap (inner `Arc`).
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens (or creates) the catalog at the given path, bootstraps the
    /// schema and verifies the column set.
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CatalogError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

        schema::init(&conn)?;

        log::info!("Catalog opened at {}", path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory catalog for testing.
    pub fn open_in_memory() -> Result<Self, CatalogError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        schema::init(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Provides locked access to the underlying connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, CatalogError>
    where
        F: FnOnce(&Connection) -> Result<T, CatalogError>,
    {
        let conn = self.conn.lock().map_err(|_| CatalogError::LockPoisoned)?;
        f(&conn)
    }
}
