//! Catalog schema bootstrap and verification.
//!
//! The schema is created lazily on first open and never migrated. An
//! existing catalog whose `files` table lacks expected columns fails fast
//! with `SchemaMismatch` instead of being silently upgraded.

use rusqlite::Connection;

use super::error::CatalogError;

/// The column set that forms the catalog contract.
pub const EXPECTED_COLUMNS: [&str; 10] = [
    "id",
    "original_path",
    "stored_path",
    "mime",
    "category",
    "sha256",
    "added_at",
    "json_keys",
    "json_preview",
    "json_search_text",
];

const CREATE_FILES_TABLE: &str = "\
CREATE TABLE IF NOT EXISTS files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    original_path TEXT NOT NULL,
    stored_path TEXT NOT NULL,
    mime TEXT NOT NULL,
    category TEXT NOT NULL,
    sha256 TEXT NOT NULL,
    added_at TEXT NOT NULL,
    json_keys TEXT NOT NULL DEFAULT '',
    json_preview TEXT NOT NULL DEFAULT '',
    json_search_text TEXT NOT NULL DEFAULT ''
);";

/// Creates the `files` table if absent, then verifies the column set.
pub fn init(conn: &Connection) -> Result<(), CatalogError> {
    conn.execute_batch(CREATE_FILES_TABLE)?;
    verify(conn)
}

/// Checks that every contract column exists on `files`.
pub fn verify(conn: &Connection) -> Result<(), CatalogError> {
    let mut stmt = conn.prepare("PRAGMA table_info(files)")?;
    let present: Vec<String> = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<_, _>>()?;

    let missing: Vec<String> = EXPECTED_COLUMNS
        .iter()
        .filter(|c| !present.iter().any(|p| p == *c))
        .map(|c| c.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CatalogError::SchemaMismatch { missing })
    }
}
