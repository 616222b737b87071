//! Entry repository: insert and query operations on the `files` table.
//!
//! All queries order by `added_at DESC, id ASC`: most recent first, ties
//! broken by insertion order.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use rusqlite::params;

use crate::classify::Category;

use super::entry::{encode_keys, Entry, NewEntry};
use super::{CatalogError, Database};

/// Upper bound on bytes read from a stored text file when matching a
/// search term against its content.
pub const CONTENT_SCAN_BYTES: usize = 100 * 1024;

const ORDERING: &str = "ORDER BY added_at DESC, id ASC";

fn now_utc() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Inserts a new entry, assigning its id and timestamp. All-or-nothing:
/// a failed insert leaves no partial row behind.
pub fn insert(db: &Database, new: NewEntry) -> Result<Entry, CatalogError> {
    let added_at = now_utc();
    let id = db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO files (original_path, stored_path, mime, category, sha256,
             added_at, json_keys, json_preview, json_search_text)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                new.original_path,
                new.stored_path,
                new.mime,
                new.category.as_str(),
                new.sha256,
                added_at,
                encode_keys(&new.json_keys),
                new.json_preview,
                new.json_search_text,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })?;

    Ok(Entry {
        id,
        original_path: new.original_path,
        stored_path: new.stored_path,
        mime: new.mime,
        category: new.category,
        sha256: new.sha256,
        added_at,
        json_keys: new.json_keys,
        json_preview: new.json_preview,
        json_search_text: new.json_search_text,
    })
}

/// Returns the most recent entries, up to `limit`.
pub fn query_recent(db: &Database, limit: u64) -> Result<Vec<Entry>, CatalogError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare(&format!("SELECT * FROM files {ORDERING} LIMIT ?1"))?;
        let rows = stmt.query_map(params![limit], Entry::from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    })
}

/// Returns every entry in the catalog.
pub fn query_all(db: &Database) -> Result<Vec<Entry>, CatalogError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&format!("SELECT * FROM files {ORDERING}"))?;
        let rows = stmt.query_map([], Entry::from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    })
}

/// Returns every JSON-category entry.
pub fn query_json_only(db: &Database) -> Result<Vec<Entry>, CatalogError> {
    query_by_category(db, Category::Json)
}

/// Returns every entry in one category.
pub fn query_by_category(db: &Database, category: Category) -> Result<Vec<Entry>, CatalogError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM files WHERE category = ?1 {ORDERING}"
        ))?;
        let rows = stmt.query_map(params![category.as_str()], Entry::from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    })
}

/// Number of rows, optionally restricted to one category. Used by the
/// search engine's staleness predicate.
pub fn count(db: &Database, category: Option<Category>) -> Result<u64, CatalogError> {
    db.with_conn(|conn| {
        let n: u64 = match category {
            Some(cat) => conn.query_row(
                "SELECT COUNT(*) FROM files WHERE category = ?1",
                params![cat.as_str()],
                |r| r.get(0),
            )?,
            None => conn.query_row("SELECT COUNT(*) FROM files", [], |r| r.get(0))?,
        };
        Ok(n)
    })
}

/// Case-insensitive substring search over stored filename, original path
/// and flattened JSON text, plus (for text-category entries) a bounded
/// read of the stored content. `category_filter` restricts the result set.
pub fn search_text(
    db: &Database,
    term: &str,
    category_filter: Option<Category>,
) -> Result<Vec<Entry>, CatalogError> {
    let pattern = like_pattern(term);

    let mut matched = db.with_conn(|conn| {
        let rows = match category_filter {
            Some(cat) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT * FROM files
                     WHERE (stored_path LIKE ?1 ESCAPE '\\'
                        OR original_path LIKE ?1 ESCAPE '\\'
                        OR json_search_text LIKE ?1 ESCAPE '\\')
                       AND category = ?2 {ORDERING}"
                ))?;
                let rows = stmt.query_map(params![pattern, cat.as_str()], Entry::from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT * FROM files
                     WHERE stored_path LIKE ?1 ESCAPE '\\'
                        OR original_path LIKE ?1 ESCAPE '\\'
                        OR json_search_text LIKE ?1 ESCAPE '\\' {ORDERING}"
                ))?;
                let rows = stmt.query_map(params![pattern], Entry::from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(rows)
    })?;

    // Derived content matching for text entries the SQL pass missed.
    let scan_text_content = matches!(category_filter, None | Some(Category::Text));
    if scan_text_content && !term.is_empty() {
        let seen: HashSet<i64> = matched.iter().map(|e| e.id).collect();
        let needle = term.to_lowercase();
        for entry in query_by_category(db, Category::Text)? {
            if seen.contains(&entry.id) {
                continue;
            }
            if text_content_matches(Path::new(&entry.stored_path), &needle) {
                matched.push(entry);
            }
        }
        matched.sort_by(|a, b| b.added_at.cmp(&a.added_at).then(a.id.cmp(&b.id)));
    }

    Ok(matched)
}

/// Escapes LIKE metacharacters and wraps the term in wildcards.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Reads up to `CONTENT_SCAN_BYTES` of a file as lossy UTF-8.
pub(crate) fn read_text_prefix(path: &Path, max_bytes: usize) -> Option<String> {
    let mut file = std::fs::File::open(path).ok()?;
    let mut buf = Vec::with_capacity(max_bytes.min(64 * 1024));
    let n = file
        .by_ref()
        .take(max_bytes as u64)
        .read_to_end(&mut buf)
        .ok()?;
    buf.truncate(n);
    Some(String::from_utf8_lossy(&buf).into_owned())
}

fn text_content_matches(path: &Path, needle_lower: &str) -> bool {
    match read_text_prefix(path, CONTENT_SCAN_BYTES) {
        Some(text) => text.to_lowercase().contains(needle_lower),
        None => false,
    }
}
