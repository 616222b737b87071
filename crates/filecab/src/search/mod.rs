//! Search: query parsing, DB-first lookup, filesystem fallback, result
//! shaping.
//!
//! Queries hit the catalog first. Only when the catalog comes back empty
//! AND the staleness predicate holds (the folders hold more files than the
//! catalog has rows) does the engine walk the store directly, synthesizing
//! minimal results from disk. The two provenances are tagged so the shell
//! can offer to re-index filesystem-derived hits.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use walkdir::WalkDir;

use crate::catalog::{repo, Entry};
use crate::classify::Category;
use crate::store::UserStore;

pub mod error;

pub use error::SearchError;

/// Ceiling on any single rendered preview.
pub const PREVIEW_MAX_BYTES: usize = 100 * 1024;

/// Appended when a preview was cut at the ceiling.
pub const TRUNCATION_MARKER: &str = "\n[truncated]";

/// Extensions whose content is substring-matched during search.
const MATCH_EXTENSIONS: [&str; 6] = ["txt", "json", "md", "csv", "log", "py"];

/// Extensions considered safe to render as a text preview.
const PREVIEW_EXTENSIONS: [&str; 8] = ["txt", "json", "md", "csv", "log", "py", "xml", "html"];

/// Where a search result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultOrigin {
    /// Backed by a catalog row.
    Catalog,
    /// Synthesized from a directory scan; not indexed.
    Filesystem,
}

/// One search hit, shaped for display.
#[derive(Debug, Clone, Serialize)]
pub struct ResultView {
    /// Catalog id, when catalog-derived.
    pub entry_id: Option<i64>,
    pub path: PathBuf,
    pub category: Category,
    /// Stored filename with the leading ingestion stamp removed.
    pub display_name: String,
    pub preview: String,
    pub origin: ResultOrigin,
    /// Set when the catalog row's stored file no longer exists on disk.
    /// The result is still reported rather than silently dropped.
    pub missing_on_disk: bool,
}

/// A parsed query: optional category filter plus free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub category: Option<Category>,
    pub term: String,
}

/// Parses `[type:<category>] [free text]`. The filter token is
/// case-insensitive and must name one of the seven categories.
pub fn parse_query(raw: &str) -> Result<Query, SearchError> {
    let trimmed = raw.trim();

    let (category, rest) = match trimmed.split_whitespace().next() {
        Some(first)
            if first
                .get(..5)
                .is_some_and(|p| p.eq_ignore_ascii_case("type:")) =>
        {
            let token = &first[5..];
            let category =
                Category::from_str(token).map_err(|_| SearchError::InvalidFilter {
                    token: token.to_string(),
                })?;
            (Some(category), trimmed[first.len()..].trim_start())
        }
        _ => (None, trimmed),
    };

    Ok(Query {
        category,
        term: rest.to_string(),
    })
}

/// Runs a query against one user's store. DB-first; falls back to a
/// directory scan when the catalog is empty for this query and stale.
pub fn search(store: &UserStore, raw_query: &str) -> Result<Vec<ResultView>, SearchError> {
    let query = parse_query(raw_query)?;

    let rows = if query.term.is_empty() {
        match query.category {
            Some(cat) => repo::query_by_category(store.db(), cat)?,
            None => repo::query_all(store.db())?,
        }
    } else {
        repo::search_text(store.db(), &query.term, query.category)?
    };

    if !rows.is_empty() {
        return Ok(rows.iter().map(view_from_entry).collect());
    }

    if catalog_is_stale(store, query.category)? {
        log::info!(
            "Catalog empty for query '{}' but folders are ahead; scanning disk",
            raw_query
        );
        return Ok(scan_filesystem(store, &query));
    }

    Ok(Vec::new())
}

/// The named staleness predicate: true when the relevant category
/// folder(s) hold more files than the catalog has rows for them.
pub fn catalog_is_stale(
    store: &UserStore,
    category: Option<Category>,
) -> Result<bool, SearchError> {
    let categories: Vec<Category> = match category {
        Some(cat) => vec![cat],
        None => Category::ALL.to_vec(),
    };

    let mut files_on_disk: u64 = 0;
    for cat in &categories {
        files_on_disk += WalkDir::new(store.category_dir(*cat))
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .count() as u64;
    }

    let rows = repo::count(store.db(), category)?;
    Ok(files_on_disk > rows)
}

/// Recursive scan of the relevant category folders, matching filenames
/// and (for text-like files) bounded content reads. Results carry no
/// catalog metadata.
fn scan_filesystem(store: &UserStore, query: &Query) -> Vec<ResultView> {
    let categories: Vec<Category> = match query.category {
        Some(cat) => vec![cat],
        None => Category::ALL.to_vec(),
    };
    let needle = query.term.to_lowercase();

    let mut results = Vec::new();
    for cat in categories {
        for entry in WalkDir::new(store.category_dir(cat))
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let filename = entry.file_name().to_string_lossy();

            let name_matches = needle.is_empty() || filename.to_lowercase().contains(&needle);
            let content_matches = !needle.is_empty()
                && has_extension(path, &MATCH_EXTENSIONS)
                && repo::read_text_prefix(path, repo::CONTENT_SCAN_BYTES)
                    .map(|text| text.to_lowercase().contains(&needle))
                    .unwrap_or(false);

            if name_matches || content_matches {
                results.push(ResultView {
                    entry_id: None,
                    path: path.to_path_buf(),
                    category: cat,
                    display_name: strip_leading_stamp(&filename),
                    preview: preview_from_disk(path),
                    origin: ResultOrigin::Filesystem,
                    missing_on_disk: false,
                });
            }
        }
    }
    results
}

fn view_from_entry(entry: &Entry) -> ResultView {
    let path = PathBuf::from(&entry.stored_path);
    let missing = !path.exists();
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| entry.stored_path.clone());

    let preview = if missing {
        String::new()
    } else if entry.category == Category::Json && !entry.json_preview.is_empty() {
        entry.json_preview.clone()
    } else {
        preview_from_disk(&path)
    };

    ResultView {
        entry_id: Some(entry.id),
        path,
        category: entry.category,
        display_name: strip_leading_stamp(&filename),
        preview,
        origin: ResultOrigin::Catalog,
        missing_on_disk: missing,
    }
}

/// Bounded text preview for text-like files; binary files get none.
fn preview_from_disk(path: &Path) -> String {
    if !has_extension(path, &PREVIEW_EXTENSIONS) {
        return String::new();
    }

    let len = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    match repo::read_text_prefix(path, PREVIEW_MAX_BYTES) {
        Some(mut text) => {
            if len > PREVIEW_MAX_BYTES as u64 {
                text.push_str(TRUNCATION_MARKER);
            }
            text
        }
        None => String::new(),
    }
}

fn has_extension(path: &Path, set: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| set.iter().any(|s| e.eq_ignore_ascii_case(s)))
        .unwrap_or(false)
}

/// Removes the `<stamp>_` prefix stored names carry.
pub fn strip_leading_stamp(name: &str) -> String {
    static STAMP: OnceLock<Regex> = OnceLock::new();
    let re = STAMP.get_or_init(|| Regex::new(r"^\d+_").expect("static pattern"));
    re.replace(name, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{NoopProgress, Pipeline};
    use crate::store::{ensure_user_store, PlacementSource};
    use tempfile::TempDir;

    fn populated_store(base: &TempDir) -> UserStore {
        let store = ensure_user_store(base.path(), "alice").unwrap();
        let pipeline = Pipeline::new();

        let pdf = base.path().join("report.pdf");
        std::fs::write(&pdf, b"%PDF-1.4").unwrap();
        pipeline.ingest_file(&store, &pdf, &NoopProgress).unwrap();

        pipeline
            .ingest_json_text(&store, r#"{"a":1,"b":"hello"}"#, &NoopProgress)
            .unwrap();

        let notes = base.path().join("notes.txt");
        std::fs::write(&notes, "remember the milk").unwrap();
        pipeline.ingest_file(&store, &notes, &NoopProgress).unwrap();

        store
    }

    #[test]
    fn test_parse_plain_query() {
        let q = parse_query("hello world").unwrap();
        assert_eq!(q.category, None);
        assert_eq!(q.term, "hello world");
    }

    #[test]
    fn test_parse_type_filter_only() {
        let q = parse_query("type:json").unwrap();
        assert_eq!(q.category, Some(Category::Json));
        assert_eq!(q.term, "");
    }

    #[test]
    fn test_parse_type_filter_with_term() {
        let q = parse_query("TYPE:PDF quarterly report").unwrap();
        assert_eq!(q.category, Some(Category::Pdf));
        assert_eq!(q.term, "quarterly report");
    }

    #[test]
    fn test_parse_rejects_unknown_category() {
        let err = parse_query("type:document foo").unwrap_err();
        match err {
            SearchError::InvalidFilter { token } => assert_eq!(token, "document"),
            other => panic!("expected InvalidFilter, got {other}"),
        }
    }

    #[test]
    fn test_parse_type_mid_query_is_plain_text() {
        let q = parse_query("find type:json things").unwrap();
        assert_eq!(q.category, None);
        assert_eq!(q.term, "find type:json things");
    }

    #[test]
    fn test_search_by_content_term() {
        let base = TempDir::new().unwrap();
        let store = populated_store(&base);

        let hits = search(&store, "hello").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].category, Category::Json);
        assert_eq!(hits[0].origin, ResultOrigin::Catalog);
        assert!(hits[0].entry_id.is_some());
    }

    #[test]
    fn test_search_type_filter_lists_category() {
        let base = TempDir::new().unwrap();
        let store = populated_store(&base);

        let hits = search(&store, "type:pdf").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].category, Category::Pdf);
        assert_eq!(hits[0].display_name, "report.pdf");
    }

    #[test]
    fn test_search_text_content_from_disk() {
        let base = TempDir::new().unwrap();
        let store = populated_store(&base);

        // "milk" lives only inside the stored text file.
        let hits = search(&store, "milk").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].category, Category::Text);
    }

    #[test]
    fn test_search_no_results() {
        let base = TempDir::new().unwrap();
        let store = populated_store(&base);
        assert!(search(&store, "zzz-no-such-thing").unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_is_flagged_not_dropped() {
        let base = TempDir::new().unwrap();
        let store = populated_store(&base);

        let hits = search(&store, "type:pdf").unwrap();
        std::fs::remove_file(&hits[0].path).unwrap();

        let hits = search(&store, "type:pdf").unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].missing_on_disk);
        assert!(hits[0].preview.is_empty());
    }

    #[test]
    fn test_staleness_predicate() {
        let base = TempDir::new().unwrap();
        let store = ensure_user_store(base.path(), "alice").unwrap();

        assert!(!catalog_is_stale(&store, None).unwrap());

        // A file dropped into a folder without a catalog row.
        store
            .place_file(
                Category::Text,
                "123_orphan.txt",
                PlacementSource::Bytes(b"orphaned content"),
            )
            .unwrap();

        assert!(catalog_is_stale(&store, None).unwrap());
        assert!(catalog_is_stale(&store, Some(Category::Text)).unwrap());
        assert!(!catalog_is_stale(&store, Some(Category::Pdf)).unwrap());
    }

    #[test]
    fn test_fallback_scan_finds_unindexed_files() {
        let base = TempDir::new().unwrap();
        let store = ensure_user_store(base.path(), "alice").unwrap();

        store
            .place_file(
                Category::Text,
                "123_orphan.txt",
                PlacementSource::Bytes(b"orphaned content"),
            )
            .unwrap();

        let hits = search(&store, "orphan").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].origin, ResultOrigin::Filesystem);
        assert_eq!(hits[0].entry_id, None);
        assert_eq!(hits[0].display_name, "orphan.txt");
    }

    #[test]
    fn test_fallback_matches_file_content() {
        let base = TempDir::new().unwrap();
        let store = ensure_user_store(base.path(), "alice").unwrap();

        store
            .place_file(
                Category::Text,
                "55_log.txt",
                PlacementSource::Bytes(b"unique-needle-inside"),
            )
            .unwrap();

        let hits = search(&store, "unique-needle").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].origin, ResultOrigin::Filesystem);
    }

    #[test]
    fn test_no_fallback_when_catalog_consistent() {
        let base = TempDir::new().unwrap();
        let store = populated_store(&base);

        // Catalog and disk agree; an unmatched term stays empty instead
        // of triggering a scan.
        assert!(search(&store, "nomatch").unwrap().is_empty());
    }

    #[test]
    fn test_preview_truncation_marker() {
        let base = TempDir::new().unwrap();
        let store = ensure_user_store(base.path(), "alice").unwrap();

        let big = "a".repeat(PREVIEW_MAX_BYTES * 2);
        store
            .place_file(
                Category::Text,
                "77_big.txt",
                PlacementSource::Bytes(big.as_bytes()),
            )
            .unwrap();

        let hits = search(&store, "type:text").unwrap();
        // Catalog is stale (no rows), so the scan surfaces the file.
        assert_eq!(hits.len(), 1);
        assert!(hits[0].preview.ends_with(TRUNCATION_MARKER));
        assert!(hits[0].preview.len() <= PREVIEW_MAX_BYTES + TRUNCATION_MARKER.len());
    }

    #[test]
    fn test_strip_leading_stamp() {
        assert_eq!(strip_leading_stamp("1700000000123456_a.txt"), "a.txt");
        assert_eq!(strip_leading_stamp("no_stamp.txt"), "no_stamp.txt");
        assert_eq!(strip_leading_stamp("42_"), "");
    }

    #[test]
    fn test_json_preview_comes_from_catalog() {
        let base = TempDir::new().unwrap();
        let store = populated_store(&base);

        let hits = search(&store, "type:json").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].preview, r#"{"a":1,"b":"hello"}"#);
    }
}
