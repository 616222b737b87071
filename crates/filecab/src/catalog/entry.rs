//! Catalog row types.

use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::classify::Category;

/// One catalog row describing one ingested item.
///
/// `json_keys`, `json_preview` and `json_search_text` are populated only
/// for `Category::Json` entries; for every other category they are the
/// empty sequence / empty string, never null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Catalog-assigned identifier, unique within one user's catalog.
    pub id: i64,
    /// Source path, or the synthetic marker for pasted JSON.
    pub original_path: String,
    /// Absolute path under the user's category folder.
    pub stored_path: String,
    /// Detected media type.
    pub mime: String,
    pub category: Category,
    /// 64-char lowercase hex digest of the content at ingestion time.
    pub sha256: String,
    /// RFC3339 UTC timestamp, microsecond precision.
    pub added_at: String,
    pub json_keys: Vec<String>,
    pub json_preview: String,
    pub json_search_text: String,
}

/// An entry before the catalog has assigned an id and timestamp.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub original_path: String,
    pub stored_path: String,
    pub mime: String,
    pub category: Category,
    pub sha256: String,
    pub json_keys: Vec<String>,
    pub json_preview: String,
    pub json_search_text: String,
}

impl Entry {
    pub(super) fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let category: String = row.get("category")?;
        let json_keys: String = row.get("json_keys")?;
        Ok(Self {
            id: row.get("id")?,
            original_path: row.get("original_path")?,
            stored_path: row.get("stored_path")?,
            mime: row.get("mime")?,
            // Rows only ever hold what this crate wrote; an unrecognized
            // token still maps somewhere total.
            category: category.parse().unwrap_or(Category::Other),
            sha256: row.get("sha256")?,
            added_at: row.get("added_at")?,
            json_keys: decode_keys(&json_keys),
            json_preview: row.get("json_preview")?,
            json_search_text: row.get("json_search_text")?,
        })
    }
}

/// Encodes the key list as a JSON array string for the TEXT column.
pub(super) fn encode_keys(keys: &[String]) -> String {
    if keys.is_empty() {
        return String::new();
    }
    serde_json::to_string(keys).unwrap_or_default()
}

/// Decodes the key column; an empty column is the empty sequence.
pub(super) fn decode_keys(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    serde_json::from_str(raw).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_empty_keys_is_empty_string() {
        assert_eq!(encode_keys(&[]), "");
    }

    #[test]
    fn test_keys_round_trip() {
        let keys = vec!["a".to_string(), "b,with,commas".to_string()];
        assert_eq!(decode_keys(&encode_keys(&keys)), keys);
    }

    #[test]
    fn test_decode_empty_is_empty_vec() {
        assert!(decode_keys("").is_empty());
    }
}
