//! JSON enrichment: key extraction, bounded previews, and flattened
//! search text for catalog rows.
//!
//! Parsed documents are handled as `serde_json::Value` and walked
//! structurally; no schema is assumed.

use serde_json::Value;

/// Preview length in characters of the canonical re-serialization.
pub const PREVIEW_CHARS: usize = 500;

/// Searchable metadata derived from one parsed JSON document.
///
/// For non-object roots (arrays, scalars) `keys` is empty; `preview` and
/// `search_text` are always populated for valid JSON.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonMetadata {
    /// Top-level object keys, in document order.
    pub keys: Vec<String>,
    /// First `PREVIEW_CHARS` characters of the canonical serialization.
    pub preview: String,
    /// All scalar leaf values, depth-first, lower-cased, space-joined.
    pub search_text: String,
}

/// Derives catalog metadata from a parsed JSON value.
pub fn analyze(value: &Value) -> JsonMetadata {
    let keys = match value {
        Value::Object(map) => map.keys().cloned().collect(),
        _ => Vec::new(),
    };

    let canonical = value.to_string();
    let preview = truncate_chars(&canonical, PREVIEW_CHARS);

    let mut parts = Vec::new();
    flatten_scalars(value, &mut parts);
    let search_text = parts.join(" ").to_lowercase();

    JsonMetadata {
        keys,
        preview,
        search_text,
    }
}

/// Parses raw text as JSON and derives metadata in one step.
pub fn parse_and_analyze(raw: &str) -> Result<(Value, JsonMetadata), serde_json::Error> {
    let value: Value = serde_json::from_str(raw)?;
    let metadata = analyze(&value);
    Ok((value, metadata))
}

/// Collects scalar leaves depth-first. Objects and arrays recurse in
/// document order; null renders as "null" to stay findable.
fn flatten_scalars(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for v in map.values() {
                flatten_scalars(v, out);
            }
        }
        Value::Array(items) => {
            for v in items {
                flatten_scalars(v, out);
            }
        }
        Value::String(s) => out.push(s.clone()),
        Value::Number(n) => out.push(n.to_string()),
        Value::Bool(b) => out.push(b.to_string()),
        Value::Null => out.push("null".to_string()),
    }
}

/// Truncates to at most `limit` characters on a char boundary.
fn truncate_chars(s: &str, limit: usize) -> String {
    match s.char_indices().nth(limit) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
