//! Filename sanitization and span-safe path redaction.
//!
//! Stored filenames must be filesystem-safe on every platform a store can
//! live on; span fields must not leak full user paths into shared traces.

use std::path::Path;

/// Maximum length of a sanitized basename.
const MAX_BASENAME_LEN: usize = 200;

/// Makes a basename safe for use inside a category folder.
///
/// Path separators become underscores, spaces become underscores, anything
/// outside `[A-Za-z0-9._-]` is dropped, and the result is capped at 200
/// characters. An input that sanitizes to nothing yields `"file"`.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.trim().chars() {
        match c {
            '/' | '\\' | ' ' => out.push('_'),
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') => out.push(c),
            _ => {}
        }
    }

    out.truncate(MAX_BASENAME_LEN);

    if out.chars().all(|c| c == '.' || c == '_') {
        return "file".to_string();
    }
    out
}

/// Returns only the filename component of a path (no directory).
///
/// Safe for span fields: reveals the file name without exposing the full path.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}
