//! Content classification: MIME type detection and the closed category set.
//!
//! Every ingested item lands in exactly one of seven categories, used both
//! for folder placement and for `type:` search filters. Classification is
//! total; anything unrecognized is `Other`.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// MIME type reported when nothing better can be determined.
pub const UNKNOWN_MIME: &str = "application/octet-stream";

/// The closed set of storage categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Image,
    Video,
    Json,
    Text,
    Audio,
    Pdf,
    Other,
}

impl Category {
    /// All categories, in folder-layout order.
    pub const ALL: [Category; 7] = [
        Category::Image,
        Category::Video,
        Category::Json,
        Category::Text,
        Category::Audio,
        Category::Pdf,
        Category::Other,
    ];

    /// The folder / column name for this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Image => "image",
            Category::Video => "video",
            Category::Json => "json",
            Category::Text => "text",
            Category::Audio => "audio",
            Category::Pdf => "pdf",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ();

    /// Case-insensitive parse of the seven category tokens. Anything else
    /// is an error; callers must not invent categories.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "image" => Ok(Category::Image),
            "video" => Ok(Category::Video),
            "json" => Ok(Category::Json),
            "text" => Ok(Category::Text),
            "audio" => Ok(Category::Audio),
            "pdf" => Ok(Category::Pdf),
            "other" => Ok(Category::Other),
            _ => Err(()),
        }
    }
}

/// Maps a MIME type string to a storage category.
///
/// Total over all inputs; parameters after `;` are ignored, matching is
/// case-insensitive. Unmapped types yield `Other`.
pub fn classify(mime: &str) -> Category {
    let essence = mime
        .split(';')
        .next()
        .unwrap_or(mime)
        .trim()
        .to_ascii_lowercase();

    if essence == "application/json" || essence == "text/json" {
        return Category::Json;
    }
    if essence == "application/pdf" {
        return Category::Pdf;
    }
    if essence.starts_with("image/") {
        return Category::Image;
    }
    if essence.starts_with("video/") {
        return Category::Video;
    }
    if essence.starts_with("audio/") {
        return Category::Audio;
    }
    if essence.starts_with("text/") {
        return Category::Text;
    }
    Category::Other
}

/// Guesses the MIME type of a file from its path.
///
/// Falls back to `application/octet-stream` for unknown extensions.
pub fn detect_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|m| m.to_string())
        .unwrap_or_else(|| UNKNOWN_MIME.to_string())
}
