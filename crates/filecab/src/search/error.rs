use thiserror::Error;

use crate::catalog::CatalogError;

#[derive(Error, Debug)]
pub enum SearchError {
    /// The `type:` token names something outside the closed category set.
    /// The query is rejected; nothing is searched.
    #[error(
        "invalid type filter '{token}' (valid: image, video, json, text, audio, pdf, other)"
    )]
    InvalidFilter { token: String },

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}
