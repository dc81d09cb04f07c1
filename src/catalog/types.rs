//! Catalog types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One viewable document: the slug it is reached by, where its bytes live,
/// and the title shown while it loads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReference {
    pub slug: String,
    #[sqlx(rename = "file_url")]
    pub source_url: String,
    pub title: String,
}

impl DocumentReference {
    pub fn new(
        slug: impl Into<String>,
        source_url: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            slug: slug.into(),
            source_url: source_url.into(),
            title: title.into(),
        }
    }
}

/// Catalog storage errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}
