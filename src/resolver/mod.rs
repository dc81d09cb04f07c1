//! Asset resolver
//!
//! Turns the viewer's route input (a slug or an explicit file URL) into a
//! [`DocumentReference`]. Slugs go to the catalog first; on a miss the
//! object name is derived from the slug and probed in the public bucket.

pub mod slug;

use std::sync::Arc;

use serde::Deserialize;

use crate::catalog::{BookCatalog, DocumentReference};
use crate::error::ViewerError;
use crate::storage::{AssetProbe, StorageNamespace};

use slug::{filename_from_slug, slug_from_filename, title_from_filename, title_from_slug, UNKNOWN_TITLE};

/// What the viewer was asked to open
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookRequest {
    /// `/book/:slug`
    Slug(String),
    /// `/book-viewer?file=<url>`
    File(String),
}

impl BookRequest {
    /// Build a request from route parameters; a slug wins over a file
    pub fn from_params(slug: Option<String>, file: Option<String>) -> Result<Self, ViewerError> {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        match (non_empty(slug), non_empty(file)) {
            (Some(slug), _) => Ok(BookRequest::Slug(slug.trim().to_string())),
            (None, Some(file)) => Ok(BookRequest::File(file.trim().to_string())),
            (None, None) => Err(ViewerError::MissingReference),
        }
    }
}

/// Resolves slugs and file references to retrievable documents
#[derive(Clone)]
pub struct AssetResolver {
    catalog: Arc<dyn BookCatalog>,
    probe: Arc<dyn AssetProbe>,
    namespace: StorageNamespace,
}

impl AssetResolver {
    pub fn new(
        catalog: Arc<dyn BookCatalog>,
        probe: Arc<dyn AssetProbe>,
        namespace: StorageNamespace,
    ) -> Self {
        Self {
            catalog,
            probe,
            namespace,
        }
    }

    pub async fn resolve(&self, request: &BookRequest) -> Result<DocumentReference, ViewerError> {
        match request {
            BookRequest::Slug(slug) => self.resolve_slug(slug).await,
            BookRequest::File(file) => self.resolve_file(file).await,
        }
    }

    async fn resolve_slug(&self, slug: &str) -> Result<DocumentReference, ViewerError> {
        match self.catalog.find_by_slug(slug).await {
            Ok(Some(reference)) => {
                tracing::debug!(slug, url = %reference.source_url, "Catalog hit");
                return Ok(reference);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(slug, "Catalog lookup failed, deriving location: {}", e);
            }
        }

        let filename = filename_from_slug(slug);
        let candidate_url = self.namespace.public_url(&filename);

        match self.probe.probe(&candidate_url).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return Err(ViewerError::NotFound(format!(
                    "no document for slug \"{}\"",
                    slug
                )));
            }
            Err(e) => {
                tracing::warn!(slug, url = %candidate_url, "Existence probe failed: {}", e);
                return Err(ViewerError::NotFound(format!(
                    "no document for slug \"{}\"",
                    slug
                )));
            }
        }

        let reference = DocumentReference::new(slug, candidate_url, title_from_slug(slug));

        if let Err(e) = self.catalog.insert_if_absent(&reference).await {
            tracing::warn!(slug, "Could not save book to catalog: {}", e);
        } else {
            tracing::info!(slug, url = %reference.source_url, "Catalogued derived book");
        }

        Ok(reference)
    }

    async fn resolve_file(&self, file: &str) -> Result<DocumentReference, ViewerError> {
        let url = reqwest::Url::parse(file)
            .map_err(|e| ViewerError::InvalidReference(format!("{}: {}", file, e)))?;

        let filename = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(|segment| {
                urlencoding::decode(segment)
                    .map(|decoded| decoded.into_owned())
                    .unwrap_or_else(|_| segment.to_string())
            })
            .filter(|segment| !segment.is_empty())
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string());

        let reference = DocumentReference::new(
            slug_from_filename(&filename),
            file,
            title_from_filename(&filename),
        );

        if let Err(e) = self.catalog.upsert(&reference).await {
            tracing::warn!(slug = %reference.slug, "Could not save book to catalog: {}", e);
        }

        Ok(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogError, SqliteCatalog};
    use crate::db::create_pool;
    use crate::storage::{ObjectMetadata, StorageError};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    const BASE: &str = "https://storage.example";

    /// Probe answering from a fixed set of existing URLs, recording every call
    #[derive(Default)]
    struct RecordingProbe {
        existing: Vec<String>,
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl AssetProbe for RecordingProbe {
        async fn probe(&self, url: &str) -> Result<Option<ObjectMetadata>, StorageError> {
            self.calls.lock().push(url.to_string());
            if self.fail {
                return Err(StorageError::Transport("connection refused".into()));
            }
            Ok(self.existing.iter().any(|u| u == url).then(|| ObjectMetadata {
                url: url.to_string(),
                size: Some(1024),
                content_type: Some("application/pdf".into()),
            }))
        }
    }

    /// Catalog whose writes always fail
    struct ReadOnlyCatalog;

    #[async_trait]
    impl BookCatalog for ReadOnlyCatalog {
        async fn find_by_slug(&self, _slug: &str) -> Result<Option<DocumentReference>, CatalogError> {
            Ok(None)
        }

        async fn insert_if_absent(&self, _reference: &DocumentReference) -> Result<(), CatalogError> {
            Err(CatalogError::Unavailable("read-only".into()))
        }

        async fn upsert(&self, _reference: &DocumentReference) -> Result<(), CatalogError> {
            Err(CatalogError::Unavailable("read-only".into()))
        }

        async fn count(&self) -> Result<usize, CatalogError> {
            Ok(0)
        }
    }

    fn namespace() -> StorageNamespace {
        StorageNamespace::new(BASE, "books")
    }

    async fn sqlite_catalog() -> Arc<SqliteCatalog> {
        Arc::new(SqliteCatalog::new(create_pool("sqlite::memory:").await.unwrap()))
    }

    #[test]
    fn test_request_from_params() {
        assert_eq!(
            BookRequest::from_params(Some("trip".into()), Some("https://x/y.pdf".into())).unwrap(),
            BookRequest::Slug("trip".into())
        );
        assert_eq!(
            BookRequest::from_params(Some("  ".into()), Some("https://x/y.pdf".into())).unwrap(),
            BookRequest::File("https://x/y.pdf".into())
        );
        assert_eq!(
            BookRequest::from_params(None, None),
            Err(ViewerError::MissingReference)
        );
    }

    #[tokio::test]
    async fn test_catalog_hit_skips_probe() {
        let catalog = sqlite_catalog().await;
        let stored = DocumentReference::new("trip-journal", "https://cdn.example/trip.pdf", "Trip Journal");
        catalog.upsert(&stored).await.unwrap();

        let probe = Arc::new(RecordingProbe::default());
        let resolver = AssetResolver::new(catalog, probe.clone(), namespace());

        let resolved = resolver
            .resolve(&BookRequest::Slug("trip-journal".into()))
            .await
            .unwrap();

        assert_eq!(resolved, stored);
        assert!(probe.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_derived_url_is_probed_and_catalogued() {
        let catalog = sqlite_catalog().await;
        let expected_url = namespace().public_url("Untitled Notes.pdf");
        let probe = Arc::new(RecordingProbe {
            existing: vec![expected_url.clone()],
            ..Default::default()
        });
        let resolver = AssetResolver::new(catalog.clone(), probe.clone(), namespace());
        let request = BookRequest::Slug("untitled-notes".into());

        let resolved = resolver.resolve(&request).await.unwrap();

        assert_eq!(resolved.source_url, expected_url);
        assert_eq!(resolved.title, "Untitled Notes");
        assert_eq!(catalog.count().await.unwrap(), 1);

        // Second resolution is a catalog hit and adds no row
        let again = resolver.resolve(&request).await.unwrap();
        assert_eq!(again, resolved);
        assert_eq!(catalog.count().await.unwrap(), 1);
        assert_eq!(probe.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let catalog = sqlite_catalog().await;
        let probe = Arc::new(RecordingProbe::default());
        let resolver = AssetResolver::new(catalog.clone(), probe, namespace());

        let result = resolver.resolve(&BookRequest::Slug("ghost-doc".into())).await;

        assert!(matches!(result, Err(ViewerError::NotFound(_))));
        assert_eq!(catalog.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_probe_transport_error_is_not_found() {
        let probe = Arc::new(RecordingProbe {
            fail: true,
            ..Default::default()
        });
        let resolver = AssetResolver::new(sqlite_catalog().await, probe, namespace());

        let result = resolver.resolve(&BookRequest::Slug("offline".into())).await;
        assert!(matches!(result, Err(ViewerError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_catalog_write_failure_does_not_fail_resolution() {
        let expected_url = namespace().public_url("Untitled Notes.pdf");
        let probe = Arc::new(RecordingProbe {
            existing: vec![expected_url.clone()],
            ..Default::default()
        });
        let resolver = AssetResolver::new(Arc::new(ReadOnlyCatalog), probe, namespace());

        let resolved = resolver
            .resolve(&BookRequest::Slug("untitled-notes".into()))
            .await
            .unwrap();
        assert_eq!(resolved.source_url, expected_url);

        let resolved = resolver
            .resolve(&BookRequest::File("https://cdn.example/files/Road%20Trip.pdf".into()))
            .await
            .unwrap();
        assert_eq!(resolved.slug, "road-trip");
    }

    #[tokio::test]
    async fn test_file_reference_is_upserted_without_probe() {
        let catalog = sqlite_catalog().await;
        let probe = Arc::new(RecordingProbe::default());
        let resolver = AssetResolver::new(catalog.clone(), probe.clone(), namespace());
        let file = "https://cdn.example/files/Summer%20in%20Lisbon.pdf";

        let resolved = resolver
            .resolve(&BookRequest::File(file.into()))
            .await
            .unwrap();

        assert_eq!(resolved.slug, "summer-in-lisbon");
        assert_eq!(resolved.title, "Summer in Lisbon");
        assert_eq!(resolved.source_url, file);
        assert!(probe.calls.lock().is_empty());
        assert_eq!(
            catalog.find_by_slug("summer-in-lisbon").await.unwrap(),
            Some(resolved)
        );
    }

    #[tokio::test]
    async fn test_file_reference_must_be_absolute_url() {
        let resolver = AssetResolver::new(
            sqlite_catalog().await,
            Arc::new(RecordingProbe::default()),
            namespace(),
        );

        let result = resolver
            .resolve(&BookRequest::File("not a url".into()))
            .await;
        assert!(matches!(result, Err(ViewerError::InvalidReference(_))));
    }

    #[tokio::test]
    async fn test_file_reference_without_filename() {
        let resolver = AssetResolver::new(
            sqlite_catalog().await,
            Arc::new(RecordingProbe::default()),
            namespace(),
        );

        let resolved = resolver
            .resolve(&BookRequest::File("https://cdn.example/".into()))
            .await
            .unwrap();
        assert_eq!(resolved.title, UNKNOWN_TITLE);
        assert_eq!(resolved.slug, "unknown-book");
    }
}
