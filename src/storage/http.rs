//! HTTP access to public storage
//!
//! Two narrow seams: a metadata-only existence probe used by the resolver,
//! and a byte fetcher used by the rasterizer to download the PDF.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};

use super::types::{ObjectMetadata, StorageError};

/// Metadata-only existence check
#[async_trait]
pub trait AssetProbe: Send + Sync {
    /// `Ok(Some(_))` when the object exists, `Ok(None)` when it does not
    async fn probe(&self, url: &str) -> Result<Option<ObjectMetadata>, StorageError>;
}

/// Downloads document bytes
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, StorageError>;
}

/// `HEAD` based probe
#[derive(Clone)]
pub struct HttpAssetProbe {
    client: Client,
}

impl HttpAssetProbe {
    pub fn new(timeout: Duration) -> Result<Self, StorageError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl AssetProbe for HttpAssetProbe {
    async fn probe(&self, url: &str) -> Result<Option<ObjectMetadata>, StorageError> {
        let response = self.client.head(url).send().await?;
        let status = response.status();

        if status.is_success() {
            let headers = response.headers();
            let size = headers
                .get(header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            let content_type = headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            return Ok(Some(ObjectMetadata {
                url: url.to_string(),
                size,
                content_type,
            }));
        }

        tracing::debug!(url, status = status.as_u16(), "Existence probe miss");
        Ok(None)
    }
}

/// `GET` based fetcher
#[derive(Clone, Default)]
pub struct HttpDocumentFetcher {
    client: Client,
}

impl HttpDocumentFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentFetcher for HttpDocumentFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, StorageError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Err(StorageError::ObjectNotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(StorageError::UnexpectedStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        tracing::debug!(url, bytes = bytes.len(), "Fetched document");
        Ok(bytes.to_vec())
    }
}
