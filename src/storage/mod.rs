//! Storage module for the public book bucket
//!
//! Builds public object URLs and talks HTTP to them.

mod http;
mod namespace;
mod types;

pub use http::{AssetProbe, DocumentFetcher, HttpAssetProbe, HttpDocumentFetcher};
pub use namespace::StorageNamespace;
pub use types::{ObjectMetadata, StorageError};
