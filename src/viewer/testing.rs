//! Test doubles for viewer sessions and routes

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::catalog::{BookCatalog, DocumentReference, SqliteCatalog};
use crate::db::create_pool;
use crate::decode::{
    DecodeBridge, DecodeEngine, DecodeError, OpenedDocument, RenderOptions, RenderedPage,
    WorkerSource,
};
use crate::raster::{RasterOptions, Rasterizer};
use crate::resolver::AssetResolver;
use crate::storage::{AssetProbe, DocumentFetcher, ObjectMetadata, StorageError, StorageNamespace};

use super::session::{SessionSnapshot, ViewerPipeline, ViewerSession};

pub const TRIP_URL: &str = "https://cdn.example/trip.pdf";

/// Serves a tiny PDF header for any URL
pub struct FakeFetcher;

#[async_trait]
impl DocumentFetcher for FakeFetcher {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>, StorageError> {
        Ok(b"%PDF-1.4 fake".to_vec())
    }
}

/// Nothing exists in storage
pub struct EmptyBucket;

#[async_trait]
impl AssetProbe for EmptyBucket {
    async fn probe(&self, _url: &str) -> Result<Option<ObjectMetadata>, StorageError> {
        Ok(None)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeEngine {
    pub page_count: usize,
    pub open_delay: Duration,
}

impl FakeEngine {
    pub fn pages(page_count: usize) -> Self {
        Self {
            page_count,
            ..Default::default()
        }
    }
}

#[async_trait]
impl DecodeEngine for FakeEngine {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn open(
        &self,
        _data: Arc<Vec<u8>>,
        _source: &WorkerSource,
    ) -> Result<Box<dyn OpenedDocument>, DecodeError> {
        if !self.open_delay.is_zero() {
            tokio::time::sleep(self.open_delay).await;
        }
        Ok(Box::new(FakeDocument {
            page_count: self.page_count,
        }))
    }
}

struct FakeDocument {
    page_count: usize,
}

#[async_trait]
impl OpenedDocument for FakeDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    async fn render_page(
        &mut self,
        page_index: usize,
        options: &RenderOptions,
    ) -> Result<RenderedPage, DecodeError> {
        Ok(RenderedPage {
            data: vec![page_index as u8; 4],
            format: options.format,
            width: 8,
            height: 8,
        })
    }

    fn close(self: Box<Self>) {}
}

/// Catalog holding "trip-journal", nothing in storage, fake decode
pub async fn pipeline(engine: FakeEngine) -> ViewerPipeline {
    let catalog = SqliteCatalog::new(create_pool("sqlite::memory:").await.unwrap());
    catalog
        .upsert(&DocumentReference::new("trip-journal", TRIP_URL, "Trip Journal"))
        .await
        .unwrap();

    let resolver = AssetResolver::new(
        Arc::new(catalog),
        Arc::new(EmptyBucket),
        StorageNamespace::new("https://storage.example", "books"),
    );
    let bridge = Arc::new(DecodeBridge::new(
        Arc::new(engine),
        vec![WorkerSource::BlockingPool],
    ));
    let rasterizer = Rasterizer::new(Arc::new(FakeFetcher), bridge, RasterOptions::default());

    ViewerPipeline::new(resolver, rasterizer)
}

/// Poll until the session reports `status`
pub async fn wait_for_status(session: &ViewerSession, status: &str) -> SessionSnapshot {
    for _ in 0..200 {
        let snapshot = session.snapshot();
        if snapshot.status == status {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("session never reached {}: {:?}", status, session.snapshot());
}
