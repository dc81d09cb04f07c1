//! MuPDF decode engine
//!
//! One implementation per worker source: a dedicated thread owning the
//! document, the tokio blocking pool, or the calling task itself.

use std::sync::Arc;

use async_trait::async_trait;

use crate::decode::{
    DecodeEngine, DecodeError, OpenedDocument, RenderOptions, RenderedPage, WorkerSource,
};

use super::safe::SafeDocument;
use super::worker::DecodeWorker;

#[derive(Debug, Clone, Copy, Default)]
pub struct MupdfEngine;

impl MupdfEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DecodeEngine for MupdfEngine {
    fn name(&self) -> &'static str {
        "mupdf"
    }

    async fn open(
        &self,
        data: Arc<Vec<u8>>,
        source: &WorkerSource,
    ) -> Result<Box<dyn OpenedDocument>, DecodeError> {
        match source {
            WorkerSource::DedicatedThread { name, stack_size } => {
                let worker = DecodeWorker::spawn(name, *stack_size, data).await?;
                Ok(Box::new(ThreadDocument { worker }))
            }
            WorkerSource::BlockingPool => {
                let doc = tokio::task::spawn_blocking(move || SafeDocument::from_bytes(data))
                    .await
                    .map_err(|e| DecodeError::RuntimeLoad(format!("blocking pool task failed: {}", e)))??;
                Ok(Box::new(PooledDocument { doc: Arc::new(doc) }))
            }
            WorkerSource::CallingThread => {
                let doc = SafeDocument::from_bytes(data)?;
                Ok(Box::new(InlineDocument { doc }))
            }
        }
    }
}

struct ThreadDocument {
    worker: DecodeWorker,
}

#[async_trait]
impl OpenedDocument for ThreadDocument {
    fn page_count(&self) -> usize {
        self.worker.page_count()
    }

    async fn render_page(
        &mut self,
        page_index: usize,
        options: &RenderOptions,
    ) -> Result<RenderedPage, DecodeError> {
        self.worker.render(page_index, *options).await
    }

    fn close(self: Box<Self>) {
        // Dropping the handle closes the channel and ends the thread
    }
}

struct PooledDocument {
    doc: Arc<SafeDocument>,
}

#[async_trait]
impl OpenedDocument for PooledDocument {
    fn page_count(&self) -> usize {
        self.doc.page_count()
    }

    async fn render_page(
        &mut self,
        page_index: usize,
        options: &RenderOptions,
    ) -> Result<RenderedPage, DecodeError> {
        let doc = self.doc.clone();
        let options = *options;
        tokio::task::spawn_blocking(move || doc.render(page_index, &options))
            .await
            .map_err(|e| DecodeError::RuntimeLoad(format!("blocking pool task failed: {}", e)))?
    }

    fn close(self: Box<Self>) {}
}

struct InlineDocument {
    doc: SafeDocument,
}

#[async_trait]
impl OpenedDocument for InlineDocument {
    fn page_count(&self) -> usize {
        self.doc.page_count()
    }

    async fn render_page(
        &mut self,
        page_index: usize,
        options: &RenderOptions,
    ) -> Result<RenderedPage, DecodeError> {
        self.doc.render(page_index, options)
    }

    fn close(self: Box<Self>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mupdf::test_support::pdf_with_pages;

    async fn open_and_render(source: WorkerSource) {
        let engine = MupdfEngine::new();
        let mut doc = engine
            .open(Arc::new(pdf_with_pages(2)), &source)
            .await
            .unwrap();
        assert_eq!(doc.page_count(), 2);

        let page = doc.render_page(1, &RenderOptions::default()).await.unwrap();
        assert_eq!((page.width, page.height), (1224, 1584));
        doc.close();
    }

    #[tokio::test]
    async fn test_dedicated_thread_source() {
        open_and_render(WorkerSource::dedicated("engine-test")).await;
    }

    #[tokio::test]
    async fn test_blocking_pool_source() {
        open_and_render(WorkerSource::BlockingPool).await;
    }

    #[tokio::test]
    async fn test_calling_thread_source() {
        open_and_render(WorkerSource::CallingThread).await;
    }

    #[tokio::test]
    async fn test_invalid_bytes_are_not_runtime_failures() {
        let engine = MupdfEngine::new();
        for source in [
            WorkerSource::dedicated("engine-test"),
            WorkerSource::BlockingPool,
            WorkerSource::CallingThread,
        ] {
            let err = engine
                .open(Arc::new(b"<!doctype html>".to_vec()), &source)
                .await
                .err()
                .unwrap();
            assert!(!err.is_runtime_load(), "{} misclassified: {}", source, err);
        }
    }
}
