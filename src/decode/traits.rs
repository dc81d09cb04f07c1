//! Decode engine traits
//!
//! The rasterizer only sees these two seams: an engine that can open a
//! document on a given worker source, and the opened document it renders
//! page by page.

use std::sync::Arc;

use async_trait::async_trait;

use super::error::DecodeError;
use super::source::WorkerSource;
use super::types::{RenderOptions, RenderedPage};

/// Opens documents on a worker source
#[async_trait]
pub trait DecodeEngine: Send + Sync {
    /// Engine name for logs
    fn name(&self) -> &'static str;

    /// Open a document from its bytes on the given source
    async fn open(
        &self,
        data: Arc<Vec<u8>>,
        source: &WorkerSource,
    ) -> Result<Box<dyn OpenedDocument>, DecodeError>;
}

/// A whole-document decode handle
#[async_trait]
pub trait OpenedDocument: Send {
    fn page_count(&self) -> usize;

    /// Render one page (0-based). Per-page resources are released before returning.
    async fn render_page(
        &mut self,
        page_index: usize,
        options: &RenderOptions,
    ) -> Result<RenderedPage, DecodeError>;

    /// Release the document and whatever runtime holds it
    fn close(self: Box<Self>);
}
