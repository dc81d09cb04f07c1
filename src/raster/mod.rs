//! Page-by-page rasterizer
//!
//! Downloads a document, opens it through the decode bridge and renders
//! every page in order, one at a time. A page that fails to render is
//! replaced by a placeholder so the output always has one entry per page.
//! Runtime-loading failures on open move the bridge to its next worker
//! source and retry, up to a fixed ceiling.

mod placeholder;
mod types;

pub use placeholder::{render_placeholder, PLACEHOLDER_PAGE_HEIGHT, PLACEHOLDER_PAGE_WIDTH};
pub use types::{DecodeProgress, ImageFormat, PageImage, RasterOutcome};

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::config::ViewerConfig;
use crate::decode::{DecodeBridge, DecodeError, OpenedDocument, RenderOptions, WorkerSource};
use crate::error::ViewerError;
use crate::storage::DocumentFetcher;
use crate::viewer::CancellationToken;

const PDF_MAGIC: &[u8] = b"%PDF";

/// Rasterizer settings
#[derive(Debug, Clone)]
pub struct RasterOptions {
    pub render: RenderOptions,
    /// Bounded wait for fetch plus open
    pub open_timeout: Duration,
    pub page_timeout: Duration,
    pub max_runtime_retries: u32,
}

impl RasterOptions {
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            render: RenderOptions {
                scale: config.render_scale,
                format: config.image_format,
            },
            open_timeout: config.open_timeout(),
            page_timeout: config.page_timeout(),
            max_runtime_retries: config.max_runtime_retries,
        }
    }
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self::from_config(&ViewerConfig::default())
    }
}

#[derive(Clone)]
pub struct Rasterizer {
    fetcher: Arc<dyn DocumentFetcher>,
    bridge: Arc<DecodeBridge>,
    options: RasterOptions,
}

impl Rasterizer {
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        bridge: Arc<DecodeBridge>,
        options: RasterOptions,
    ) -> Self {
        Self {
            fetcher,
            bridge,
            options,
        }
    }

    pub fn options(&self) -> &RasterOptions {
        &self.options
    }

    /// Render every page of the document at `url`
    ///
    /// `on_progress` fires once per page in page order, or once with `0/0`
    /// for an empty document. Cancellation is not an error: it yields
    /// [`RasterOutcome::Cancelled`] with whatever was produced.
    pub async fn rasterize<F>(
        &self,
        url: &str,
        mut on_progress: F,
        cancel: &CancellationToken,
    ) -> Result<RasterOutcome, ViewerError>
    where
        F: FnMut(DecodeProgress) + Send,
    {
        let mut document = match self.open_with_fallback(url, cancel).await? {
            Some(document) => document,
            None => {
                tracing::debug!(url, "Rasterization cancelled before open completed");
                return Ok(RasterOutcome::Cancelled {
                    partial: Vec::new(),
                });
            }
        };

        let result = self
            .render_pages(document.as_mut(), &mut on_progress, cancel)
            .await;
        document.close();

        result
    }

    /// Open the document, moving through worker sources on runtime failures
    ///
    /// `Ok(None)` means the token was cancelled while waiting.
    async fn open_with_fallback(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Box<dyn OpenedDocument>>, ViewerError> {
        let open_timeout = self.options.open_timeout;
        let mut data: Option<Arc<Vec<u8>>> = None;
        let mut retries = 0;

        self.bridge.configure_initial();

        loop {
            if cancel.is_cancelled() {
                return Ok(None);
            }

            let source = self.bridge.active_source();
            let attempt = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(None),
                result = timeout(open_timeout, self.open_document(url, &source, &mut data)) => result,
            };

            let err = match attempt {
                Ok(Ok(document)) => {
                    tracing::info!(url, pages = document.page_count(), "Document opened");
                    return Ok(Some(document));
                }
                Ok(Err(e)) => e,
                Err(_) => DecodeError::Timeout(open_timeout.as_secs()),
            };

            if err.is_runtime_load()
                && retries < self.options.max_runtime_retries
                && self.bridge.advance_from(&source)
            {
                retries += 1;
                tracing::warn!(
                    url,
                    retries,
                    failed = %source,
                    "Decode runtime failed to load, retrying: {}",
                    err
                );
                continue;
            }

            tracing::error!(url, retries, "Failed to open document: {}", err);
            return Err(err.into());
        }
    }

    /// Fetch once, then open on `source`
    async fn open_document(
        &self,
        url: &str,
        source: &WorkerSource,
        data: &mut Option<Arc<Vec<u8>>>,
    ) -> Result<Box<dyn OpenedDocument>, DecodeError> {
        let bytes = match data {
            Some(bytes) => bytes.clone(),
            None => {
                let fetched = self.fetcher.fetch(url).await?;
                if !fetched.starts_with(PDF_MAGIC) {
                    return Err(DecodeError::InvalidDocument(format!(
                        "{} is not a PDF",
                        url
                    )));
                }
                let bytes = Arc::new(fetched);
                *data = Some(bytes.clone());
                bytes
            }
        };

        let document = self.bridge.open_on(bytes, source).await?;
        tracing::debug!(url, source = %source, "Opened on worker source");
        Ok(document)
    }

    async fn render_pages<F>(
        &self,
        document: &mut dyn OpenedDocument,
        on_progress: &mut F,
        cancel: &CancellationToken,
    ) -> Result<RasterOutcome, ViewerError>
    where
        F: FnMut(DecodeProgress) + Send,
    {
        let total_pages = document.page_count();
        if total_pages == 0 {
            on_progress(DecodeProgress::new(0, 0));
            return Ok(RasterOutcome::Complete(Vec::new()));
        }

        let options = self.options.render;
        let mut pages = Vec::with_capacity(total_pages);

        for page_index in 0..total_pages {
            if cancel.is_cancelled() {
                tracing::debug!(completed = pages.len(), total_pages, "Rasterization cancelled");
                return Ok(RasterOutcome::Cancelled { partial: pages });
            }

            let page_number = page_index + 1;
            let rendered = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(
                        page = page_number,
                        completed = pages.len(),
                        total_pages,
                        "Rasterization cancelled mid-page"
                    );
                    return Ok(RasterOutcome::Cancelled { partial: pages });
                }
                rendered = timeout(
                    self.options.page_timeout,
                    document.render_page(page_index, &options),
                ) => rendered,
            };

            let page = match rendered {
                Ok(Ok(page)) => PageImage::rendered(page_number, page),
                Ok(Err(e)) => {
                    tracing::warn!(page = page_number, "Page failed to render: {}", e);
                    PageImage::placeholder(page_number, render_placeholder(page_number, &options)?)
                }
                Err(_) => {
                    tracing::warn!(
                        page = page_number,
                        "Page render timed out after {:?}",
                        self.options.page_timeout
                    );
                    PageImage::placeholder(page_number, render_placeholder(page_number, &options)?)
                }
            };

            pages.push(page);
            on_progress(DecodeProgress::new(page_number, total_pages));
        }

        Ok(RasterOutcome::Complete(pages))
    }
}
