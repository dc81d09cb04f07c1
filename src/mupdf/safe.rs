//! Thread-safe document wrapper for MuPDF
//!
//! MuPDF documents are not thread-safe. This wrapper:
//!
//! 1. Stores the document bytes
//! 2. Opens a fresh document for each operation
//! 3. Uses `parking_lot::Mutex` to serialize access
//!
//! It backs the blocking-pool and calling-thread worker sources, where no
//! single thread can own a long-lived `mupdf::Document`.

use std::sync::Arc;

use mupdf::Document;
use parking_lot::Mutex;

use crate::decode::{DecodeError, RenderOptions, RenderedPage};

use super::render::{open_pdf, render_page};

/// Thread-safe document wrapper
pub struct SafeDocument {
    /// Document bytes
    data: Arc<Vec<u8>>,
    /// Cached page count
    page_count: usize,
    /// Mutex for serializing access
    lock: Mutex<()>,
}

impl SafeDocument {
    /// Validate the bytes open as a PDF and remember the page count
    pub fn from_bytes(data: Arc<Vec<u8>>) -> Result<Self, DecodeError> {
        let doc = open_pdf(&data)?;
        let page_count = doc.page_count()?.max(0) as usize;

        Ok(Self {
            data,
            page_count,
            lock: Mutex::new(()),
        })
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Execute a closure with access to a freshly opened document
    ///
    /// The document is dropped when the closure returns. Access is
    /// serialized via mutex.
    pub fn with_doc<F, R>(&self, f: F) -> Result<R, DecodeError>
    where
        F: FnOnce(&Document) -> Result<R, DecodeError>,
    {
        let _guard = self.lock.lock();
        let doc = open_pdf(&self.data)?;
        f(&doc)
    }

    /// Render one page (0-based)
    pub fn render(&self, page_index: usize, options: &RenderOptions) -> Result<RenderedPage, DecodeError> {
        if page_index >= self.page_count {
            return Err(DecodeError::PageNotFound(page_index + 1, self.page_count));
        }
        self.with_doc(|doc| render_page(doc, page_index, options))
    }
}
