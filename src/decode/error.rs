//! Decode error types
//!
//! Every failure on the open path is classified into a [`FailureKind`].
//! Only `RuntimeLoad` failures move the bridge on to the next worker source.

use thiserror::Error;

use crate::error::ViewerError;
use crate::storage::StorageError;

/// Decode engine error type
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The worker the engine runs on could not be started or died
    #[error("Decode runtime unavailable: {0}")]
    RuntimeLoad(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("Page {0} not found (document has {1} pages)")]
    PageNotFound(usize, usize),

    #[error("Failed to render page: {0}")]
    RenderError(String),

    #[error("Image encoding error: {0}")]
    ImageError(String),

    #[error("MuPDF error: {0}")]
    MuPdfError(String),
}

/// Classification of a whole-document failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    RuntimeLoad,
    InvalidDocument,
    NotFound,
    Network,
    Timeout,
}

impl DecodeError {
    pub fn classify(&self) -> FailureKind {
        match self {
            DecodeError::RuntimeLoad(_) => FailureKind::RuntimeLoad,
            DecodeError::InvalidDocument(_) => FailureKind::InvalidDocument,
            DecodeError::NotFound(_) => FailureKind::NotFound,
            DecodeError::Network(_) => FailureKind::Network,
            DecodeError::Timeout(_) => FailureKind::Timeout,
            DecodeError::PageNotFound(..) => FailureKind::InvalidDocument,
            DecodeError::RenderError(msg)
            | DecodeError::ImageError(msg)
            | DecodeError::MuPdfError(msg) => classify_message(msg),
        }
    }

    pub fn is_runtime_load(&self) -> bool {
        self.classify() == FailureKind::RuntimeLoad
    }
}

/// Classify an untyped engine message
pub fn classify_message(message: &str) -> FailureKind {
    let message = message.to_lowercase();
    let mentions = |needles: &[&str]| needles.iter().any(|n| message.contains(n));

    if mentions(&["worker", "runtime", "thread", "spawn"]) {
        FailureKind::RuntimeLoad
    } else if mentions(&["timed out", "timeout"]) {
        FailureKind::Timeout
    } else if mentions(&["404", "not found", "no such file"]) {
        FailureKind::NotFound
    } else if mentions(&["network", "connection", "fetch", "dns"]) {
        FailureKind::Network
    } else {
        FailureKind::InvalidDocument
    }
}

impl From<mupdf::Error> for DecodeError {
    fn from(e: mupdf::Error) -> Self {
        DecodeError::MuPdfError(e.to_string())
    }
}

impl From<StorageError> for DecodeError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::ObjectNotFound(url) => DecodeError::NotFound(url),
            other => DecodeError::Network(other.to_string()),
        }
    }
}

impl From<DecodeError> for ViewerError {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::Timeout(secs) => ViewerError::Timeout(secs),
            other => {
                let message = other.to_string();
                match other.classify() {
                    FailureKind::RuntimeLoad => ViewerError::RuntimeLoad(message),
                    FailureKind::InvalidDocument => ViewerError::InvalidDocument(message),
                    FailureKind::NotFound => ViewerError::NotFound(message),
                    FailureKind::Network => ViewerError::Network(message),
                    FailureKind::Timeout => ViewerError::TimedOut(message),
                }
            }
        }
    }
}
