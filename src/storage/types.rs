//! Storage types

use serde::Serialize;
use thiserror::Error;

/// What a metadata-only request learned about an object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectMetadata {
    pub url: String,
    pub size: Option<u64>,
    pub content_type: Option<String>,
}

/// Storage access errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Unexpected HTTP status {status} for {url}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Request timed out: {0}")]
    TimedOut(String),
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StorageError::TimedOut(err.to_string())
        } else {
            StorageError::Transport(err.to_string())
        }
    }
}
