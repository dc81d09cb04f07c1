//! Error types for the book viewer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Failures surfaced to the viewer as a full-screen error state
///
/// Cancellation is not an error and has no variant here; per-page render
/// failures are downgraded to placeholder pages and never reach this type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewerError {
    #[error("No book specified. Please provide either a slug or file parameter.")]
    MissingReference,

    #[error("Invalid book reference: {0}")]
    InvalidReference(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Opening the document timed out after {0} seconds")]
    Timeout(u64),

    /// A timeout reported by the engine or transport, duration unknown
    #[error("Timed out: {0}")]
    TimedOut(String),

    #[error("Decode runtime failed to load: {0}")]
    RuntimeLoad(String),
}

/// Stable classification of a [`ViewerError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidReference,
    InvalidDocument,
    Network,
    Timeout,
    RuntimeLoad,
}

impl ViewerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ViewerError::MissingReference | ViewerError::NotFound(_) => ErrorKind::NotFound,
            ViewerError::InvalidReference(_) => ErrorKind::InvalidReference,
            ViewerError::InvalidDocument(_) => ErrorKind::InvalidDocument,
            ViewerError::Network(_) => ErrorKind::Network,
            ViewerError::Timeout(_) | ViewerError::TimedOut(_) => ErrorKind::Timeout,
            ViewerError::RuntimeLoad(_) => ErrorKind::RuntimeLoad,
        }
    }

    /// Short message for the error screen; `to_string()` is the technical detail
    pub fn user_message(&self) -> &'static str {
        match self {
            ViewerError::MissingReference => {
                "No book specified. Please provide either a slug or file parameter."
            }
            ViewerError::InvalidReference(_) => "The book link is not valid.",
            ViewerError::NotFound(_) => "We couldn't find this book.",
            ViewerError::InvalidDocument(_) => "This file is not a readable PDF.",
            ViewerError::Network(_) => "The book could not be downloaded. Check your connection and try again.",
            ViewerError::Timeout(_) | ViewerError::TimedOut(_) => {
                "The book took too long to open. Please try again."
            }
            ViewerError::RuntimeLoad(_) => "The PDF renderer could not be started.",
        }
    }
}

/// HTTP-facing error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Viewer(#[from] ViewerError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::Viewer(e) => {
                let status = match e.kind() {
                    ErrorKind::NotFound => StatusCode::NOT_FOUND,
                    ErrorKind::InvalidReference => StatusCode::BAD_REQUEST,
                    ErrorKind::InvalidDocument => StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
                    ErrorKind::Network | ErrorKind::RuntimeLoad => StatusCode::BAD_GATEWAY,
                };
                (status, "viewer_error", e.user_message().to_string())
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}
