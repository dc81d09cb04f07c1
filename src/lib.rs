//! Book Viewer
//!
//! Opens travel-journal PDFs by slug or URL and serves them page by page.
//! The server binary is in main.rs.
//!
//! # Modules
//!
//! - `resolver`: slug / file reference to a retrievable document
//! - `decode`: decode engine seam and worker-source fallback
//! - `mupdf`: MuPDF-backed decode engine
//! - `raster`: page-by-page rasterization with placeholders
//! - `viewer`: sessions, navigation and cancellation

pub mod catalog;
pub mod config;
pub mod db;
pub mod decode;
pub mod error;
pub mod mupdf;
pub mod raster;
pub mod resolver;
pub mod routes;
pub mod state;
pub mod storage;
pub mod viewer;
