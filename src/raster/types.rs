//! Rasterizer output types

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;

use crate::decode::RenderedPage;

pub use crate::decode::ImageFormat;

/// One page of the output sequence, rendered or placeholder
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 1-based
    pub page_number: usize,
    pub data: Arc<Vec<u8>>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub placeholder: bool,
}

impl PageImage {
    pub fn rendered(page_number: usize, page: RenderedPage) -> Self {
        Self {
            page_number,
            data: Arc::new(page.data),
            format: page.format,
            width: page.width,
            height: page.height,
            placeholder: false,
        }
    }

    pub fn placeholder(page_number: usize, page: RenderedPage) -> Self {
        Self {
            placeholder: true,
            ..Self::rendered(page_number, page)
        }
    }

    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }

    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.content_type(), STANDARD.encode(self.data.as_slice()))
    }
}

/// Pages done out of the document total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeProgress {
    pub completed_pages: usize,
    pub total_pages: usize,
}

impl DecodeProgress {
    pub fn new(completed_pages: usize, total_pages: usize) -> Self {
        Self {
            completed_pages,
            total_pages,
        }
    }

    /// Whole percent; an empty document counts as done
    pub fn percent(&self) -> u8 {
        if self.total_pages == 0 {
            return 100;
        }
        ((self.completed_pages.min(self.total_pages) * 100) / self.total_pages) as u8
    }

    pub fn is_complete(&self) -> bool {
        self.completed_pages >= self.total_pages
    }
}

/// How a rasterize call ended without a fatal error
#[derive(Debug)]
pub enum RasterOutcome {
    Complete(Vec<PageImage>),
    /// Stopped by the cancellation token; `partial` is for the caller to discard
    Cancelled { partial: Vec<PageImage> },
}
