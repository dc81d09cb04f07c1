//! Decode types shared by engines, the rasterizer and placeholders

use std::io::Cursor;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use super::error::DecodeError;

/// Encoded page image format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpeg" | "jpg" => Some(Self::Jpeg),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Webp => "image/webp",
        }
    }

    fn to_image_format(self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Webp => image::ImageFormat::WebP,
        }
    }
}

/// How a page is rasterized
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub scale: f32,
    pub format: ImageFormat,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: 2.0,
            format: ImageFormat::Png,
        }
    }
}

/// One encoded page bitmap as produced by an engine
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

/// Encode an image in the requested format
pub fn encode_image(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, DecodeError> {
    let mut output = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut output), format.to_image_format())
        .map_err(|e| DecodeError::ImageError(e.to_string()))?;
    Ok(output)
}
