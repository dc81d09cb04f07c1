//! Page rasterization with MuPDF

use image::{DynamicImage, RgbImage};
use mupdf::{Colorspace, Document, Matrix};

use crate::decode::{encode_image, DecodeError, RenderOptions, RenderedPage};

const PDF_MAGIC: &[u8] = b"%PDF";

/// Open PDF bytes, rejecting anything that is not a PDF up front
pub fn open_pdf(data: &[u8]) -> Result<Document, DecodeError> {
    if !data.starts_with(PDF_MAGIC) {
        return Err(DecodeError::InvalidDocument(
            "content is not a PDF (missing %PDF header)".to_string(),
        ));
    }

    Document::from_bytes(data, "application/pdf")
        .map_err(|e| DecodeError::InvalidDocument(e.to_string()))
}

/// Render one page (0-based) of an open document
///
/// The page and its pixmap are dropped before this returns.
pub fn render_page(
    doc: &Document,
    page_index: usize,
    options: &RenderOptions,
) -> Result<RenderedPage, DecodeError> {
    let page = doc.load_page(page_index as i32)?;

    let matrix = Matrix::new_scale(options.scale, options.scale);
    let colorspace = Colorspace::device_rgb();
    // No alpha: pages are shown on an opaque background and JPEG cannot carry one
    let pixmap = page.to_pixmap(&matrix, &colorspace, false, true)?;

    let image = pixmap_to_image(&pixmap)?;
    let data = encode_image(&image, options.format)?;

    Ok(RenderedPage {
        data,
        format: options.format,
        width: image.width(),
        height: image.height(),
    })
}

fn pixmap_to_image(pixmap: &mupdf::Pixmap) -> Result<DynamicImage, DecodeError> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let samples = pixmap.samples();
    let n = pixmap.n() as usize;

    let mut rgb_buffer = Vec::with_capacity((width * height * 3) as usize);

    for y in 0..height as usize {
        for x in 0..width as usize {
            let offset = (y * width as usize + x) * n;
            let r = samples.get(offset).copied().unwrap_or(255);
            let g = samples.get(offset + 1).copied().unwrap_or(255);
            let b = samples.get(offset + 2).copied().unwrap_or(255);
            rgb_buffer.extend_from_slice(&[r, g, b]);
        }
    }

    let img = RgbImage::from_raw(width, height, rgb_buffer)
        .ok_or_else(|| DecodeError::ImageError("Failed to create image buffer".to_string()))?;

    Ok(DynamicImage::ImageRgb8(img))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::ImageFormat;
    use crate::mupdf::test_support::minimal_pdf;

    #[test]
    fn test_open_rejects_missing_header() {
        assert!(matches!(
            open_pdf(b"PK\x03\x04zip"),
            Err(DecodeError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_render_scales_letter_page() {
        let doc = open_pdf(&minimal_pdf()).unwrap();
        let options = RenderOptions {
            scale: 1.0,
            format: ImageFormat::Jpeg,
        };

        let page = render_page(&doc, 0, &options).unwrap();
        assert_eq!((page.width, page.height), (612, 792));
        assert_eq!(page.format, ImageFormat::Jpeg);
        assert!(page.data.starts_with(&[0xFF, 0xD8]));
    }
}
