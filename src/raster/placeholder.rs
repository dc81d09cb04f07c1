//! Placeholder pages for pages that fail to render

use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Point, Size},
    mono_font::{ascii::FONT_10X20, MonoTextStyle},
    pixelcolor::{Rgb888, RgbColor},
    primitives::{Primitive, PrimitiveStyle, Rectangle},
    text::{Alignment, Text},
    Drawable, Pixel,
};
use image::{DynamicImage, Rgb, RgbImage};

use crate::decode::{encode_image, DecodeError, RenderOptions, RenderedPage};

/// US Letter in PDF points
pub const PLACEHOLDER_PAGE_WIDTH: f32 = 612.0;
pub const PLACEHOLDER_PAGE_HEIGHT: f32 = 792.0;

const BACKGROUND: Rgb888 = Rgb888::new(0xF3, 0xF4, 0xF6);
const BORDER: Rgb888 = Rgb888::new(0xD1, 0xD5, 0xDB);
const LABEL: Rgb888 = Rgb888::new(0x6B, 0x72, 0x80);

struct Canvas {
    image: RgbImage,
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let w = self.image.width() as i32;
        let h = self.image.height() as i32;
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 || point.x >= w || point.y >= h {
                continue;
            }
            self.image.put_pixel(
                point.x as u32,
                point.y as u32,
                Rgb([color.r(), color.g(), color.b()]),
            );
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        for pixel in self.image.pixels_mut() {
            *pixel = Rgb([color.r(), color.g(), color.b()]);
        }
        Ok(())
    }
}

/// Draw a "Page N / Failed to load" page at the render scale
pub fn render_placeholder(
    page_number: usize,
    options: &RenderOptions,
) -> Result<RenderedPage, DecodeError> {
    let width = (PLACEHOLDER_PAGE_WIDTH * options.scale).round().max(1.0) as u32;
    let height = (PLACEHOLDER_PAGE_HEIGHT * options.scale).round().max(1.0) as u32;

    let mut canvas = Canvas {
        image: RgbImage::new(width, height),
    };
    draw(&mut canvas, page_number).unwrap_or_else(|never| match never {});

    let image = DynamicImage::ImageRgb8(canvas.image);
    let data = encode_image(&image, options.format)?;

    Ok(RenderedPage {
        data,
        format: options.format,
        width,
        height,
    })
}

fn draw<D>(target: &mut D, page_number: usize) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888> + OriginDimensions,
{
    let size = target.size();
    target.clear(BACKGROUND)?;

    let inset = (size.width.min(size.height) / 40).max(1);
    let stroke = (inset / 4).max(1);
    Rectangle::new(
        Point::new(inset as i32, inset as i32),
        Size::new(
            size.width.saturating_sub(inset * 2),
            size.height.saturating_sub(inset * 2),
        ),
    )
    .into_styled(PrimitiveStyle::with_stroke(BORDER, stroke))
    .draw(target)?;

    let style = MonoTextStyle::new(&FONT_10X20, LABEL);
    let center_x = (size.width / 2) as i32;
    let center_y = (size.height / 2) as i32;

    Text::with_alignment(
        &format!("Page {}", page_number),
        Point::new(center_x, center_y - 14),
        style,
        Alignment::Center,
    )
    .draw(target)?;
    Text::with_alignment(
        "Failed to load",
        Point::new(center_x, center_y + 14),
        style,
        Alignment::Center,
    )
    .draw(target)?;

    Ok(())
}
