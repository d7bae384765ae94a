//! Page rendering backends
//!
//! The OCR model only needs a backend to tell whether it can render and to
//! rasterize a rectangle of the page at a given scale.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};

use super::types::{BoundingBox, Size};
use crate::error::{OcrError, Result};

/// Page renderer
pub trait PageBackend: Send + Sync {
    /// Whether the backend loaded its page and can render it
    fn is_valid(&self) -> bool;

    /// Page dimensions in points
    fn page_size(&self) -> Size;

    /// Render the page at `scale` (1.0 == 72 DPI) cropped to `cropbox`
    fn page_image(&self, scale: f64, cropbox: &BoundingBox) -> Result<DynamicImage>;

    /// Rectangles of the page covered by bitmap images
    fn bitmap_rects(&self) -> Vec<BoundingBox> {
        Vec::new()
    }
}

/// Backend over an already rasterized page, one pixel per point.
///
/// Rendered regions always span exactly the requested box: the part of the
/// box outside the raster is filled with white.
pub struct ImageBackend {
    image: DynamicImage,
}

impl ImageBackend {
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Decode an image file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(image::open(path)?))
    }
}

impl PageBackend for ImageBackend {
    fn is_valid(&self) -> bool {
        self.image.width() > 0 && self.image.height() > 0
    }

    fn page_size(&self) -> Size {
        Size::new(self.image.width() as f64, self.image.height() as f64)
    }

    fn page_image(&self, scale: f64, cropbox: &BoundingBox) -> Result<DynamicImage> {
        let (width, height) = self.image.dimensions();
        let (left, top) = (cropbox.l, cropbox.t.min(cropbox.b));

        // Raster pixels touched by the box
        let x0 = left.floor().clamp(0.0, width as f64) as u32;
        let y0 = top.floor().clamp(0.0, height as f64) as u32;
        let x1 = cropbox.r.ceil().clamp(0.0, width as f64) as u32;
        let y1 = cropbox.t.max(cropbox.b).ceil().clamp(0.0, height as f64) as u32;

        if x1 <= x0 || y1 <= y0 {
            return Err(OcrError::Render(format!(
                "crop box {:?} lies outside the {}x{} page",
                cropbox.as_tuple(),
                width,
                height
            )));
        }

        let scaled_width = ((x1 - x0) as f64 * scale).round().max(1.0) as u32;
        let scaled_height = ((y1 - y0) as f64 * scale).round().max(1.0) as u32;
        let region = self
            .image
            .crop_imm(x0, y0, x1 - x0, y1 - y0)
            .resize_exact(scaled_width, scaled_height, FilterType::Triangle)
            .to_rgba8();

        // Image pixel (0, 0) is the box's top-left corner
        let canvas_width = (cropbox.width() * scale).round().max(1.0) as u32;
        let canvas_height = (cropbox.height() * scale).round().max(1.0) as u32;
        let mut canvas =
            RgbaImage::from_pixel(canvas_width, canvas_height, Rgba([255, 255, 255, 255]));
        imageops::overlay(
            &mut canvas,
            &region,
            ((x0 as f64 - left) * scale).round() as i64,
            ((y0 as f64 - top) * scale).round() as i64,
        );

        Ok(DynamicImage::ImageRgba8(canvas))
    }

    /// The whole page is one bitmap
    fn bitmap_rects(&self) -> Vec<BoundingBox> {
        vec![self.page_size().full_rect()]
    }
}
