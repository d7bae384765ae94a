//! OCR candidate regions
//!
//! Decides which rectangles of a page get sent to the recognizer.

use crate::page::{BoundingBox, Page};

/// Selects the rectangles of a page to recognize, in processing order
pub trait RegionSelector: Send + Sync {
    fn ocr_rects(&self, page: &Page) -> Vec<BoundingBox>;
}

/// The whole page as a single region
#[derive(Debug, Clone, Copy, Default)]
pub struct FullPageRegions;

impl RegionSelector for FullPageRegions {
    fn ocr_rects(&self, page: &Page) -> Vec<BoundingBox> {
        page.size.map(|size| vec![size.full_rect()]).unwrap_or_default()
    }
}

/// Bitmap areas of the page, once they cover enough of it
#[derive(Debug, Clone, Copy)]
pub struct BitmapRegions {
    /// Minimum covered fraction of the page
    pub bitmap_area_threshold: f64,
    /// Always recognize the full page
    pub force_full_page_ocr: bool,
}

impl BitmapRegions {
    pub fn new(bitmap_area_threshold: f64, force_full_page_ocr: bool) -> Self {
        Self {
            bitmap_area_threshold,
            force_full_page_ocr,
        }
    }
}

impl Default for BitmapRegions {
    fn default() -> Self {
        Self::new(0.05, false)
    }
}

impl RegionSelector for BitmapRegions {
    fn ocr_rects(&self, page: &Page) -> Vec<BoundingBox> {
        let Some(size) = page.size else {
            return Vec::new();
        };
        let full_page = || vec![size.full_rect()];

        let bitmaps = page.backend().map(|b| b.bitmap_rects()).unwrap_or_default();
        let page_area = size.area();
        let covered: f64 = bitmaps.iter().map(BoundingBox::area).sum();
        let coverage = if page_area > 0.0 {
            covered / page_area
        } else {
            0.0
        };

        tracing::debug!(
            page_no = page.page_no,
            bitmaps = bitmaps.len(),
            coverage = coverage,
            "Bitmap coverage"
        );

        if self.force_full_page_ocr {
            full_page()
        } else if coverage > self.bitmap_area_threshold {
            bitmaps
        } else {
            Vec::new()
        }
    }
}
