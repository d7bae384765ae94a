//! OCR Service
//!
//! Runs remote recognition over a stream of pages and merges the recognized
//! cells back into each page.

use futures::{Stream, StreamExt, TryStreamExt};

use super::mapper::map_text_annotation;
use super::merge::{CellMerger, OverlapFilterMerge};
use super::provider::{TextRecognizer, VisionRecognizer};
use super::regions::{BitmapRegions, RegionSelector};
use crate::config::VisionOcrOptions;
use crate::error::Result;
use crate::page::{BoundingBox, Cell, Page};

/// Rasterization scale for OCR regions: 72 DPI * 3 == 216 DPI
pub const OCR_SCALE: f64 = 3.0;

/// Page OCR model backed by a remote recognizer
pub struct VisionOcrModel<R = VisionRecognizer, S = BitmapRegions, M = OverlapFilterMerge> {
    enabled: bool,
    scale: f64,
    recognizer: R,
    regions: S,
    merger: M,
}

impl VisionOcrModel {
    /// Model talking to the Vision service with the default region selection
    /// and merge policy
    pub fn from_options(enabled: bool, options: &VisionOcrOptions) -> Result<Self> {
        Ok(Self::new(
            enabled,
            VisionRecognizer::from_options(options)?,
            BitmapRegions::new(options.bitmap_area_threshold, options.force_full_page_ocr),
            OverlapFilterMerge::new(options.force_full_page_ocr),
        ))
    }
}

impl<R, S, M> VisionOcrModel<R, S, M>
where
    R: TextRecognizer,
    S: RegionSelector,
    M: CellMerger,
{
    pub fn new(enabled: bool, recognizer: R, regions: S, merger: M) -> Self {
        Self {
            enabled,
            scale: OCR_SCALE,
            recognizer,
            regions,
            merger,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn merger(&self) -> &M {
        &self.merger
    }

    /// OCR a stream of pages.
    ///
    /// Pages come out in input order, one per input page. A page is only
    /// pulled from `pages` once the previous one has been fully processed.
    pub fn process<'a, I>(&'a self, pages: I) -> impl Stream<Item = Result<Page>> + 'a
    where
        I: Stream<Item = Page> + 'a,
    {
        pages.then(move |page| self.process_page(page))
    }

    /// OCR a batch of pages, stopping at the first failure
    pub async fn process_batch(&self, pages: Vec<Page>) -> Result<Vec<Page>> {
        self.process(futures::stream::iter(pages))
            .try_collect()
            .await
    }

    /// OCR a single page.
    ///
    /// Disabled models and pages without a usable backend pass through
    /// untouched. Any failure aborts the page before cells are merged.
    #[tracing::instrument(skip(self, page), fields(page_no = page.page_no))]
    pub async fn process_page(&self, mut page: Page) -> Result<Page> {
        if !self.enabled {
            return Ok(page);
        }

        if !page.has_valid_backend() {
            tracing::debug!("Page has no valid backend, skipping OCR");
            return Ok(page);
        }

        let rects = self.regions.ocr_rects(&page);
        let ocr_cells = self.recognize_regions(&page, &rects).await?;

        tracing::info!(
            regions = rects.len(),
            cells = ocr_cells.len(),
            "OCR finished for page"
        );

        let page_cells = std::mem::take(&mut page.cells);
        page.cells = self.merger.merge(ocr_cells, page_cells);

        Ok(page)
    }

    async fn recognize_regions(&self, page: &Page, rects: &[BoundingBox]) -> Result<Vec<Cell>> {
        let mut ocr_cells = Vec::new();
        let Some(backend) = page.backend() else {
            return Ok(ocr_cells);
        };
        let page_height = page.size.unwrap_or_else(|| backend.page_size()).height;

        for rect in rects {
            let rect = &rect.to_top_left_origin(page_height);
            if rect.area() == 0.0 {
                tracing::debug!(rect = ?rect.as_tuple(), "Skipping zero area region");
                continue;
            }

            let image = backend.page_image(self.scale, rect)?;
            let annotation = self.recognizer.recognize(&image).await?;
            let cells = map_text_annotation(&annotation, rect, self.scale, ocr_cells.len())?;

            tracing::debug!(
                rect = ?rect.as_tuple(),
                blocks = annotation.blocks.len(),
                "Recognized region"
            );

            ocr_cells.extend(cells);
        }

        Ok(ocr_cells)
    }
}
