//! Merging recognized cells into a page

use crate::page::Cell;

/// Combines the cells recognized on a page with the cells it already had
pub trait CellMerger: Send + Sync {
    fn merge(&self, ocr_cells: Vec<Cell>, page_cells: Vec<Cell>) -> Vec<Cell>;
}

/// Keeps programmatic text and adds only OCR cells that do not overlap it.
///
/// Merged cells are renumbered `0..n` in page order.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlapFilterMerge {
    /// Replace the page cells with the OCR result
    pub force_full_page_ocr: bool,
}

impl OverlapFilterMerge {
    pub fn new(force_full_page_ocr: bool) -> Self {
        Self { force_full_page_ocr }
    }
}

impl CellMerger for OverlapFilterMerge {
    fn merge(&self, ocr_cells: Vec<Cell>, mut page_cells: Vec<Cell>) -> Vec<Cell> {
        if self.force_full_page_ocr {
            return renumber(ocr_cells);
        }

        let recognized = ocr_cells.len();
        let kept: Vec<Cell> = ocr_cells
            .into_iter()
            .filter(|ocr| !page_cells.iter().any(|cell| cell.bbox.intersects(&ocr.bbox)))
            .collect();

        tracing::debug!(
            recognized = recognized,
            kept = kept.len(),
            existing = page_cells.len(),
            "Merged OCR cells"
        );

        page_cells.extend(kept);
        renumber(page_cells)
    }
}

fn renumber(mut cells: Vec<Cell>) -> Vec<Cell> {
    for (id, cell) in cells.iter_mut().enumerate() {
        cell.id = id;
    }
    cells
}
