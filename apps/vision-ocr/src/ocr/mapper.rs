//! Maps recognized blocks from region image pixels back to page coordinates

use super::types::{Block, TextAnnotation};
use crate::error::{OcrError, Result};
use crate::page::{BoundingBox, Cell, CoordOrigin};

/// The service reports no per-block confidence
pub const OCR_CELL_CONFIDENCE: f64 = 1.0;

/// Convert the blocks recognized in `rect` (rendered at `scale`) into cells.
///
/// Ids start at `first_id` and follow block order, so callers can keep them
/// unique across all regions of a page. `rect` must have a top-left origin;
/// see [`BoundingBox::to_top_left_origin`].
pub fn map_text_annotation(
    annotation: &TextAnnotation,
    rect: &BoundingBox,
    scale: f64,
    first_id: usize,
) -> Result<Vec<Cell>> {
    if rect.coord_origin != CoordOrigin::TopLeft {
        return Err(OcrError::Region(format!(
            "region {:?} is not top-left based",
            rect.as_tuple()
        )));
    }

    annotation
        .blocks
        .iter()
        .enumerate()
        .map(|(ix, block)| {
            let bbox = block_page_bbox(block, rect, scale).ok_or_else(|| {
                OcrError::MalformedResponse(format!("block {} has no bounding vertices", ix))
            })?;

            Ok(Cell {
                id: first_id + ix,
                text: block.text(),
                confidence: OCR_CELL_CONFIDENCE,
                bbox,
            })
        })
        .collect()
}

/// Page space box of a block, `None` without vertices.
///
/// Takes the extent of all vertices instead of trusting corner positions.
fn block_page_bbox(block: &Block, rect: &BoundingBox, scale: f64) -> Option<BoundingBox> {
    let vertices = &block.bounding_box.vertices;
    let first = vertices.first()?;

    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for v in &vertices[1..] {
        min_x = min_x.min(v.x);
        min_y = min_y.min(v.y);
        max_x = max_x.max(v.x);
        max_y = max_y.max(v.y);
    }

    Some(BoundingBox::from_tuple(
        (
            to_page(min_x, scale, rect.l),
            to_page(min_y, scale, rect.t),
            to_page(max_x, scale, rect.l),
            to_page(max_y, scale, rect.t),
        ),
        CoordOrigin::TopLeft,
    ))
}

#[inline]
fn to_page(image_coord: i64, scale: f64, offset: f64) -> f64 {
    image_coord as f64 / scale + offset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::types::{Line, Polygon, Vertex};

    fn block(lines: &[&str], vertices: &[(i64, i64)]) -> Block {
        Block {
            bounding_box: Polygon {
                vertices: vertices.iter().map(|&(x, y)| Vertex { x, y }).collect(),
            },
            lines: lines
                .iter()
                .map(|t| Line {
                    text: t.to_string(),
                })
                .collect(),
        }
    }

    fn quad(x0: i64, y0: i64, x1: i64, y1: i64) -> Vec<(i64, i64)> {
        vec![(x0, y0), (x0, y1), (x1, y1), (x1, y0)]
    }

    #[test]
    fn test_coordinate_transform() {
        let annotation = TextAnnotation {
            blocks: vec![block(&["x"], &quad(300, 150, 600, 300))],
        };
        let rect = BoundingBox::new(100.0, 50.0, 400.0, 250.0);

        let cells = map_text_annotation(&annotation, &rect, 3.0, 0).unwrap();

        assert_eq!(cells[0].bbox.l, 200.0);
        assert_eq!(cells[0].bbox.t, 100.0);
        assert_eq!(cells[0].bbox.r, 300.0);
        assert_eq!(cells[0].bbox.b, 150.0);
        assert_eq!(cells[0].bbox.coord_origin, CoordOrigin::TopLeft);
    }

    #[test]
    fn test_lines_joined_and_fixed_confidence() {
        let annotation = TextAnnotation {
            blocks: vec![block(&["Hello", "World"], &quad(0, 0, 30, 15))],
        };
        let rect = BoundingBox::new(10.0, 10.0, 110.0, 60.0);

        let cells = map_text_annotation(&annotation, &rect, 3.0, 0).unwrap();

        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].text, "Hello\nWorld");
        assert_eq!(cells[0].confidence, 1.0);
        assert_eq!(cells[0].bbox.as_tuple(), (10.0, 10.0, 20.0, 15.0));
    }

    #[test]
    fn test_one_cell_per_block_in_order() {
        let annotation = TextAnnotation {
            blocks: vec![
                block(&["first"], &quad(0, 0, 30, 30)),
                block(&["second"], &quad(0, 30, 30, 60)),
                block(&[], &quad(0, 60, 30, 90)),
            ],
        };
        let rect = BoundingBox::new(0.0, 0.0, 10.0, 30.0);

        let cells = map_text_annotation(&annotation, &rect, 3.0, 7).unwrap();

        assert_eq!(cells.len(), 3);
        assert_eq!(cells.iter().map(|c| c.id).collect::<Vec<_>>(), vec![7, 8, 9]);
        assert_eq!(cells[1].text, "second");
        assert_eq!(cells[2].text, "");
    }

    #[test]
    fn test_vertex_order_independent() {
        // counter-clockwise starting bottom-right
        let annotation = TextAnnotation {
            blocks: vec![block(&["rotated"], &[(30, 15), (30, 0), (0, 0), (0, 15)])],
        };
        let rect = BoundingBox::new(10.0, 10.0, 110.0, 60.0);

        let cells = map_text_annotation(&annotation, &rect, 3.0, 0).unwrap();
        assert_eq!(cells[0].bbox.as_tuple(), (10.0, 10.0, 20.0, 15.0));
    }

    #[test]
    fn test_cell_stays_inside_region() {
        let rect = BoundingBox::new(50.0, 20.0, 150.0, 70.0);
        let annotation = TextAnnotation {
            blocks: vec![block(&["edge"], &quad(0, 0, 300, 150))],
        };

        let cells = map_text_annotation(&annotation, &rect, 3.0, 0).unwrap();
        let bbox = cells[0].bbox;
        assert!(bbox.l >= rect.l && bbox.r <= rect.r);
        assert!(bbox.t >= rect.t && bbox.b <= rect.b);
    }

    #[test]
    fn test_block_without_vertices() {
        let annotation = TextAnnotation {
            blocks: vec![block(&["lost"], &[])],
        };
        let rect = BoundingBox::new(0.0, 0.0, 10.0, 10.0);

        let result = map_text_annotation(&annotation, &rect, 3.0, 0);
        assert!(matches!(result, Err(OcrError::MalformedResponse(_))));
    }

    #[test]
    fn test_bottom_left_region_rejected() {
        let annotation = TextAnnotation {
            blocks: vec![block(&["x"], &quad(0, 0, 30, 15))],
        };
        let rect = BoundingBox::from_tuple((10.0, 60.0, 110.0, 10.0), CoordOrigin::BottomLeft);

        let result = map_text_annotation(&annotation, &rect, 3.0, 0);
        assert!(matches!(result, Err(OcrError::Region(_))));
    }

    #[test]
    fn test_empty_annotation() {
        let rect = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let cells = map_text_annotation(&TextAnnotation::default(), &rect, 3.0, 0).unwrap();
        assert!(cells.is_empty());
    }
}
