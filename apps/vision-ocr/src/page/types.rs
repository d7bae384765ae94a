//! Page types
//!
//! Geometry and text cells in page coordinates (points, 72 DPI).

use std::fmt;

use serde::{Deserialize, Serialize};

use super::backend::PageBackend;

/// Vertical axis convention of a bounding box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoordOrigin {
    /// `t` is the smaller y value (image / screen convention)
    #[default]
    TopLeft,
    /// `t` is the larger y value (PDF convention)
    BottomLeft,
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub l: f64,
    pub t: f64,
    pub r: f64,
    pub b: f64,
    #[serde(default)]
    pub coord_origin: CoordOrigin,
}

impl BoundingBox {
    /// Top-left origin box
    pub fn new(l: f64, t: f64, r: f64, b: f64) -> Self {
        Self {
            l,
            t,
            r,
            b,
            coord_origin: CoordOrigin::TopLeft,
        }
    }

    pub fn from_tuple(coord: (f64, f64, f64, f64), origin: CoordOrigin) -> Self {
        Self {
            l: coord.0,
            t: coord.1,
            r: coord.2,
            b: coord.3,
            coord_origin: origin,
        }
    }

    pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
        (self.l, self.t, self.r, self.b)
    }

    pub fn width(&self) -> f64 {
        self.r - self.l
    }

    pub fn height(&self) -> f64 {
        (self.b - self.t).abs()
    }

    pub fn area(&self) -> f64 {
        (self.width() * self.height()).abs()
    }

    /// Smaller and larger y value, whatever the origin
    fn y_span(&self) -> (f64, f64) {
        (self.t.min(self.b), self.t.max(self.b))
    }

    /// Area shared with `other`; both boxes must use the same origin
    pub fn intersection_area(&self, other: &BoundingBox) -> f64 {
        let (top, bottom) = self.y_span();
        let (other_top, other_bottom) = other.y_span();

        let width = self.r.min(other.r) - self.l.max(other.l);
        let height = bottom.min(other_bottom) - top.max(other_top);

        if width <= 0.0 || height <= 0.0 {
            0.0
        } else {
            width * height
        }
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.intersection_area(other) > 0.0
    }

    /// Same rectangle measured from the top of a page `page_height` tall
    pub fn to_top_left_origin(&self, page_height: f64) -> BoundingBox {
        match self.coord_origin {
            CoordOrigin::TopLeft => *self,
            CoordOrigin::BottomLeft => BoundingBox::new(
                self.l,
                page_height - self.t,
                self.r,
                page_height - self.b,
            ),
        }
    }
}

/// Page dimensions in points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Rectangle covering the whole page
    pub fn full_rect(&self) -> BoundingBox {
        BoundingBox::new(0.0, 0.0, self.width, self.height)
    }
}

/// Recognized text with its position on the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: usize,
    pub text: String,
    /// Recognition confidence (0-1)
    pub confidence: f64,
    pub bbox: BoundingBox,
}

/// A page flowing through the conversion pipeline
pub struct Page {
    /// Page number (0-indexed)
    pub page_no: usize,
    pub size: Option<Size>,
    /// Text cells, programmatic and recognized
    pub cells: Vec<Cell>,
    backend: Option<Box<dyn PageBackend>>,
}

impl Page {
    pub fn new(page_no: usize) -> Self {
        Self {
            page_no,
            size: None,
            cells: Vec::new(),
            backend: None,
        }
    }

    /// Attach a backend; the page size is taken from it when not already set
    pub fn with_backend(mut self, backend: Box<dyn PageBackend>) -> Self {
        if self.size.is_none() {
            self.size = Some(backend.page_size());
        }
        self.backend = Some(backend);
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_cells(mut self, cells: Vec<Cell>) -> Self {
        self.cells = cells;
        self
    }

    pub fn backend(&self) -> Option<&dyn PageBackend> {
        self.backend.as_deref()
    }

    /// Backend present and able to render
    pub fn has_valid_backend(&self) -> bool {
        self.backend.as_ref().is_some_and(|b| b.is_valid())
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("page_no", &self.page_no)
            .field("size", &self.size)
            .field("cells", &self.cells.len())
            .field("has_backend", &self.backend.is_some())
            .finish()
    }
}
