//! Page model
//!
//! Pages, their geometry and the rendering backend the OCR model draws
//! region images from.

mod backend;
mod types;

pub use backend::{ImageBackend, PageBackend};
pub use types::{BoundingBox, Cell, CoordOrigin, Page, Size};
