//! Vision OCR
//!
//! Remote text recognition for regions of rendered document pages.
//!
//! # Modules
//!
//! - `config`: Service credentials, language hints and rate limit
//! - `error`: Error type shared by all modules
//! - `ocr`: Transport, recognizer, response mapping and the page model
//! - `page`: Pages, cells, geometry and rendering backends

pub mod config;
pub mod error;
pub mod ocr;
pub mod page;

pub use config::{RateLimitPolicy, VisionOcrOptions};
pub use error::{OcrError, Result};
pub use ocr::VisionOcrModel;
pub use page::{BoundingBox, Cell, Page};
