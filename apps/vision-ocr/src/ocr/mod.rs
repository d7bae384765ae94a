//! OCR Module
//!
//! Recognizes text in regions of rendered pages through the Yandex Cloud
//! Vision OCR service and maps the result back to page coordinates.
//!
//! Per page:
//! - a [`RegionSelector`] picks the rectangles to recognize
//! - the page backend renders each rectangle at [`OCR_SCALE`]
//! - a [`TextRecognizer`] sends the image through a rate limited transport
//! - the reply blocks are mapped to page-space [`Cell`](crate::page::Cell)s
//! - a [`CellMerger`] folds them into the page's existing cells
//!
//! ## Usage
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use vision_ocr::config::VisionOcrOptions;
//! use vision_ocr::ocr::VisionOcrModel;
//!
//! let options = VisionOcrOptions::from_env()?;
//! let model = VisionOcrModel::from_options(true, &options)?;
//!
//! let mut pages = Box::pin(model.process(futures::stream::iter(pages)));
//! while let Some(page) = pages.next().await {
//!     let page = page?;
//!     println!("page {} has {} cells", page.page_no, page.cells.len());
//! }
//! ```

mod mapper;
mod merge;
mod provider;
mod regions;
mod service;
mod transport;
mod types;

pub use mapper::{map_text_annotation, OCR_CELL_CONFIDENCE};
pub use merge::{CellMerger, OverlapFilterMerge};
pub use provider::{TextRecognizer, VisionRecognizer};
pub use regions::{BitmapRegions, FullPageRegions, RegionSelector};
pub use service::{VisionOcrModel, OCR_SCALE};
pub use transport::{
    HttpTransport, RateLimitedTransport, ReqwestTransport, Throttle, TransportResponse,
};
pub use types::{
    Block, Line, Polygon, RecognizeRequest, RecognizeResponse, RecognizeResult, ServiceError,
    TextAnnotation, Vertex, IMAGE_MIME_TYPE,
};
