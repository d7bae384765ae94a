//! OCR error types
//!
//! Every failure that aborts processing of a page. Skipped pages and skipped
//! regions are not errors and never show up here.

use thiserror::Error;

/// OCR error type
#[derive(Debug, Error)]
pub enum OcrError {
    /// The service replied with an explicit `error` payload
    #[error("Vision OCR service error: {0}")]
    RemoteService(String),

    /// Network, TLS or timeout failure from the HTTP client
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status without a service error payload
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Reply body is not valid JSON
    #[error("Invalid JSON reply: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Reply is JSON but does not have the expected shape
    #[error("Malformed reply: {0}")]
    MalformedResponse(String),

    /// Failed to decode or encode an image
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Page backend failed to rasterize a region
    #[error("Render error: {0}")]
    Render(String),

    /// OCR region in a coordinate system the mapper cannot use
    #[error("Invalid region: {0}")]
    Region(String),

    /// Invalid options
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for OCR operations
pub type Result<T> = std::result::Result<T, OcrError>;
