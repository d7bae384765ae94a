//! Vision OCR command line
//!
//! Treats every input image as a page, recognizes it through the Vision OCR
//! service and prints the resulting cells as JSON lines.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vision_ocr::page::{Cell, ImageBackend, Page};
use vision_ocr::{VisionOcrModel, VisionOcrOptions};

#[derive(Parser, Debug)]
#[command(name = "vision-ocr", version, about = "Recognize text in page images")]
struct Args {
    /// Page images, one page each
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Language hints, overrides VISION_OCR_LANG
    #[arg(long, value_delimiter = ',')]
    lang: Vec<String>,

    /// Recognize whole pages and drop existing cells
    #[arg(long, default_value_t = false)]
    force_full_page: bool,

    /// Pass pages through without calling the service
    #[arg(long, default_value_t = false)]
    disabled: bool,
}

#[derive(Serialize)]
struct PageOutput<'a> {
    page_no: usize,
    source: &'a str,
    cells: &'a [Cell],
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vision_ocr=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();

    let args = Args::parse();
    let enabled = !args.disabled;

    let mut options = if enabled {
        VisionOcrOptions::from_env()
            .context("VISION_OCR_IAM_TOKEN and VISION_OCR_FOLDER_ID must be set")?
    } else {
        VisionOcrOptions::from_env().unwrap_or_else(|e| {
            tracing::warn!("Failed to load options from env: {}, using defaults", e);
            VisionOcrOptions::default()
        })
    };
    if !args.lang.is_empty() {
        options.lang = args.lang.clone();
    }
    options.force_full_page_ocr |= args.force_full_page;

    tracing::info!("Starting Vision OCR v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Endpoint: {}", options.endpoint);
    tracing::info!("Languages: {}", options.lang.join(","));

    let pages = args
        .images
        .iter()
        .enumerate()
        .map(|(page_no, path)| {
            let backend = ImageBackend::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            Ok(Page::new(page_no).with_backend(Box::new(backend)))
        })
        .collect::<Result<Vec<_>>>()?;

    let model = VisionOcrModel::from_options(enabled, &options)?;
    let mut results = Box::pin(model.process(futures::stream::iter(pages)));

    while let Some(page) = results.next().await {
        let page = page?;
        let source = args.images[page.page_no].to_string_lossy();
        let output = PageOutput {
            page_no: page.page_no,
            source: &source,
            cells: &page.cells,
        };
        println!("{}", serde_json::to_string(&output)?);
    }

    tracing::info!("Processed {} pages", args.images.len());
    Ok(())
}
