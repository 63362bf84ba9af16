//! OCR boundary.
//!
//! The indexer only sees [`OcrEngine`]; the default implementation shells out
//! to the `tesseract` command line.

pub mod tesseract;

pub use tesseract::TesseractCli;

use crate::error::Result;
use std::path::Path;

/// Text extraction from a single image file.
///
/// Implementations are shared across indexing worker threads. Output for an
/// unchanged file need not be bit-identical between calls; the indexer caches
/// the first result and never asks twice.
pub trait OcrEngine: Send + Sync {
    /// Extract UTF-8 text from the image at `path`. An image with no text
    /// yields an empty string.
    fn extract_text(&self, path: &Path) -> Result<String>;
}

impl<T: OcrEngine + ?Sized> OcrEngine for &T {
    fn extract_text(&self, path: &Path) -> Result<String> {
        (**self).extract_text(path)
    }
}

impl<T: OcrEngine + ?Sized> OcrEngine for Box<T> {
    fn extract_text(&self, path: &Path) -> Result<String> {
        (**self).extract_text(path)
    }
}
