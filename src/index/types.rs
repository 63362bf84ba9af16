use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Path → extracted text, as handed to the search engine
pub type TextMap = BTreeMap<String, String>;

/// Image formats accepted as OCR candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Tiff,
    Bmp,
    Gif,
    Webp,
    Pnm,
}

impl ImageFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" | "jpe" => Some(ImageFormat::Jpeg),
            "tif" | "tiff" => Some(ImageFormat::Tiff),
            "bmp" => Some(ImageFormat::Bmp),
            "gif" => Some(ImageFormat::Gif),
            "webp" => Some(ImageFormat::Webp),
            "pnm" | "pbm" | "pgm" | "ppm" => Some(ImageFormat::Pnm),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Tiff => "tiff",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Gif => "gif",
            ImageFormat::Webp => "webp",
            ImageFormat::Pnm => "pnm",
        }
    }
}

/// A single OCR'd file in the index store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub text: String,
    /// Lowercase hex SHA-256 of the file contents when `text` was extracted
    pub fingerprint: String,
}

/// Progress notification emitted once per visited entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexEvent {
    /// File was new or changed and went through OCR
    Processing(PathBuf),
    /// File extension is not a supported image format
    SkippedUnsupported(PathBuf),
    /// Stored fingerprint matched, cached text reused
    SkippedUnchanged(PathBuf),
    /// Hashing or OCR failed; the file is left out of the store
    Failed { path: PathBuf, error: String },
}

impl IndexEvent {
    pub fn path(&self) -> &Path {
        match self {
            IndexEvent::Processing(p)
            | IndexEvent::SkippedUnsupported(p)
            | IndexEvent::SkippedUnchanged(p) => p,
            IndexEvent::Failed { path, .. } => path,
        }
    }
}

/// Receiver for indexing progress.
///
/// Reporters observe a pass but never influence it. `progress` may be called
/// from worker threads.
pub trait IndexReporter: Sync {
    fn event(&self, event: &IndexEvent);

    fn progress(&self, _done: usize, _total: usize) {}
}

impl<F> IndexReporter for F
where
    F: Fn(&IndexEvent) + Sync,
{
    fn event(&self, event: &IndexEvent) {
        self(event)
    }
}

/// Reporter that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl IndexReporter for NoopReporter {
    fn event(&self, _event: &IndexEvent) {}
}

/// Counts of what an indexing pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexSummary {
    pub processed: usize,
    pub reused: usize,
    pub unsupported: usize,
    pub failed: usize,
}

impl IndexSummary {
    pub fn record(&mut self, event: &IndexEvent) {
        match event {
            IndexEvent::Processing(_) => self.processed += 1,
            IndexEvent::SkippedUnsupported(_) => self.unsupported += 1,
            IndexEvent::SkippedUnchanged(_) => self.reused += 1,
            IndexEvent::Failed { .. } => self.failed += 1,
        }
    }
}

/// Cooperative cancellation flag, checked between documents
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
