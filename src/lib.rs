//! # ocidx - OCR text index and fuzzy search for image folders
//!
//! ocidx walks a directory of scanned images, extracts their text with an
//! OCR engine, and keeps the results in a JSON store at the directory root.
//! Later passes only re-OCR files whose content hash changed. Searches run
//! approximate (Levenshtein-bounded) substring matching over the stored text.
//!
//! ## Architecture
//!
//! - [`index`] - Store format, indexing passes, statistics
//! - [`ocr`] - The OCR engine boundary and the `tesseract` adapter
//! - [`query`] - Fuzzy matching, multi-term search, line parsing
//! - [`session`] - Interactive line-oriented search
//! - [`output`] - Result formatting (ripgrep-like)
//! - [`utils`] - Content hashing, configuration, progress bars
//!
//! ## Quick Start
//!
//! ```ignore
//! use ocidx::index::{Indexer, NoopReporter};
//! use ocidx::ocr::TesseractCli;
//! use ocidx::query::{search, SearchQuery};
//! use std::path::Path;
//!
//! let indexer = Indexer::new(TesseractCli::default());
//! let outcome = indexer.index_directory(Path::new("/scans"), &NoopReporter)?;
//!
//! let query = SearchQuery::new(["invoice", "total"], 1)?;
//! for (path, terms) in &search(&outcome.text_map, &query).documents {
//!     println!("{}: {} terms matched", path, terms.len());
//! }
//! ```

pub mod error;
pub mod index;
pub mod ocr;
pub mod output;
pub mod query;
pub mod session;
pub mod utils;

pub use error::{Error, Result};
