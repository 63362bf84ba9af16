//! Utility functions shared across the crate.
//!
//! ## Modules
//!
//! - [`app_data`] - Configuration file and index root discovery
//! - [`hash`] - Streaming SHA-256 content fingerprints
//! - [`progress`] - Progress bar shim (no-op without the `progress` feature)
//!
//! ```no_run
//! use ocidx::utils::hash_file;
//! use std::path::Path;
//!
//! let fingerprint = hash_file(Path::new("scans/receipt.png")).unwrap();
//! assert_eq!(fingerprint.len(), 64);
//! ```

pub mod app_data;
pub mod hash;
pub mod progress;

pub use app_data::*;
pub use hash::*;
