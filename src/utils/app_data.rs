use crate::index::store::store_path;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "ocidx";
const CONFIG_FILE: &str = "config.json";

/// Application configuration stored in the app data directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// OCR executable (tesseract-compatible command line)
    #[serde(default = "default_ocr_command")]
    pub ocr_command: String,

    /// Language passed to the OCR engine with `-l`
    #[serde(default = "default_ocr_language")]
    pub ocr_language: String,

    /// Extra arguments appended to every OCR invocation
    #[serde(default)]
    pub ocr_args: Vec<String>,

    /// Edit distance used when a search does not specify one
    #[serde(default = "default_max_distance")]
    pub default_max_distance: usize,

    /// Worker threads for hashing and OCR. 0 means use the number of CPU cores
    #[serde(default)]
    pub index_threads: usize,

    /// Files processed per chunk; progress events are flushed after each chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Number of recent results kept by the interactive session
    #[serde(default = "default_search_cache_size")]
    pub search_cache_size: usize,
}

fn default_ocr_command() -> String {
    "tesseract".to_string()
}

fn default_ocr_language() -> String {
    "eng".to_string()
}

fn default_max_distance() -> usize {
    1
}

fn default_chunk_size() -> usize {
    64
}

fn default_search_cache_size() -> usize {
    64
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ocr_command: default_ocr_command(),
            ocr_language: default_ocr_language(),
            ocr_args: Vec::new(),
            default_max_distance: default_max_distance(),
            index_threads: 0,
            chunk_size: default_chunk_size(),
            search_cache_size: default_search_cache_size(),
        }
    }
}

impl AppConfig {
    /// Load config from the app data directory, or return default if not found
    pub fn load() -> Result<Self> {
        match get_config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load config from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: AppConfig =
            serde_json::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Get the effective worker thread count (resolves 0 to CPU count)
    pub fn effective_index_threads(&self) -> usize {
        if self.index_threads == 0 {
            num_cpus()
        } else {
            self.index_threads
        }
    }
}

/// Get the number of CPUs available
fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Get the path to the config file
pub fn get_config_path() -> Option<PathBuf> {
    get_app_data_dir().map(|dir| dir.join(CONFIG_FILE))
}

/// Get the application data directory (not created here)
pub fn get_app_data_dir() -> Option<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir().map(|h| h.join("Library").join("Application Support"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
    } else {
        // Linux/Unix: use XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    base.map(|b| b.join(APP_NAME))
}

/// Find the indexed root for a path.
///
/// Walks up from `start_path` looking for a directory that holds an index
/// store. Falls back to `start_path` itself when no ancestor is indexed.
pub fn find_index_root(start_path: &Path) -> Result<PathBuf> {
    let start = start_path
        .canonicalize()
        .with_context(|| format!("Invalid path: {}", start_path.display()))?;

    let mut current = Some(start.as_path());
    while let Some(dir) = current {
        if is_indexed(dir) {
            return Ok(dir.to_path_buf());
        }
        current = dir.parent();
    }

    Ok(start)
}

/// Check if a directory has an index store
pub fn is_indexed(root_path: &Path) -> bool {
    store_path(root_path).is_file()
}
