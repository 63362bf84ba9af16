//! On-disk index store.
//!
//! One JSON file per indexed root, at a reserved name directly under the root.
//! Writes go to a temp file that is renamed over the store, so a crashed or
//! cancelled pass always leaves the previous store intact.

use crate::error::{Error, Result};
use crate::index::types::{IndexedDocument, TextMap};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Store file name, reserved under every indexed root
pub const STORE_FILE_NAME: &str = ".ocrindex.json";

/// Prefix shared by every file the store owns (store, temp file, lock file)
pub const RESERVED_PREFIX: &str = ".ocrindex";

const TEMP_FILE_NAME: &str = ".ocrindex.json.tmp";
const LOCK_FILE_NAME: &str = ".ocrindex.lock";

/// Current store format version
pub const STORE_VERSION: u32 = 1;

/// Location of the store for `root`
pub fn store_path(root: &Path) -> PathBuf {
    root.join(STORE_FILE_NAME)
}

/// True for file names the store reserves; these are never indexed
pub fn is_reserved_name(name: &str) -> bool {
    name.starts_with(RESERVED_PREFIX)
}

/// Persisted mapping from canonical absolute path to OCR result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStore {
    pub version: u32,
    pub documents: BTreeMap<String, IndexedDocument>,
}

impl Default for IndexStore {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            documents: BTreeMap::new(),
        }
    }
}

impl IndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&IndexedDocument> {
        self.documents.get(path)
    }

    pub fn insert(&mut self, path: String, document: IndexedDocument) {
        self.documents.insert(path, document);
    }

    /// Derive the path → text view used by the search engine
    pub fn text_map(&self) -> TextMap {
        self.documents
            .iter()
            .map(|(path, doc)| (path.clone(), doc.text.clone()))
            .collect()
    }

    /// Serialize to the on-disk representation
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Parse the on-disk representation. `path` is only used for error reporting.
    pub fn from_bytes(bytes: &[u8], path: &Path) -> Result<Self> {
        let store: IndexStore =
            serde_json::from_slice(bytes).map_err(|e| Error::StoreCorrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        if store.version != STORE_VERSION {
            return Err(Error::StoreCorrupt {
                path: path.to_path_buf(),
                reason: format!(
                    "unsupported store version {} (expected {})",
                    store.version, STORE_VERSION
                ),
            });
        }

        Ok(store)
    }

    /// Load the store for `root`. `Ok(None)` when no store exists yet.
    pub fn load(root: &Path) -> Result<Option<Self>> {
        let path = store_path(root);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::StoreCorrupt {
                    path,
                    reason: e.to_string(),
                });
            }
        };

        let store = Self::from_bytes(&bytes, &path)?;
        debug!(path = %path.display(), documents = store.len(), "loaded index store");
        Ok(Some(store))
    }

    /// Load the store for `root`, or an empty one if none exists
    pub fn load_or_default(root: &Path) -> Result<Self> {
        Ok(Self::load(root)?.unwrap_or_default())
    }

    /// Atomically replace the store for `root` with `self`
    pub fn save(&self, root: &Path) -> Result<()> {
        let path = store_path(root);
        let temp_path = root.join(TEMP_FILE_NAME);

        let bytes = self.to_bytes()?;
        let write_temp = || -> std::io::Result<()> {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            writer.write_all(&bytes)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
            Ok(())
        };

        if let Err(e) = write_temp() {
            let _ = fs::remove_file(&temp_path);
            return Err(Error::io(&temp_path, e));
        }

        fs::rename(&temp_path, &path).map_err(|e| Error::io(&path, e))?;
        debug!(path = %path.display(), documents = self.len(), "saved index store");
        Ok(())
    }
}

/// Remove the store and its companion files for `root`.
///
/// Returns whether a store existed.
pub fn remove_store(root: &Path) -> Result<bool> {
    let path = store_path(root);
    let existed = path.exists();

    for name in [STORE_FILE_NAME, TEMP_FILE_NAME, LOCK_FILE_NAME] {
        let file = root.join(name);
        match fs::remove_file(&file) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::io(&file, e)),
        }
    }

    Ok(existed)
}

/// Advisory exclusive lock held for the duration of an indexing pass.
///
/// Released when dropped.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Take the lock for `root`, failing immediately if another pass holds it
    pub fn acquire(root: &Path) -> Result<Self> {
        let path = root.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| Error::io(&path, e))?;

        if file.try_lock_exclusive().is_err() {
            return Err(Error::StoreLocked { path });
        }

        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
