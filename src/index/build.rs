use crate::error::{Error, Result};
use crate::index::store::{IndexStore, StoreLock, is_reserved_name};
use crate::index::types::{
    CancellationToken, ImageFormat, IndexEvent, IndexReporter, IndexSummary, IndexedDocument,
    TextMap,
};
use crate::ocr::OcrEngine;
use crate::utils::hash_file;
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// Tuning for an indexing pass
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Worker threads for hashing and OCR (1 = sequential)
    pub threads: usize,
    /// Candidates processed per chunk; events are flushed after each chunk
    pub chunk_size: usize,
    /// Checked before each document
    pub cancel: Option<CancellationToken>,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            threads: 1,
            chunk_size: 64,
            cancel: None,
        }
    }
}

/// Result of a completed indexing pass
#[derive(Debug, Clone)]
pub struct IndexOutcome {
    pub store: IndexStore,
    pub text_map: TextMap,
    pub summary: IndexSummary,
}

/// A visited filesystem entry, classified
enum Entry {
    Unsupported(PathBuf),
    Candidate(PathBuf),
}

/// Outcome for a single entry (computed in parallel)
enum FileOutcome {
    Unsupported(PathBuf),
    Reused(PathBuf, IndexedDocument),
    Processed(PathBuf, IndexedDocument),
    Failed(PathBuf, Error),
    Cancelled,
}

/// Builds and refreshes index stores with a given OCR engine
pub struct Indexer<E> {
    engine: E,
    options: IndexOptions,
}

impl<E: OcrEngine> Indexer<E> {
    pub fn new(engine: E) -> Self {
        Self::with_options(engine, IndexOptions::default())
    }

    pub fn with_options(engine: E, options: IndexOptions) -> Self {
        Self { engine, options }
    }

    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    /// Index `root_path`: load its store, refresh it, persist it.
    ///
    /// Holds the store lock for the whole pass. Pass-level failures (bad root,
    /// corrupt store, lock contention, cancellation) abort without touching the
    /// previous store. Per-file failures are reported and the file is skipped.
    pub fn index_directory(
        &self,
        root_path: &Path,
        reporter: &dyn IndexReporter,
    ) -> Result<IndexOutcome> {
        let root = resolve_root(root_path)?;
        let _lock = StoreLock::acquire(&root)?;

        let previous = IndexStore::load_or_default(&root)?;
        info!(root = %root.display(), cached = previous.len(), "indexing");

        let (store, summary) = self.update_store(&root, &previous, reporter)?;
        store.save(&root)?;

        info!(
            root = %root.display(),
            processed = summary.processed,
            reused = summary.reused,
            unsupported = summary.unsupported,
            failed = summary.failed,
            "index saved"
        );

        let text_map = store.text_map();
        Ok(IndexOutcome {
            store,
            text_map,
            summary,
        })
    }

    /// Compute the refreshed store for `root_path` against `previous`.
    ///
    /// No store I/O happens here. Only files visited in this pass end up in the
    /// returned store.
    pub fn update_store(
        &self,
        root_path: &Path,
        previous: &IndexStore,
        reporter: &dyn IndexReporter,
    ) -> Result<(IndexStore, IndexSummary)> {
        let root = resolve_root(root_path)?;
        let entries = collect_entries(&root);

        let total = entries
            .iter()
            .filter(|e| matches!(e, Entry::Candidate(_)))
            .count();
        let done = AtomicUsize::new(0);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.threads.max(1))
            .build()
            .map_err(|e| Error::InvalidArgument(format!("thread pool: {}", e)))?;

        let mut store = IndexStore::new();
        let mut summary = IndexSummary::default();

        for chunk in entries.chunks(self.options.chunk_size.max(1)) {
            // Process chunk files in parallel; collect keeps walk order
            let outcomes: Vec<FileOutcome> = pool.install(|| {
                chunk
                    .par_iter()
                    .map(|entry| match entry {
                        Entry::Unsupported(path) => FileOutcome::Unsupported(path.clone()),
                        Entry::Candidate(path) => {
                            let outcome = self.process_candidate(path.clone(), previous);
                            let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                            reporter.progress(n, total);
                            outcome
                        }
                    })
                    .collect()
            });

            for outcome in outcomes {
                let event = match outcome {
                    FileOutcome::Unsupported(path) => {
                        debug!(path = %path.display(), "skipping unsupported");
                        IndexEvent::SkippedUnsupported(path)
                    }
                    FileOutcome::Reused(path, doc) => {
                        store.insert(path_key(&path), doc);
                        IndexEvent::SkippedUnchanged(path)
                    }
                    FileOutcome::Processed(path, doc) => {
                        store.insert(path_key(&path), doc);
                        IndexEvent::Processing(path)
                    }
                    FileOutcome::Failed(path, error) => {
                        warn!(path = %path.display(), error = %error, "skipping file");
                        IndexEvent::Failed {
                            path,
                            error: error.to_string(),
                        }
                    }
                    FileOutcome::Cancelled => return Err(Error::Cancelled),
                };
                summary.record(&event);
                reporter.event(&event);
            }
        }

        Ok((store, summary))
    }

    /// Decide reuse vs. OCR for one candidate
    fn process_candidate(&self, path: PathBuf, previous: &IndexStore) -> FileOutcome {
        if self
            .options
            .cancel
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
        {
            return FileOutcome::Cancelled;
        }

        let fingerprint = match hash_file(&path) {
            Ok(f) => f,
            Err(e) => return FileOutcome::Failed(path, e),
        };

        if let Some(cached) = previous.get(&path_key(&path)) {
            if cached.fingerprint == fingerprint {
                debug!(path = %path.display(), "unchanged, reusing cached text");
                return FileOutcome::Reused(path, cached.clone());
            }
        }

        match self.engine.extract_text(&path) {
            Ok(text) => {
                debug!(path = %path.display(), "processed");
                FileOutcome::Processed(path, IndexedDocument { text, fingerprint })
            }
            Err(e) => FileOutcome::Failed(path, e),
        }
    }
}

/// Validate and canonicalize an indexing root
fn resolve_root(root_path: &Path) -> Result<PathBuf> {
    if root_path.as_os_str().is_empty() {
        return Err(Error::InvalidArgument("root path is empty".to_string()));
    }

    let root = root_path
        .canonicalize()
        .map_err(|_| Error::NotADirectory(root_path.to_path_buf()))?;

    if !root.is_dir() {
        return Err(Error::NotADirectory(root_path.to_path_buf()));
    }

    Ok(root)
}

/// Store key for a visited path
fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Enumerate every non-directory entry under `root`, sorted by path
fn collect_entries(root: &Path) -> Vec<Entry> {
    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            !(entry.depth() == 1 && is_reserved_name(&name))
        })
        .build();

    let mut paths: Vec<PathBuf> = walker
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "walk error");
                None
            }
        })
        .filter(|entry| entry.depth() > 0)
        .map(|entry| entry.into_path())
        .filter(|path| !path.is_dir())
        .collect();

    paths.sort();

    paths
        .into_iter()
        .map(|path| match ImageFormat::from_path(&path) {
            Some(_) => Entry::Candidate(path),
            None => Entry::Unsupported(path),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::types::NoopReporter;
    use std::collections::HashMap;
    use std::fs;
    use std::sync::Mutex;

    /// OCR stand-in: the "text" of an image is its file contents
    struct FileContentsOcr {
        calls: Mutex<Vec<PathBuf>>,
        fail: Vec<String>,
    }

    impl FileContentsOcr {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail: Vec::new(),
            }
        }

        fn failing(names: &[&str]) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail: names.iter().map(|s| s.to_string()).collect(),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl OcrEngine for FileContentsOcr {
        fn extract_text(&self, path: &Path) -> Result<String> {
            self.calls.lock().unwrap().push(path.to_path_buf());
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            if self.fail.contains(&name) {
                return Err(Error::Ocr {
                    path: path.to_path_buf(),
                    message: "engine crashed".to_string(),
                });
            }
            let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
    }

    fn fixture() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::write(root.join("a.png"), "alpha beta").unwrap();
        fs::write(root.join("notes.txt"), "not an image").unwrap();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("sub").join("b.JPG"), "gamma").unwrap();
        (dir, root)
    }

    fn key(root: &Path, rel: &str) -> String {
        root.join(rel).to_string_lossy().into_owned()
    }

    #[test]
    fn test_update_store_classifies_entries() {
        let (_dir, root) = fixture();
        let indexer = Indexer::new(FileContentsOcr::new());

        let events = Mutex::new(Vec::new());
        let reporter = |e: &IndexEvent| events.lock().unwrap().push(e.clone());
        let (store, summary) = indexer
            .update_store(&root, &IndexStore::new(), &reporter)
            .unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&key(&root, "a.png")).unwrap().text, "alpha beta");
        assert_eq!(store.get(&key(&root, "sub/b.JPG")).unwrap().text, "gamma");
        assert!(store.get(&key(&root, "notes.txt")).is_none());

        assert_eq!(summary.processed, 2);
        assert_eq!(summary.unsupported, 1);

        // Deterministic, path-sorted event order
        let events = events.into_inner().unwrap();
        assert_eq!(
            events,
            vec![
                IndexEvent::Processing(root.join("a.png")),
                IndexEvent::SkippedUnsupported(root.join("notes.txt")),
                IndexEvent::Processing(root.join("sub/b.JPG")),
            ]
        );
    }

    #[test]
    fn test_update_store_reuses_matching_fingerprint() {
        let (_dir, root) = fixture();
        let ocr = FileContentsOcr::new();
        let indexer = Indexer::new(&ocr);

        let (first, _) = indexer
            .update_store(&root, &IndexStore::new(), &NoopReporter)
            .unwrap();
        assert_eq!(ocr.call_count(), 2);

        let (second, summary) = indexer.update_store(&root, &first, &NoopReporter).unwrap();
        assert_eq!(ocr.call_count(), 2);
        assert_eq!(summary.reused, 2);
        assert_eq!(second, first);
    }

    #[test]
    fn test_cached_text_wins_over_fresh_ocr_when_unchanged() {
        let (_dir, root) = fixture();
        let indexer = Indexer::new(FileContentsOcr::new());
        let (mut previous, _) = indexer
            .update_store(&root, &IndexStore::new(), &NoopReporter)
            .unwrap();

        // Same fingerprint, different cached text: the cache is authoritative
        let k = key(&root, "a.png");
        let fingerprint = previous.get(&k).unwrap().fingerprint.clone();
        previous.insert(
            k.clone(),
            IndexedDocument {
                text: "cached".to_string(),
                fingerprint,
            },
        );

        let (store, _) = indexer.update_store(&root, &previous, &NoopReporter).unwrap();
        assert_eq!(store.get(&k).unwrap().text, "cached");
    }

    #[test]
    fn test_ocr_failure_is_isolated() {
        let (_dir, root) = fixture();
        let indexer = Indexer::new(FileContentsOcr::failing(&["a.png"]));

        let (store, summary) = indexer
            .update_store(&root, &IndexStore::new(), &NoopReporter)
            .unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.processed, 1);
        assert!(store.get(&key(&root, "a.png")).is_none());
        assert!(store.get(&key(&root, "sub/b.JPG")).is_some());
    }

    #[test]
    fn test_stale_entries_are_dropped() {
        let (_dir, root) = fixture();
        let indexer = Indexer::new(FileContentsOcr::new());

        let mut previous = IndexStore::new();
        previous.insert(
            key(&root, "deleted.png"),
            IndexedDocument {
                text: "gone".to_string(),
                fingerprint: "00".to_string(),
            },
        );

        let (store, _) = indexer.update_store(&root, &previous, &NoopReporter).unwrap();
        assert!(store.get(&key(&root, "deleted.png")).is_none());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        for i in 0..25 {
            fs::write(root.join(format!("page_{:02}.png", i)), format!("page {}", i)).unwrap();
            fs::write(root.join(format!("page_{:02}.txt", i)), "sidecar").unwrap();
        }

        let record = |options: IndexOptions| {
            let events = Mutex::new(Vec::new());
            let reporter = |e: &IndexEvent| events.lock().unwrap().push(e.clone());
            let indexer = Indexer::with_options(FileContentsOcr::new(), options);
            let (store, _) = indexer
                .update_store(&root, &IndexStore::new(), &reporter)
                .unwrap();
            (store, events.into_inner().unwrap())
        };

        let sequential = record(IndexOptions::default());
        let parallel = record(IndexOptions {
            threads: 4,
            chunk_size: 3,
            cancel: None,
        });

        assert_eq!(sequential.0, parallel.0);
        assert_eq!(sequential.1, parallel.1);
        assert_eq!(sequential.1.len(), 50);
    }

    #[test]
    fn test_progress_counts_candidates() {
        struct Counter(Mutex<HashMap<usize, usize>>);
        impl IndexReporter for Counter {
            fn event(&self, _event: &IndexEvent) {}
            fn progress(&self, done: usize, total: usize) {
                self.0.lock().unwrap().insert(done, total);
            }
        }

        let (_dir, root) = fixture();
        let counter = Counter(Mutex::new(HashMap::new()));
        Indexer::new(FileContentsOcr::new())
            .update_store(&root, &IndexStore::new(), &counter)
            .unwrap();

        let seen = counter.0.into_inner().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen.get(&2), Some(&2));
    }

    #[test]
    fn test_cancelled_pass_returns_error() {
        let (_dir, root) = fixture();
        let token = CancellationToken::new();
        token.cancel();

        let indexer = Indexer::with_options(
            FileContentsOcr::new(),
            IndexOptions {
                cancel: Some(token),
                ..IndexOptions::default()
            },
        );
        let err = indexer
            .update_store(&root, &IndexStore::new(), &NoopReporter)
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[test]
    fn test_resolve_root_errors() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.png");
        fs::write(&file, "x").unwrap();

        assert!(matches!(
            resolve_root(Path::new("")),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(resolve_root(&file), Err(Error::NotADirectory(_))));
        assert!(matches!(
            resolve_root(&dir.path().join("missing")),
            Err(Error::NotADirectory(_))
        ));
    }

    #[test]
    fn test_reserved_files_are_not_visited() {
        let (_dir, root) = fixture();
        IndexStore::new().save(&root).unwrap();

        let events = Mutex::new(Vec::new());
        let reporter = |e: &IndexEvent| events.lock().unwrap().push(e.clone());
        Indexer::new(FileContentsOcr::new())
            .update_store(&root, &IndexStore::new(), &reporter)
            .unwrap();

        let events = events.into_inner().unwrap();
        assert!(
            events
                .iter()
                .all(|e| !e.path().to_string_lossy().contains(".ocrindex"))
        );
    }
}
