//! End-to-end indexing and search through the public library API.
//!
//! A fake OCR engine stands in for tesseract: the "text" of an image is the
//! UTF-8 contents of the file, so fixtures are plain text files with image
//! extensions.

use ocidx::index::{
    CancellationToken, IndexEvent, IndexOptions, IndexStore, Indexer, NoopReporter, StoreLock,
    store_path,
};
use ocidx::ocr::OcrEngine;
use ocidx::query::{SearchQuery, search};
use ocidx::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// Records every OCR call
#[derive(Default)]
struct FakeOcr {
    calls: Mutex<Vec<PathBuf>>,
}

impl FakeOcr {
    fn calls(&self) -> Vec<PathBuf> {
        let mut calls = self.calls.lock().unwrap().clone();
        calls.sort();
        calls
    }
}

impl OcrEngine for FakeOcr {
    fn extract_text(&self, path: &Path) -> Result<String> {
        self.calls.lock().unwrap().push(path.to_path_buf());
        fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// A folder of scans plus a stray note
fn scans() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let root = dir.path().canonicalize().unwrap();

    fs::write(root.join("receipt.png"), "hardware store receipt total 42").unwrap();
    fs::write(root.join("letter.jpg"), "dear tax office, please find my return").unwrap();
    fs::create_dir(root.join("2023")).unwrap();
    fs::write(root.join("2023/form.tiff"), "tax return form 2023").unwrap();
    fs::write(root.join("notes.txt"), "not an image").unwrap();

    (dir, root)
}

fn index(root: &Path, engine: &FakeOcr) -> Result<(IndexStore, Vec<IndexEvent>)> {
    let events = Mutex::new(Vec::new());
    let reporter = |event: &IndexEvent| events.lock().unwrap().push(event.clone());
    let outcome = Indexer::new(engine).index_directory(root, &reporter)?;
    Ok((outcome.store, events.into_inner().unwrap()))
}

#[test]
fn test_first_pass_indexes_images_only() {
    let (_dir, root) = scans();
    let engine = FakeOcr::default();
    let (store, events) = index(&root, &engine).unwrap();

    assert_eq!(store.len(), 3);
    assert_eq!(engine.calls().len(), 3);

    let unsupported: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, IndexEvent::SkippedUnsupported(_)))
        .collect();
    assert_eq!(unsupported.len(), 1);
    assert_eq!(unsupported[0].path(), root.join("notes.txt"));

    let key = root.join("2023/form.tiff").to_string_lossy().into_owned();
    assert_eq!(store.get(&key).unwrap().text, "tax return form 2023");
    assert!(store_path(&root).is_file());
}

#[test]
fn test_second_pass_is_idempotent() {
    let (_dir, root) = scans();
    let engine = FakeOcr::default();
    index(&root, &engine).unwrap();
    let first = fs::read(store_path(&root)).unwrap();

    let engine = FakeOcr::default();
    let (_, events) = index(&root, &engine).unwrap();
    let second = fs::read(store_path(&root)).unwrap();

    assert!(engine.calls().is_empty());
    assert_eq!(first, second);
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, IndexEvent::SkippedUnchanged(_)))
            .count(),
        3
    );
}

#[test]
fn test_only_changed_file_is_reprocessed() {
    let (_dir, root) = scans();
    index(&root, &FakeOcr::default()).unwrap();

    fs::write(root.join("receipt.png"), "hardware store receipt total 43").unwrap();
    let engine = FakeOcr::default();
    let (store, _) = index(&root, &engine).unwrap();

    assert_eq!(engine.calls(), vec![root.join("receipt.png")]);
    let key = root.join("receipt.png").to_string_lossy().into_owned();
    assert!(store.get(&key).unwrap().text.ends_with("43"));
}

#[test]
fn test_deleted_file_leaves_store() {
    let (_dir, root) = scans();
    index(&root, &FakeOcr::default()).unwrap();

    fs::remove_file(root.join("letter.jpg")).unwrap();
    let (store, _) = index(&root, &FakeOcr::default()).unwrap();

    assert_eq!(store.len(), 2);
    let reloaded = IndexStore::load(&root).unwrap().unwrap();
    assert_eq!(reloaded, store);
}

#[test]
fn test_search_over_indexed_text() {
    let (_dir, root) = scans();
    let (store, _) = index(&root, &FakeOcr::default()).unwrap();
    let text_map = store.text_map();

    let query = SearchQuery::new(["tax", "retrn"], 1).unwrap();
    let result = search(&text_map, &query);

    let paths: Vec<&String> = result.documents.keys().collect();
    assert_eq!(paths.len(), 2);
    assert!(paths.iter().all(|p| !p.ends_with("receipt.png")));

    let empty = SearchQuery::new(Vec::<String>::new(), 1).unwrap();
    assert!(search(&text_map, &empty).is_empty());
}

#[test]
fn test_corrupt_store_is_fatal_and_untouched() {
    let (_dir, root) = scans();
    fs::write(store_path(&root), "{ not json").unwrap();

    let engine = FakeOcr::default();
    let err = index(&root, &engine).unwrap_err();

    assert!(matches!(err, Error::StoreCorrupt { .. }));
    assert!(engine.calls().is_empty());
    assert_eq!(fs::read_to_string(store_path(&root)).unwrap(), "{ not json");
}

#[test]
fn test_missing_root_is_not_a_directory() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope");

    let err = index(&missing, &FakeOcr::default()).unwrap_err();
    assert!(matches!(err, Error::NotADirectory(_)));

    let file = dir.path().join("scan.png");
    fs::write(&file, "x").unwrap();
    let err = index(&file, &FakeOcr::default()).unwrap_err();
    assert!(matches!(err, Error::NotADirectory(_)));
}

#[test]
fn test_concurrent_pass_is_rejected() {
    let (_dir, root) = scans();
    let _held = StoreLock::acquire(&root).unwrap();

    let engine = FakeOcr::default();
    let err = index(&root, &engine).unwrap_err();
    assert!(matches!(err, Error::StoreLocked { .. }));
    assert!(engine.calls().is_empty());
}

#[test]
fn test_cancelled_pass_keeps_previous_store() {
    let (_dir, root) = scans();
    index(&root, &FakeOcr::default()).unwrap();
    let before = fs::read(store_path(&root)).unwrap();

    fs::write(root.join("new.png"), "fresh scan").unwrap();
    let token = CancellationToken::new();
    token.cancel();
    let options = IndexOptions {
        cancel: Some(token),
        ..IndexOptions::default()
    };
    let engine = FakeOcr::default();
    let err = Indexer::with_options(&engine, options)
        .index_directory(&root, &NoopReporter)
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert!(engine.calls().is_empty());
    assert_eq!(fs::read(store_path(&root)).unwrap(), before);
}

#[test]
fn test_parallel_pass_matches_sequential() {
    let (_dir, root) = scans();
    for i in 0..20 {
        fs::write(root.join(format!("page{:02}.png", i)), format!("page {}", i)).unwrap();
    }

    let sequential = Indexer::new(FakeOcr::default())
        .update_store(&root, &IndexStore::new(), &NoopReporter)
        .unwrap();
    let options = IndexOptions {
        threads: 4,
        chunk_size: 5,
        cancel: None,
    };
    let parallel = Indexer::with_options(FakeOcr::default(), options)
        .update_store(&root, &IndexStore::new(), &NoopReporter)
        .unwrap();

    assert_eq!(sequential, parallel);
    assert_eq!(parallel.0.len(), 23);
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_reported_and_skipped() {
    let (_dir, root) = scans();
    std::os::unix::fs::symlink(root.join("missing.png"), root.join("broken.png")).unwrap();

    let engine = FakeOcr::default();
    let events = Mutex::new(Vec::new());
    let reporter = |event: &IndexEvent| events.lock().unwrap().push(event.clone());
    let outcome = Indexer::new(&engine)
        .index_directory(&root, &reporter)
        .unwrap();
    let events = events.into_inner().unwrap();

    let failed: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, IndexEvent::Failed { .. }))
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].path(), root.join("broken.png"));
    assert_eq!(outcome.summary.failed, 1);

    assert_eq!(outcome.store.len(), 3);
    assert!(!engine.calls().contains(&root.join("broken.png")));
    let saved = IndexStore::load(&root).unwrap().unwrap();
    assert_eq!(saved, outcome.store);
    let key = root.join("broken.png").to_string_lossy().into_owned();
    assert!(saved.get(&key).is_none());
}
