use crate::index::store::{IndexStore, store_path};
use crate::index::types::ImageFormat;
use crate::utils::find_index_root;
use anyhow::{Context, Result, bail};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Summary of one index store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStats {
    pub root: PathBuf,
    pub store_path: PathBuf,
    pub version: u32,
    pub doc_count: usize,
    pub empty_docs: usize,
    pub text_bytes: usize,
    /// Documents per image format; paths without a known extension are
    /// counted under `None`
    pub by_format: BTreeMap<Option<ImageFormat>, usize>,
    pub store_size: u64,
}

impl IndexStats {
    /// Gather statistics for the store rooted at `root`
    pub fn collect(root: &Path) -> Result<Self> {
        let store = IndexStore::load(root)?
            .with_context(|| format!("No index found at {}", root.display()))?;
        let path = store_path(root);
        let store_size = std::fs::metadata(&path)
            .with_context(|| format!("Failed to stat {}", path.display()))?
            .len();

        let mut by_format = BTreeMap::new();
        let mut empty_docs = 0;
        let mut text_bytes = 0;
        for (doc_path, doc) in &store.documents {
            *by_format
                .entry(ImageFormat::from_path(Path::new(doc_path)))
                .or_insert(0) += 1;
            if doc.text.is_empty() {
                empty_docs += 1;
            }
            text_bytes += doc.text.len();
        }

        Ok(Self {
            root: root.to_path_buf(),
            store_path: path,
            version: store.version,
            doc_count: store.len(),
            empty_docs,
            text_bytes,
            by_format,
            store_size,
        })
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "Index Statistics")?;
        writeln!(out, "================")?;
        writeln!(out)?;
        writeln!(out, "Root path:        {}", self.root.display())?;
        writeln!(out, "Index location:   {}", self.store_path.display())?;
        writeln!(out, "Index version:    {}", self.version)?;
        writeln!(out, "Document count:   {}", self.doc_count)?;
        writeln!(out, "Without text:     {}", self.empty_docs)?;
        writeln!(out, "Text size:        {}", format_size(self.text_bytes as u64))?;

        if !self.by_format.is_empty() {
            writeln!(out)?;
            writeln!(out, "Documents by format:")?;
            let mut sorted: Vec<_> = self.by_format.iter().collect();
            sorted.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            for (format, count) in sorted {
                let name = format.map_or("other", |f| f.name());
                writeln!(out, "  {:15} {}", name, count)?;
            }
        }

        writeln!(out)?;
        writeln!(out, "Index size:       {}", format_size(self.store_size))
    }
}

/// Display index statistics for the index containing `path`
pub fn show_stats(path: &Path) -> Result<()> {
    let root = find_index_root(path)?;
    if !store_path(&root).is_file() {
        bail!(
            "No index found for {}. Run 'ocidx index {}' first.",
            root.display(),
            root.display()
        );
    }

    let stats = IndexStats::collect(&root)?;
    stats.write_to(&mut io::stdout().lock())?;
    Ok(())
}

/// Format byte size to human readable
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
