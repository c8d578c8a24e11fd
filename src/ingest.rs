//! Indexing pipeline orchestration.
//!
//! Coordinates the index flow: traversal → filtering → change detection →
//! chunking → embedding → storage. A document whose checksum is unchanged
//! is skipped without any write, which keeps repeated runs over a large
//! tree cheap. Per-file problems (oversized, binary, unreadable, embedding
//! failure) skip that file only; store failures abort the run.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::chunk::Chunker;
use crate::config::IndexingConfig;
use crate::error::SkipReason;
use crate::ignore::IgnoreMatcher;
use crate::models::Document;
use crate::progress::{IndexProgressEvent, IndexProgressReporter};
use crate::store::ContentStore;
use crate::vector::VectorIndex;

/// Progress is reported every this many updated documents.
const PROGRESS_EVERY: u64 = 100;

/// What happened to a single candidate file.
#[derive(Debug)]
pub enum FileOutcome {
    Updated { chunks: usize },
    Unchanged,
    Skipped(SkipReason),
}

/// Totals for one `index` call. Only `updated` counts toward the
/// reported "Updated N documents".
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    pub updated: u64,
    pub unchanged: u64,
    pub skipped: u64,
    pub chunks_written: u64,
}

pub struct Indexer<'a> {
    store: &'a ContentStore,
    chunker: &'a Chunker,
    vectors: &'a VectorIndex,
    ignore: &'a IgnoreMatcher,
    limits: &'a IndexingConfig,
}

impl<'a> Indexer<'a> {
    pub fn new(
        store: &'a ContentStore,
        chunker: &'a Chunker,
        vectors: &'a VectorIndex,
        ignore: &'a IgnoreMatcher,
        limits: &'a IndexingConfig,
    ) -> Self {
        Self {
            store,
            chunker,
            vectors,
            ignore,
            limits,
        }
    }

    /// Index a file, or every eligible file below a directory.
    pub async fn index_path(
        &self,
        path: &Path,
        progress: &dyn IndexProgressReporter,
    ) -> Result<IndexReport> {
        let root = std::fs::canonicalize(path)
            .with_context(|| format!("Path does not exist: {}", path.display()))?;
        let metadata = std::fs::metadata(&root)
            .with_context(|| format!("Failed to stat {}", root.display()))?;

        let mut report = IndexReport::default();

        if metadata.is_file() {
            self.process(&root, &mut report, progress).await?;
        } else if metadata.is_dir() {
            progress.report(IndexProgressEvent::Scanning {
                root: root.display().to_string(),
            });

            let walker = WalkDir::new(&root)
                .follow_links(self.limits.follow_symlinks)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|entry| {
                    entry.depth() == 0 || !self.ignore.is_ignored(entry.file_name())
                });

            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        warn!("skipping unreadable entry: {}", err);
                        report.skipped += 1;
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                self.process(entry.path(), &mut report, progress).await?;
            }
        } else {
            bail!("Not a file or directory: {}", root.display());
        }

        info!(
            updated = report.updated,
            unchanged = report.unchanged,
            skipped = report.skipped,
            "index complete for {}",
            root.display()
        );
        Ok(report)
    }

    async fn process(
        &self,
        path: &Path,
        report: &mut IndexReport,
        progress: &dyn IndexProgressReporter,
    ) -> Result<()> {
        match self.index_file(path).await? {
            FileOutcome::Updated { chunks } => {
                report.updated += 1;
                report.chunks_written += chunks as u64;
                if report.updated % PROGRESS_EVERY == 0 {
                    progress.report(IndexProgressEvent::Indexed {
                        updated: report.updated,
                    });
                }
            }
            FileOutcome::Unchanged => report.unchanged += 1,
            FileOutcome::Skipped(reason) => {
                debug!("skipped {}: {}", path.display(), reason);
                report.skipped += 1;
            }
        }
        Ok(())
    }

    /// Bring one file's store state up to date.
    pub async fn index_file(&self, path: &Path) -> Result<FileOutcome> {
        // A lossy path would never match the file again on sync.
        let Some(path_str) = path.to_str() else {
            return Ok(FileOutcome::Skipped(SkipReason::NonUtf8Path));
        };
        let text = match read_text(path, self.limits) {
            Ok(text) => text,
            Err(reason) => return Ok(FileOutcome::Skipped(reason)),
        };

        let doc = Document::new(path_str, &text);

        if let Some(existing) = self.store.document_checksum(&doc.id).await? {
            if existing == doc.checksum && !self.needs_vectors(&doc.id).await? {
                return Ok(FileOutcome::Unchanged);
            }
        }

        let chunks = self.chunker.chunk_document(&doc.id, &text);
        let vectors = match self.vectors.embed_chunks(&chunks) {
            Ok(vectors) => vectors,
            Err(err) => return Ok(FileOutcome::Skipped(SkipReason::Embedding(format!("{err:#}")))),
        };

        self.store.replace_document(&doc, &chunks, &vectors).await?;
        debug!("indexed {} ({} chunks)", doc.path, chunks.len());

        Ok(FileOutcome::Updated {
            chunks: chunks.len(),
        })
    }

    /// An unchanged document still needs work when the vector index is
    /// active but some of its chunks were stored without vectors.
    async fn needs_vectors(&self, doc_id: &str) -> Result<bool> {
        if !self.vectors.is_active() {
            return Ok(false);
        }
        Ok(self.store.chunks_missing_vectors(doc_id).await? > 0)
    }
}

/// Read a candidate file as text, or say why it is not indexable.
///
/// Invalid UTF-8 sequences are replaced rather than failing the file.
pub fn read_text(path: &Path, limits: &IndexingConfig) -> Result<String, SkipReason> {
    let size = std::fs::metadata(path)?.len();
    if size > limits.max_file_size {
        return Err(SkipReason::TooLarge {
            size,
            limit: limits.max_file_size,
        });
    }

    let bytes = std::fs::read(path)?;
    let probe = &bytes[..bytes.len().min(limits.binary_probe_bytes)];
    if probe.contains(&0) {
        return Err(SkipReason::Binary {
            probe: limits.binary_probe_bytes,
        });
    }

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_read_text_plain() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.txt");
        fs::write(&path, "hello").unwrap();
        assert_eq!(read_text(&path, &IndexingConfig::default()).unwrap(), "hello");
    }

    #[test]
    fn test_read_text_too_large() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("big.txt");
        fs::write(&path, "x".repeat(64)).unwrap();
        let limits = IndexingConfig {
            max_file_size: 32,
            ..IndexingConfig::default()
        };
        assert!(matches!(
            read_text(&path, &limits),
            Err(SkipReason::TooLarge { size: 64, limit: 32 })
        ));
    }

    #[test]
    fn test_read_text_binary_probe() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("blob.bin");
        fs::write(&path, b"abc\0def").unwrap();
        assert!(matches!(
            read_text(&path, &IndexingConfig::default()),
            Err(SkipReason::Binary { .. })
        ));
    }

    #[test]
    fn test_read_text_nul_past_probe_is_text() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("late.txt");
        let mut bytes = vec![b'a'; 2048];
        bytes.push(0);
        fs::write(&path, &bytes).unwrap();
        let text = read_text(&path, &IndexingConfig::default()).unwrap();
        assert_eq!(text.len(), 2049);
    }

    #[test]
    fn test_read_text_invalid_utf8_replaced() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("latin1.txt");
        fs::write(&path, b"caf\xe9 ok").unwrap();
        let text = read_text(&path, &IndexingConfig::default()).unwrap();
        assert!(text.starts_with("caf"));
        assert!(text.ends_with(" ok"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_utf8_path_is_skipped() {
        use crate::chunk::Chunker;
        use crate::db;
        use crate::ignore::IgnoreMatcher;
        use crate::migrate;
        use crate::progress::NoProgress;
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("files");
        fs::create_dir_all(&dir).unwrap();
        let odd = dir.join(OsStr::from_bytes(b"caf\xe9.txt"));
        if fs::write(&odd, "latin-1 name").is_err() {
            // Filesystem refuses non-UTF-8 names; nothing to check.
            return;
        }
        fs::write(dir.join("plain.txt"), "plain name").unwrap();

        let pool = db::connect(&tmp.path().join("store.db")).await.unwrap();
        migrate::run_migrations(&pool, false).await.unwrap();
        let store = ContentStore::new(pool);
        let chunker = Chunker::default();
        let vectors = VectorIndex::Absent;
        let ignore = IgnoreMatcher::new(&[]).unwrap();
        let limits = IndexingConfig::default();
        let indexer = Indexer::new(&store, &chunker, &vectors, &ignore, &limits);

        assert!(matches!(
            indexer.index_file(&odd).await.unwrap(),
            FileOutcome::Skipped(SkipReason::NonUtf8Path)
        ));

        let first = indexer.index_path(&dir, &NoProgress).await.unwrap();
        assert_eq!(first.updated, 1);
        assert_eq!(first.skipped, 1);

        let paths = store.document_paths().await.unwrap();
        assert_eq!(paths.len(), 1);
        assert!(paths[0].ends_with("plain.txt"));

        let second = indexer.index_path(&dir, &NoProgress).await.unwrap();
        assert_eq!(second.updated, 0);
        store.close().await;
    }

    #[test]
    fn test_read_text_missing_file() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            read_text(&tmp.path().join("gone.txt"), &IndexingConfig::default()),
            Err(SkipReason::Io(_))
        ));
    }
}
