//! Store reconciliation against the filesystem.
//!
//! Removes documents whose backing file has disappeared. New or changed
//! files are left to `index`; this pass only looks at paths the store
//! already knows. Deleting a document cascades to its chunks, their
//! vectors and their lexical postings.

use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

use crate::store::ContentStore;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Documents checked against the filesystem.
    pub checked: u64,
    /// Documents removed because their file is gone.
    pub pruned: u64,
}

impl SyncReport {
    pub fn is_in_sync(&self) -> bool {
        self.pruned == 0
    }
}

/// Paths known to the store that no longer exist on disk.
pub async fn find_ghosts(store: &ContentStore) -> Result<(u64, Vec<String>)> {
    let paths = store.document_paths().await?;
    let checked = paths.len() as u64;
    let ghosts = paths
        .into_iter()
        .filter(|p| !Path::new(p).exists())
        .collect();
    Ok((checked, ghosts))
}

/// Prune ghost documents. `root` only labels the run; every stored path
/// is checked.
pub async fn prune_missing(store: &ContentStore, root: &Path) -> Result<SyncReport> {
    let (checked, ghosts) = find_ghosts(store).await?;
    for ghost in &ghosts {
        debug!("pruning {}", ghost);
    }

    let pruned = store.delete_documents(&ghosts).await?;
    info!(checked, pruned, "sync complete for {}", root.display());

    Ok(SyncReport { checked, pruned })
}
