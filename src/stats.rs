//! Store statistics and health overview.
//!
//! Provides a quick summary of what's indexed: document counts, chunk
//! counts and embedding coverage. Used by `stats` to give confidence that
//! index runs are working as expected.

use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use crate::store::ContentStore;
use crate::vector::VectorIndex;

#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub store: String,
    pub size: String,
    pub documents: i64,
    pub chunks: i64,
    pub vectors: String,
    pub semantic: String,
}

pub async fn collect(
    store: &ContentStore,
    vectors: &VectorIndex,
    db_path: &Path,
) -> Result<StoreStats> {
    let counts = store.counts().await?;

    let db_size = std::fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);

    let vectors_display = match counts.vectors {
        Some(embedded) => format!(
            "{} / {} ({}%)",
            embedded,
            counts.chunks,
            if counts.chunks > 0 {
                (embedded * 100) / counts.chunks
            } else {
                0
            }
        ),
        None => "none".to_string(),
    };

    let semantic = match vectors.model_name() {
        Some(model) => format!("enabled ({})", model),
        None => "disabled".to_string(),
    };

    Ok(StoreStats {
        store: db_path.display().to_string(),
        size: format_bytes(db_size),
        documents: counts.documents,
        chunks: counts.chunks,
        vectors: vectors_display,
        semantic,
    })
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
