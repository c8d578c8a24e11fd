//! Core data models used throughout the store.
//!
//! These types represent the documents, chunks, vectors and query results
//! that flow through indexing and retrieval. Identifiers are pure
//! functions of the file path (and chunk position), so re-indexing the
//! same file always targets the same rows.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// One indexed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub path: String,
    pub checksum: String,
    pub last_indexed: i64,
}

impl Document {
    /// Build the row for `path` whose decoded text is `text`, stamped now.
    pub fn new(path: &str, text: &str) -> Self {
        Self {
            id: document_id(path),
            path: path.to_string(),
            checksum: content_checksum(text),
            last_indexed: chrono::Utc::now().timestamp(),
        }
    }
}

/// A window of a document's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub id: String,
    pub doc_id: String,
    pub chunk_index: i64,
    pub content: String,
}

/// Embedding of one chunk.
#[derive(Debug, Clone)]
pub struct ChunkVector {
    pub chunk_id: String,
    pub embedding: Vec<f32>,
}

/// Which retrieval mode produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Semantic,
    Keyword,
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchKind::Semantic => f.write_str("semantic"),
            MatchKind::Keyword => f.write_str("keyword"),
        }
    }
}

/// A ranked retrieval result.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    #[serde(rename = "type")]
    pub kind: MatchKind,
    pub score: f64,
    pub path: String,
    pub content: String,
}

/// Stable document identifier: SHA-256 of the absolute path.
pub fn document_id(path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Chunk identifier, stable for one version of the document's content.
pub fn chunk_id(doc_id: &str, chunk_index: i64) -> String {
    format!("{}_{}", doc_id, chunk_index)
}

/// Change-detection hash of decoded file text.
pub fn content_checksum(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Round a score to three decimals for display.
pub fn round_score(score: f64) -> f64 {
    (score * 1000.0).round() / 1000.0
}

/// Round to `digits` significant digits. Keyword ranks can sit near
/// 1e-6, where fixed decimal rounding would flatten them to zero.
pub fn round_significant(score: f64, digits: i32) -> f64 {
    if score == 0.0 || !score.is_finite() {
        return score;
    }
    let magnitude = score.abs().log10().floor() as i32;
    let factor = 10f64.powi(digits - 1 - magnitude);
    (score * factor).round() / factor
}
