//! Optional vector index.
//!
//! [`VectorIndex`] is either [`Active`](VectorIndex::Active), wrapping an
//! [`Embedder`], or [`Absent`](VectorIndex::Absent). It is chosen once per
//! process and passed to the indexer and query router; the absent variant
//! answers every call with "nothing", so callers never branch on whether
//! embeddings exist.
//!
//! Search is an exhaustive scan: every stored vector is loaded and scored
//! by cosine similarity against the query embedding.

use anyhow::{bail, Result};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::config::EmbeddingConfig;
use crate::embedding::{self, blob_to_vec, cosine_similarity, Embedder};
use crate::models::{round_score, Chunk, ChunkVector, MatchKind, QueryResult};

pub enum VectorIndex {
    Active(SemanticIndex),
    Absent,
}

/// An embedder plus the input limit applied to chunk text.
pub struct SemanticIndex {
    embedder: Box<dyn Embedder>,
    max_input_chars: usize,
}

/// Knobs for a semantic search call.
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub limit: usize,
    pub preview_chars: usize,
    pub min_similarity: Option<f32>,
}

impl VectorIndex {
    /// Probe the embedding backend described by `config`.
    pub fn detect(config: &EmbeddingConfig) -> Self {
        match embedding::probe(config) {
            Some(embedder) => Self::with_embedder(embedder, config.max_input_chars),
            None => Self::Absent,
        }
    }

    pub fn with_embedder(embedder: Box<dyn Embedder>, max_input_chars: usize) -> Self {
        Self::Active(SemanticIndex {
            embedder,
            max_input_chars,
        })
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    pub fn model_name(&self) -> Option<&str> {
        match self {
            Self::Active(index) => Some(index.embedder.model_name()),
            Self::Absent => None,
        }
    }

    /// Embed each chunk's leading text. Empty when absent.
    pub fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<ChunkVector>> {
        match self {
            Self::Active(index) => index.embed_chunks(chunks),
            Self::Absent => Ok(Vec::new()),
        }
    }

    /// Top matches for `query`. Any embedding or scoring failure is logged
    /// and reported as no matches.
    pub async fn search(
        &self,
        pool: &SqlitePool,
        query: &str,
        opts: SearchOptions,
    ) -> Vec<QueryResult> {
        match self {
            Self::Active(index) => match index.search(pool, query, opts).await {
                Ok(results) => results,
                Err(err) => {
                    debug!("semantic search failed, treating as no results: {err:#}");
                    Vec::new()
                }
            },
            Self::Absent => Vec::new(),
        }
    }
}

impl SemanticIndex {
    fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<ChunkVector>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = chunks
            .iter()
            .map(|c| truncate_chars(&c.content, self.max_input_chars).to_string())
            .collect();
        let embeddings = self.embedder.embed(&texts)?;
        if embeddings.len() != chunks.len() {
            bail!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            );
        }

        Ok(chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| ChunkVector {
                chunk_id: chunk.id.clone(),
                embedding,
            })
            .collect())
    }

    async fn search(
        &self,
        pool: &SqlitePool,
        query: &str,
        opts: SearchOptions,
    ) -> Result<Vec<QueryResult>> {
        let query_vec = self.embedder.embed_query(query)?;

        // Fetch all vectors and compute cosine similarity in Rust
        let rows = sqlx::query(
            r#"
            SELECT cv.vector, c.content, c.rowid AS seq, d.path
            FROM chunk_vectors cv
            JOIN chunks c ON c.id = cv.chunk_id
            JOIN documents d ON d.id = c.doc_id
            "#,
        )
        .fetch_all(pool)
        .await?;

        struct Scored {
            score: f32,
            seq: i64,
            path: String,
            content: String,
        }

        let mut scored: Vec<Scored> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("vector");
                Scored {
                    score: cosine_similarity(&query_vec, &blob_to_vec(&blob)),
                    seq: row.get("seq"),
                    path: row.get("path"),
                    content: row.get("content"),
                }
            })
            // NaN from a corrupt vector never ranks
            .filter(|s| s.score.is_finite())
            .filter(|s| opts.min_similarity.map_or(true, |min| s.score >= min))
            .collect();

        // Sort: score desc, then chunk insertion order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.seq.cmp(&b.seq)));
        scored.truncate(opts.limit);

        Ok(scored
            .into_iter()
            .map(|s| QueryResult {
                kind: MatchKind::Semantic,
                score: round_score(s.score as f64),
                path: s.path,
                content: preview(&s.content, opts.preview_chars),
            })
            .collect())
    }
}

/// Leading `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Whitespace-trimmed preview of at most `max` characters, with `...`
/// appended when the text was cut.
pub fn preview(text: &str, max: usize) -> String {
    let cut = truncate_chars(text, max);
    if cut.len() < text.len() {
        format!("{}...", cut.trim())
    } else {
        text.trim().to_string()
    }
}
