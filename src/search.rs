//! Query routing: semantic first, keyword fallback.
//!
//! When the vector index is active the query is answered semantically.
//! If that produces nothing (no vectors, every hit below
//! `retrieval.min_similarity`, or an embedding/scoring failure) the
//! lexical index answers instead. Exactly one mode's results are
//! returned; the two are never merged.

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::debug;

use crate::config::RetrievalConfig;
use crate::lexical;
use crate::models::QueryResult;
use crate::vector::{SearchOptions, VectorIndex};

pub struct QueryRouter<'a> {
    pool: &'a SqlitePool,
    vectors: &'a VectorIndex,
    retrieval: &'a RetrievalConfig,
}

impl<'a> QueryRouter<'a> {
    pub fn new(pool: &'a SqlitePool, vectors: &'a VectorIndex, retrieval: &'a RetrievalConfig) -> Self {
        Self {
            pool,
            vectors,
            retrieval,
        }
    }

    pub async fn query(&self, text: &str, limit: usize) -> Result<Vec<QueryResult>> {
        if text.trim().is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        if self.vectors.is_active() {
            let opts = SearchOptions {
                limit,
                preview_chars: self.retrieval.preview_chars,
                min_similarity: self.retrieval.min_similarity,
            };
            let semantic = self.vectors.search(self.pool, text, opts).await;
            if !semantic.is_empty() {
                return Ok(semantic);
            }
            debug!("no semantic results, falling back to keyword search");
        }

        lexical::keyword_search(self.pool, text, limit).await
    }
}
