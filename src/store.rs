//! Content store: documents, chunks and chunk vectors in SQLite.
//!
//! The store is the source of truth. A document's chunk set (and vectors)
//! is only ever replaced as a whole inside one transaction together with
//! the document row, so a concurrent reader sees either the old checksum
//! with the old chunks or the new checksum with the new chunks. Deleting a
//! document relies on `ON DELETE CASCADE` to remove its chunks and
//! vectors; the FTS triggers on `chunks` keep the lexical index in step.

use anyhow::Result;
use sqlx::{Row, SqlitePool};

use crate::embedding::vec_to_blob;
use crate::migrate;
use crate::models::{Chunk, ChunkVector, Document};

/// Row counts across the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreCounts {
    pub documents: i64,
    pub chunks: i64,
    /// `None` when the store has no vector table.
    pub vectors: Option<i64>,
}

/// SQLite-backed content store.
#[derive(Debug, Clone)]
pub struct ContentStore {
    pool: SqlitePool,
}

impl ContentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Checksum recorded for a document, if it has been indexed.
    pub async fn document_checksum(&self, doc_id: &str) -> Result<Option<String>> {
        let checksum: Option<String> =
            sqlx::query_scalar("SELECT checksum FROM documents WHERE id = ?")
                .bind(doc_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(checksum)
    }

    /// Number of the document's chunks that have no stored vector.
    pub async fn chunks_missing_vectors(&self, doc_id: &str) -> Result<i64> {
        let missing: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM chunks c
            LEFT JOIN chunk_vectors cv ON cv.chunk_id = c.id
            WHERE c.doc_id = ? AND cv.chunk_id IS NULL
            "#,
        )
        .bind(doc_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(missing)
    }

    /// Upsert `doc` and atomically swap its chunk set (and vectors).
    ///
    /// Old chunks are deleted first, which cascades to their vectors and
    /// fires the FTS delete trigger, so no stale postings survive.
    pub async fn replace_document(
        &self,
        doc: &Document,
        chunks: &[Chunk],
        vectors: &[ChunkVector],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO documents (id, path, checksum, last_indexed)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                path = excluded.path,
                checksum = excluded.checksum,
                last_indexed = excluded.last_indexed
            "#,
        )
        .bind(&doc.id)
        .bind(&doc.path)
        .bind(&doc.checksum)
        .bind(doc.last_indexed)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM chunks WHERE doc_id = ?")
            .bind(&doc.id)
            .execute(&mut *tx)
            .await?;

        for chunk in chunks {
            sqlx::query(
                "INSERT INTO chunks (id, doc_id, chunk_index, content) VALUES (?, ?, ?, ?)",
            )
            .bind(&chunk.id)
            .bind(&chunk.doc_id)
            .bind(chunk.chunk_index)
            .bind(&chunk.content)
            .execute(&mut *tx)
            .await?;
        }

        for vector in vectors {
            sqlx::query("INSERT INTO chunk_vectors (chunk_id, vector) VALUES (?, ?)")
                .bind(&vector.chunk_id)
                .bind(vec_to_blob(&vector.embedding))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_document(&self, path: &str) -> Result<Option<Document>> {
        let row = sqlx::query(
            r#"
            SELECT id, path, checksum, CAST(last_indexed AS INTEGER) AS last_indexed
            FROM documents WHERE path = ?
            "#,
        )
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Document {
            id: row.get("id"),
            path: row.get("path"),
            checksum: row.get("checksum"),
            last_indexed: row.get("last_indexed"),
        }))
    }

    /// Chunks of a document in index order.
    pub async fn chunks_for(&self, doc_id: &str) -> Result<Vec<Chunk>> {
        let rows = sqlx::query(
            "SELECT id, doc_id, chunk_index, content FROM chunks WHERE doc_id = ? ORDER BY chunk_index",
        )
        .bind(doc_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Chunk {
                id: row.get("id"),
                doc_id: row.get("doc_id"),
                chunk_index: row.get("chunk_index"),
                content: row.get("content"),
            })
            .collect())
    }

    /// Every indexed path.
    pub async fn document_paths(&self) -> Result<Vec<String>> {
        let paths: Vec<String> = sqlx::query_scalar("SELECT path FROM documents ORDER BY path")
            .fetch_all(&self.pool)
            .await?;
        Ok(paths)
    }

    /// Drop every stored vector. Returns rows removed.
    pub async fn clear_vectors(&self) -> Result<u64> {
        if !migrate::table_exists(&self.pool, "chunk_vectors").await? {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM chunk_vectors")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete documents by path in one transaction. Returns rows removed.
    pub async fn delete_documents(&self, paths: &[String]) -> Result<u64> {
        if paths.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut removed = 0u64;
        for path in paths {
            let result = sqlx::query("DELETE FROM documents WHERE path = ?")
                .bind(path)
                .execute(&mut *tx)
                .await?;
            removed += result.rows_affected();
        }
        tx.commit().await?;
        Ok(removed)
    }

    pub async fn counts(&self) -> Result<StoreCounts> {
        let documents: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;
        let chunks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await?;
        let vectors = if migrate::table_exists(&self.pool, "chunk_vectors").await? {
            let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunk_vectors")
                .fetch_one(&self.pool)
                .await?;
            Some(n)
        } else {
            None
        };

        Ok(StoreCounts {
            documents,
            chunks,
            vectors,
        })
    }

    /// Chunks with no owning document, or vectors with no owning chunk.
    /// Always zero while foreign keys are enforced.
    pub async fn orphan_count(&self) -> Result<i64> {
        let orphan_chunks: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM chunks c LEFT JOIN documents d ON d.id = c.doc_id WHERE d.id IS NULL",
        )
        .fetch_one(&self.pool)
        .await?;

        let orphan_vectors: i64 = if migrate::table_exists(&self.pool, "chunk_vectors").await? {
            sqlx::query_scalar(
                "SELECT COUNT(*) FROM chunk_vectors cv LEFT JOIN chunks c ON c.id = cv.chunk_id WHERE c.id IS NULL",
            )
            .fetch_one(&self.pool)
            .await?
        } else {
            0
        };

        Ok(orphan_chunks + orphan_vectors)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
