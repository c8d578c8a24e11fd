//! Keyword search over the FTS5 lexical index.
//!
//! User text is reduced to bare alphanumeric tokens, each quoted, before
//! it reaches `MATCH`, so operators (`AND`, `NEAR`, `*`, `:`, quotes,
//! parentheses) are always taken literally and never raise a syntax
//! error. Tokens are implicitly AND-ed. Results are ordered by FTS5 rank
//! (bm25), ties by chunk insertion order.

use anyhow::Result;
use sqlx::{Row, SqlitePool};

use crate::models::{round_significant, MatchKind, QueryResult};

/// Significant digits kept in a keyword score.
const KEYWORD_SCORE_DIGITS: i32 = 4;

/// Neutralise FTS5 query syntax. Returns `None` when nothing searchable
/// remains.
pub fn sanitize_query(text: &str) -> Option<String> {
    let cleaned: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let terms: Vec<String> = cleaned
        .split_whitespace()
        .map(|t| format!("\"{}\"", t))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}

/// Ranked keyword matches with a highlighted snippet per chunk.
pub async fn keyword_search(pool: &SqlitePool, text: &str, limit: usize) -> Result<Vec<QueryResult>> {
    let Some(match_expr) = sanitize_query(text) else {
        return Ok(Vec::new());
    };

    let rows = sqlx::query(
        r#"
        SELECT d.path AS path,
               snippet(chunks_fts, 0, '[', ']', '...', 16) AS snip,
               chunks_fts.rank AS bm25_rank
        FROM chunks_fts
        JOIN chunks ch ON ch.rowid = chunks_fts.rowid
        JOIN documents d ON d.id = ch.doc_id
        WHERE chunks_fts MATCH ?
        ORDER BY chunks_fts.rank, ch.rowid
        LIMIT ?
        "#,
    )
    .bind(&match_expr)
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;

    let results = rows
        .iter()
        .map(|row| {
            let rank: f64 = row.get("bm25_rank");
            QueryResult {
                kind: MatchKind::Keyword,
                // negate so higher = better
                score: round_significant(-rank, KEYWORD_SCORE_DIGITS),
                path: row.get("path"),
                content: row.get("snip"),
            }
        })
        .collect();

    Ok(results)
}
