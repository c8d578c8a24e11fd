//! Per-file skip reasons.
//!
//! A file that hits one of these is left out of the run without aborting
//! its siblings. Store failures are not represented here; they propagate
//! as fatal errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("file is {size} bytes, above the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },

    #[error("file looks binary (NUL byte in the first {probe} bytes)")]
    Binary { probe: usize },

    #[error("path is not valid UTF-8")]
    NonUtf8Path,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("embedding failed: {0}")]
    Embedding(String),
}
