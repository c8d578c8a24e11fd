//! Fixed-window text chunker.
//!
//! Splits document text into windows of `size` characters that advance by
//! `size - overlap`, so consecutive chunks share `overlap` characters. The
//! last window ends exactly at the end of the text and may be shorter.
//! Lengths are counted in Unicode scalar values, never bytes, so a window
//! boundary never splits a multi-byte character.
//!
//! Chunk IDs are derived from the document ID and the chunk index; every
//! re-index of a document produces a fresh, contiguous set starting at 0.

use anyhow::{bail, Result};

use crate::config::ChunkingConfig;
use crate::models::{chunk_id, Chunk};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    size: usize,
    overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            size: 1000,
            overlap: 200,
        }
    }
}

impl Chunker {
    pub fn new(size: usize, overlap: usize) -> Result<Self> {
        if size == 0 {
            bail!("chunk size must be > 0");
        }
        if overlap >= size {
            bail!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                overlap,
                size
            );
        }
        Ok(Self { size, overlap })
    }

    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.size, config.overlap)
    }

    /// Split text into overlapping windows. Empty input yields no windows.
    pub fn split(&self, text: &str) -> Vec<String> {
        // Byte offset of every char boundary, including the end of the text.
        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let len = bounds.len() - 1;

        let mut windows = Vec::new();
        if len == 0 {
            return windows;
        }

        let step = self.size - self.overlap;
        let mut start = 0;
        loop {
            let end = (start + self.size).min(len);
            windows.push(text[bounds[start]..bounds[end]].to_string());
            if end == len {
                break;
            }
            start += step;
        }
        windows
    }

    /// Split text and wrap each window as a [`Chunk`] owned by `doc_id`.
    pub fn chunk_document(&self, doc_id: &str, text: &str) -> Vec<Chunk> {
        self.split(text)
            .into_iter()
            .enumerate()
            .map(|(i, content)| {
                let index = i as i64;
                Chunk {
                    id: chunk_id(doc_id, index),
                    doc_id: doc_id.to_string(),
                    chunk_index: index,
                    content,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected_count(len: usize, size: usize, overlap: usize) -> usize {
        if len == 0 {
            0
        } else if len <= size {
            1
        } else {
            (len - overlap).div_ceil(size - overlap)
        }
    }

    fn assert_tiles(text: &str, chunker: &Chunker) {
        let windows = chunker.split(text);
        let len = text.chars().count();
        assert_eq!(
            windows.len(),
            expected_count(len, chunker.size, chunker.overlap),
            "window count for len={}",
            len
        );

        let step = chunker.size - chunker.overlap;
        for (i, w) in windows.iter().enumerate() {
            let start = i * step;
            let expected: String = text.chars().skip(start).take(chunker.size).collect();
            assert_eq!(w, &expected, "window {} for len={}", i, len);
        }

        for pair in windows.windows(2) {
            let tail: String = pair[0]
                .chars()
                .skip(chunker.size - chunker.overlap)
                .collect();
            let head: String = pair[1].chars().take(chunker.overlap).collect();
            assert_eq!(tail, head);
        }

        if let Some(last) = windows.last() {
            assert!(text.ends_with(last.as_str()));
        }
    }

    #[test]
    fn test_empty_text() {
        assert!(Chunker::default().split("").is_empty());
        assert!(Chunker::default().chunk_document("doc1", "").is_empty());
    }

    #[test]
    fn test_small_text_single_chunk() {
        let chunks = Chunker::default().split("Hello, world!");
        assert_eq!(chunks, vec!["Hello, world!".to_string()]);
    }

    #[test]
    fn test_exact_window_is_single_chunk() {
        let text = "a".repeat(1000);
        let chunks = Chunker::default().split(&text);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 1000);
    }

    #[test]
    fn test_one_past_window_makes_two() {
        let text = "b".repeat(1001);
        let chunks = Chunker::default().split(&text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].chars().count(), 201);
    }

    #[test]
    fn test_tiling_over_lengths() {
        let chunker = Chunker::new(10, 3).unwrap();
        let alphabet: Vec<char> = ('a'..='z').collect();
        for len in 0..60 {
            let text: String = (0..len).map(|i| alphabet[i % alphabet.len()]).collect();
            assert_tiles(&text, &chunker);
        }
    }

    #[test]
    fn test_multibyte_boundaries() {
        let chunker = Chunker::new(4, 1).unwrap();
        let text = "héllo wörld ✓ ünïcode";
        assert_tiles(text, &chunker);
        for w in chunker.split(text) {
            assert!(w.chars().count() <= 4);
        }
    }

    #[test]
    fn test_zero_overlap() {
        let chunker = Chunker::new(5, 0).unwrap();
        assert_eq!(
            chunker.split("abcdefghijkl"),
            vec!["abcde".to_string(), "fghij".to_string(), "kl".to_string()]
        );
    }

    #[test]
    fn test_chunk_indices_contiguous() {
        let text = "x".repeat(5000);
        let chunks = Chunker::default().chunk_document("doc1", &text);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.chunk_index, i as i64, "Index mismatch at position {}", i);
            assert_eq!(c.id, format!("doc1_{}", i));
            assert_eq!(c.doc_id, "doc1");
        }
    }

    #[test]
    fn test_deterministic() {
        let text = "Alpha beta gamma delta ".repeat(100);
        let c1 = Chunker::default().chunk_document("doc1", &text);
        let c2 = Chunker::default().chunk_document("doc1", &text);
        assert_eq!(c1, c2);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(Chunker::new(0, 0).is_err());
        assert!(Chunker::new(10, 10).is_err());
        assert!(Chunker::new(10, 11).is_err());
    }
}
