//! TOML configuration.
//!
//! Every section and field has a default, so a missing config file is
//! equivalent to an empty one. [`load_config`] parses and validates;
//! [`Config::validate`] is also run on the defaults so that CLI overrides
//! go through the same checks.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::ignore::IgnoreMatcher;

/// Config file consulted when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = ".adbs/config.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub indexing: IndexingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".adbs/internal/memory.db")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    /// Window length in characters.
    #[serde(default = "default_chunk_size")]
    pub size: usize,
    /// Characters shared by consecutive windows.
    #[serde(default = "default_chunk_overlap")]
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            size: default_chunk_size(),
            overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    1000
}
fn default_chunk_overlap() -> usize {
    200
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexingConfig {
    /// Files larger than this many bytes are skipped.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Leading bytes inspected for a NUL byte.
    #[serde(default = "default_binary_probe_bytes")]
    pub binary_probe_bytes: usize,
    #[serde(default)]
    pub follow_symlinks: bool,
    /// Case-sensitive globs matched against file and directory names.
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            binary_probe_bytes: default_binary_probe_bytes(),
            follow_symlinks: false,
            ignore_patterns: default_ignore_patterns(),
        }
    }
}

fn default_max_file_size() -> u64 {
    1024 * 1024
}
fn default_binary_probe_bytes() -> usize {
    1024
}

pub fn default_ignore_patterns() -> Vec<String> {
    [
        ".git*",
        "*.pyc",
        "__pycache__",
        "node_modules",
        "target",
        "build",
        "dist",
        ".DS_Store",
        "*.db",
        "*.sqlite",
        "package-lock.json",
        ".adbs",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_enabled")]
    pub enabled: bool,
    #[serde(default = "default_model")]
    pub model: String,
    /// Chunk text is cut to this many characters before embedding.
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            enabled: default_embedding_enabled(),
            model: default_model(),
            max_input_chars: default_max_input_chars(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_embedding_enabled() -> bool {
    true
}
fn default_model() -> String {
    "all-minilm-l6-v2".to_string()
}
fn default_max_input_chars() -> usize {
    2000
}
fn default_batch_size() -> usize {
    64
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    /// Maximum characters of chunk text shown for a semantic match.
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
    /// Semantic matches scoring below this are dropped before the
    /// keyword fallback decision.
    #[serde(default)]
    pub min_similarity: Option<f32>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            preview_chars: default_preview_chars(),
            min_similarity: None,
        }
    }
}

fn default_limit() -> usize {
    5
}
fn default_preview_chars() -> usize {
    300
}

impl Config {
    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.size == 0 {
            bail!("chunking.size must be > 0");
        }
        if self.chunking.overlap >= self.chunking.size {
            bail!(
                "chunking.overlap ({}) must be smaller than chunking.size ({})",
                self.chunking.overlap,
                self.chunking.size
            );
        }
        if self.indexing.binary_probe_bytes == 0 {
            bail!("indexing.binary_probe_bytes must be > 0");
        }
        IgnoreMatcher::new(&self.indexing.ignore_patterns)
            .context("indexing.ignore_patterns contains an invalid glob")?;

        if self.embedding.max_input_chars == 0 {
            bail!("embedding.max_input_chars must be > 0");
        }
        if self.embedding.batch_size == 0 {
            bail!("embedding.batch_size must be > 0");
        }

        if self.retrieval.default_limit == 0 {
            bail!("retrieval.default_limit must be >= 1");
        }
        if self.retrieval.preview_chars == 0 {
            bail!("retrieval.preview_chars must be > 0");
        }
        if let Some(min) = self.retrieval.min_similarity {
            if !(-1.0..=1.0).contains(&min) {
                bail!("retrieval.min_similarity must be in [-1.0, 1.0]");
            }
        }
        Ok(())
    }

    /// Resolve a relative store path against `base`.
    pub fn resolve_store_path(&mut self, base: &Path) {
        if self.store.path.is_relative() {
            self.store.path = base.join(&self.store.path);
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;
    Ok(config)
}

/// Load `path` when given, otherwise the default location if it exists,
/// otherwise the built-in defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => load_config(p),
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if default.exists() {
                load_config(default)
            } else {
                let config = Config::default();
                config.validate()?;
                Ok(config)
            }
        }
    }
}
