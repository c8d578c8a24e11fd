//! Embedding capability.
//!
//! [`Embedder`] is the seam between the store and a sentence-embedding
//! model. The only built-in backend runs a fastembed model in-process
//! (feature `local-embeddings-fastembed`); the model is fetched once and
//! cached, and no network is used after that.
//!
//! [`probe`] runs once per process. `None` means keyword-only for the
//! rest of the run: the feature is off, `embedding.enabled = false`, or
//! the model failed to load.
//!
//! Vectors are persisted as little-endian `f32` BLOBs.

use anyhow::Result;
use tracing::{debug, info};

use crate::config::EmbeddingConfig;

/// A text embedding backend.
///
/// Implementations must be deterministic for a given model: the same
/// text always maps to the same vector, and every vector has
/// [`dims`](Embedder::dims) components.
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"all-minilm-l6-v2"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `384`).
    fn dims(&self) -> usize;
    /// Embed a batch of texts, returning one vector per input in order.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query text.
    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Empty embedding response"))
    }
}

/// Detect the embedding capability.
pub fn probe(config: &EmbeddingConfig) -> Option<Box<dyn Embedder>> {
    if !config.enabled {
        debug!("embeddings disabled by configuration");
        return None;
    }
    match load_local(config) {
        Ok(embedder) => {
            info!(
                model = embedder.model_name(),
                dims = embedder.dims(),
                "semantic search enabled"
            );
            Some(embedder)
        }
        Err(err) => {
            info!("semantic search unavailable, using keyword search only: {err:#}");
            None
        }
    }
}

#[cfg(feature = "local-embeddings-fastembed")]
fn load_local(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    Ok(Box::new(local::LocalEmbedder::new(config)?))
}

#[cfg(not(feature = "local-embeddings-fastembed"))]
fn load_local(_config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    anyhow::bail!("built without the local-embeddings-fastembed feature")
}

/// Dimensionality of the supported local models.
pub fn model_dims(model_name: &str) -> Option<usize> {
    match model_name {
        "all-minilm-l6-v2" => Some(384),
        "all-minilm-l12-v2" => Some(384),
        "bge-small-en-v1.5" => Some(384),
        "bge-base-en-v1.5" => Some(768),
        "bge-large-en-v1.5" => Some(1024),
        "nomic-embed-text-v1" | "nomic-embed-text-v1.5" => Some(768),
        "multilingual-e5-small" => Some(384),
        "multilingual-e5-base" => Some(768),
        "multilingual-e5-large" => Some(1024),
        _ => None,
    }
}

#[cfg(feature = "local-embeddings-fastembed")]
mod local {
    use anyhow::{bail, Result};
    use std::sync::Mutex;

    use super::{model_dims, Embedder};
    use crate::config::EmbeddingConfig;

    /// Local sentence-embedding model run in-process through ONNX Runtime.
    pub struct LocalEmbedder {
        model_name: String,
        dims: usize,
        batch_size: usize,
        model: Mutex<fastembed::TextEmbedding>,
    }

    impl LocalEmbedder {
        pub fn new(config: &EmbeddingConfig) -> Result<Self> {
            let model_name = config.model.clone();
            let fastembed_model = config_to_fastembed_model(&model_name)?;
            let dims = model_dims(&model_name).unwrap_or(384);

            let model = fastembed::TextEmbedding::try_new(
                fastembed::InitOptions::new(fastembed_model).with_show_download_progress(false),
            )
            .map_err(|e| anyhow::anyhow!("Failed to initialize local embedding model: {}", e))?;

            Ok(Self {
                model_name,
                dims,
                batch_size: config.batch_size,
                model: Mutex::new(model),
            })
        }
    }

    impl Embedder for LocalEmbedder {
        fn model_name(&self) -> &str {
            &self.model_name
        }

        fn dims(&self) -> usize {
            self.dims
        }

        fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut model = self
                .model
                .lock()
                .map_err(|_| anyhow::anyhow!("embedding model lock poisoned"))?;
            model
                .embed(texts.to_vec(), Some(self.batch_size))
                .map_err(|e| anyhow::anyhow!("Local embedding failed: {}", e))
        }
    }

    fn config_to_fastembed_model(name: &str) -> Result<fastembed::EmbeddingModel> {
        match name {
            "all-minilm-l6-v2" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2),
            "all-minilm-l12-v2" => Ok(fastembed::EmbeddingModel::AllMiniLML12V2),
            "bge-small-en-v1.5" => Ok(fastembed::EmbeddingModel::BGESmallENV15),
            "bge-base-en-v1.5" => Ok(fastembed::EmbeddingModel::BGEBaseENV15),
            "bge-large-en-v1.5" => Ok(fastembed::EmbeddingModel::BGELargeENV15),
            "nomic-embed-text-v1" => Ok(fastembed::EmbeddingModel::NomicEmbedTextV1),
            "nomic-embed-text-v1.5" => Ok(fastembed::EmbeddingModel::NomicEmbedTextV15),
            "multilingual-e5-small" => Ok(fastembed::EmbeddingModel::MultilingualE5Small),
            "multilingual-e5-base" => Ok(fastembed::EmbeddingModel::MultilingualE5Base),
            "multilingual-e5-large" => Ok(fastembed::EmbeddingModel::MultilingualE5Large),
            other => bail!(
                "Unknown local embedding model: '{}'. Supported models: \
                 all-minilm-l6-v2, all-minilm-l12-v2, bge-small-en-v1.5, bge-base-en-v1.5, \
                 bge-large-en-v1.5, nomic-embed-text-v1, nomic-embed-text-v1.5, \
                 multilingual-e5-small, multilingual-e5-base, multilingual-e5-large",
                other
            ),
        }
    }
}

/// Little-endian `f32` bytes, four per component.
///
/// ```rust
/// use adbs_memory::embedding::{blob_to_vec, vec_to_blob};
///
/// let blob = vec_to_blob(&[0.5, -1.0]);
/// assert_eq!(blob.len(), 8);
/// assert_eq!(blob_to_vec(&blob), vec![0.5, -1.0]);
/// ```
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Inverse of [`vec_to_blob`]. A trailing partial component is dropped.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Cosine of the angle between `a` and `b`.
///
/// Mismatched lengths, empty input, zero-norm vectors and NaN components
/// score `0.0`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let (dot, aa, bb) = a
        .iter()
        .zip(b)
        .fold((0.0f32, 0.0f32, 0.0f32), |(dot, aa, bb), (x, y)| {
            (dot + x * y, aa + x * x, bb + y * y)
        });

    let norm = (aa * bb).sqrt();
    if norm.is_nan() || norm <= f32::EPSILON {
        0.0
    } else {
        dot / norm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant;

    impl Embedder for Constant {
        fn model_name(&self) -> &str {
            "constant"
        }
        fn dims(&self) -> usize {
            2
        }
        fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    #[test]
    fn test_probe_disabled() {
        let config = EmbeddingConfig {
            enabled: false,
            ..EmbeddingConfig::default()
        };
        assert!(probe(&config).is_none());
    }

    #[test]
    fn test_embed_query_default() {
        assert_eq!(Constant.embed_query("x").unwrap(), vec![1.0, 0.0]);
    }

    #[test]
    fn test_model_dims() {
        assert_eq!(model_dims("all-minilm-l6-v2"), Some(384));
        assert_eq!(model_dims("bge-large-en-v1.5"), Some(1024));
        assert_eq!(model_dims("unknown"), None);
    }

    #[test]
    fn test_blob_layout_is_little_endian() {
        assert_eq!(vec_to_blob(&[1.0]), vec![0x00, 0x00, 0x80, 0x3f]);
        assert_eq!(blob_to_vec(&[0x00, 0x00, 0x80, 0x3f, 0xff]), vec![1.0]);
        assert!(blob_to_vec(&[]).is_empty());
    }

    #[test]
    fn test_cosine_direction() {
        assert!((cosine_similarity(&[2.0, 0.0], &[5.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 3.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 1.0], &[-1.0, -1.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[f32::NAN, 1.0], &[1.0, 1.0]), 0.0);
    }
}
