//! One invocation's worth of store state.
//!
//! [`Engine`] owns the validated configuration, the store connection, and
//! the vector capability chosen at construction. The capability is never
//! re-probed; every operation sees the same [`VectorIndex`].

use anyhow::Result;
use std::path::Path;
use tracing::warn;

use crate::chunk::Chunker;
use crate::config::Config;
use crate::db;
use crate::ignore::IgnoreMatcher;
use crate::ingest::{IndexReport, Indexer};
use crate::migrate;
use crate::models::QueryResult;
use crate::progress::IndexProgressReporter;
use crate::search::QueryRouter;
use crate::stats::{self, StoreStats};
use crate::store::ContentStore;
use crate::sync::{self, SyncReport};
use crate::vector::VectorIndex;

const EMBEDDING_MODEL_KEY: &str = "embedding_model";

pub struct Engine {
    config: Config,
    store: ContentStore,
    chunker: Chunker,
    ignore: IgnoreMatcher,
    vectors: VectorIndex,
}

impl Engine {
    /// Open the store and probe the embedding backend.
    pub async fn open(config: Config) -> Result<Self> {
        let vectors = VectorIndex::detect(&config.embedding);
        Self::open_with(config, vectors).await
    }

    /// Open the store with an already-chosen vector capability.
    pub async fn open_with(config: Config, vectors: VectorIndex) -> Result<Self> {
        config.validate()?;
        let chunker = Chunker::from_config(&config.chunking)?;
        let ignore = IgnoreMatcher::new(&config.indexing.ignore_patterns)?;

        let pool = db::connect(&config.store.path).await?;
        migrate::run_migrations(&pool, vectors.is_active()).await?;

        let store = ContentStore::new(pool);

        if let Some(model) = vectors.model_name() {
            match migrate::get_meta(store.pool(), EMBEDDING_MODEL_KEY).await? {
                Some(previous) if previous != model => {
                    // Vectors from two models are not comparable; the next
                    // index run backfills every chunk with the active model.
                    let dropped = store.clear_vectors().await?;
                    warn!(
                        "embedding model changed from '{}' to '{}'; dropped {} stored vectors, \
                         run index to re-embed",
                        previous, model, dropped
                    );
                    migrate::set_meta(store.pool(), EMBEDDING_MODEL_KEY, model).await?;
                }
                Some(_) => {}
                None => migrate::set_meta(store.pool(), EMBEDDING_MODEL_KEY, model).await?,
            }
        }

        Ok(Self {
            config,
            store,
            chunker,
            ignore,
            vectors,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn vectors(&self) -> &VectorIndex {
        &self.vectors
    }

    pub fn indexer(&self) -> Indexer<'_> {
        Indexer::new(
            &self.store,
            &self.chunker,
            &self.vectors,
            &self.ignore,
            &self.config.indexing,
        )
    }

    pub async fn index(
        &self,
        path: &Path,
        progress: &dyn IndexProgressReporter,
    ) -> Result<IndexReport> {
        self.indexer().index_path(path, progress).await
    }

    pub async fn sync(&self, root: &Path) -> Result<SyncReport> {
        let root = std::path::absolute(root)?;
        sync::prune_missing(&self.store, &root).await
    }

    pub async fn query(&self, text: &str, limit: usize) -> Result<Vec<QueryResult>> {
        QueryRouter::new(self.store.pool(), &self.vectors, &self.config.retrieval)
            .query(text, limit)
            .await
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        stats::collect(&self.store, &self.vectors, &self.config.store.path).await
    }

    pub async fn close(self) {
        self.store.close().await;
    }
}
