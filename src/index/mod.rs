//! Building, persisting and reloading the sermon vector index.
//!
//! The index is built once from the dataset and saved to the configured
//! directory. Later starts load the saved snapshot; if it cannot be read or
//! was produced by a different embedding model it is rebuilt.

use crate::chunking::{self, Chunk};
use crate::config::Settings;
use crate::corpus;
use crate::embedding::Embedder;
use crate::error::{PrekenError, Result};
use crate::vector_store::{
    IndexedChunk, MemoryVectorStore, SnapshotManifest, SqliteSnapshot, VectorStore,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Chunks embedded per request while building.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Log progress every this many chunks.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 1000;

/// Where the dataset comes from and how it is split.
#[derive(Debug, Clone)]
pub struct CorpusSource {
    pub dataset_path: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl CorpusSource {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            dataset_path: settings.dataset_path(),
            chunk_size: settings.chunking.chunk_size,
            chunk_overlap: settings.chunking.chunk_overlap,
        }
    }

    /// Load, clean and split the dataset.
    ///
    /// A dataset with no usable transcripts is a configuration error.
    pub fn load_chunks(&self) -> Result<Vec<Chunk>> {
        let records = corpus::load_records(&self.dataset_path)?;
        if records.is_empty() {
            return Err(PrekenError::Config(format!(
                "Dataset at {} contains no usable sermon transcripts",
                self.dataset_path.display()
            )));
        }
        chunking::split(&records, self.chunk_size, self.chunk_overlap)
    }
}

/// How a ready index came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexOrigin {
    /// Read from a saved snapshot.
    Loaded,
    /// Built because nothing was saved yet.
    Built,
    /// Built because the saved snapshot was unusable.
    Rebuilt,
}

/// A ready-to-query index.
pub struct LoadedIndex {
    pub store: Arc<MemoryVectorStore>,
    pub origin: IndexOrigin,
}

/// Filesystem and in-memory view of an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStatus {
    pub path: String,
    pub exists: bool,
    pub loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_count: Option<usize>,
}

impl IndexStatus {
    /// Inspect the index directory and, if given, a loaded store.
    ///
    /// The document count is left out when the store cannot report it.
    pub async fn inspect(path: &Path, store: Option<&dyn VectorStore>) -> Self {
        let document_count = match store {
            Some(store) => store.document_count().await.ok(),
            None => None,
        };

        Self {
            path: path.display().to_string(),
            exists: path.exists(),
            loaded: store.is_some(),
            document_count,
        }
    }
}

/// Owns the index location and the embedder used to fill it.
pub struct IndexManager {
    path: PathBuf,
    source: CorpusSource,
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
    progress_interval: usize,
}

impl IndexManager {
    pub fn new(path: PathBuf, source: CorpusSource, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            path,
            source,
            embedder,
            batch_size: DEFAULT_BATCH_SIZE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    pub fn from_settings(settings: &Settings, embedder: Arc<dyn Embedder>) -> Self {
        Self::new(
            settings.index_path(),
            CorpusSource::from_settings(settings),
            embedder,
        )
        .with_batch_size(settings.index.batch_size)
        .with_progress_interval(settings.index.progress_interval)
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether an index was previously built at this location.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the saved index, building and saving one if needed.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn load_or_build(&self) -> Result<LoadedIndex> {
        let origin = if self.exists() {
            info!("Loading existing vector index...");
            match self.load() {
                Ok(store) => {
                    return Ok(LoadedIndex {
                        store: Arc::new(store),
                        origin: IndexOrigin::Loaded,
                    })
                }
                Err(e) => {
                    warn!("Error loading vector index, rebuilding: {}", e);
                    IndexOrigin::Rebuilt
                }
            }
        } else {
            info!("Vector index not found. Creating new one...");
            IndexOrigin::Built
        };

        let store = self.rebuild().await?;
        Ok(LoadedIndex {
            store: Arc::new(store),
            origin,
        })
    }

    /// Read the saved snapshot.
    ///
    /// Fails with an index load error if the snapshot is missing, unreadable,
    /// or was embedded with another model or vector size.
    pub fn load(&self) -> Result<MemoryVectorStore> {
        let (manifest, entries) = SqliteSnapshot::read(&self.path)?;

        if manifest.format_version != SnapshotManifest::FORMAT_VERSION {
            return Err(PrekenError::IndexLoad(format!(
                "Unsupported snapshot version {}",
                manifest.format_version
            )));
        }
        if manifest.embedding_model != self.embedder.model()
            || manifest.dimensions != self.embedder.dimensions()
        {
            return Err(PrekenError::IndexLoad(format!(
                "Index was built with {} ({} dims), current embedder is {} ({} dims)",
                manifest.embedding_model,
                manifest.dimensions,
                self.embedder.model(),
                self.embedder.dimensions()
            )));
        }

        info!(
            "Loaded {} chunks built at {}",
            entries.len(),
            manifest.built_at.format("%Y-%m-%d %H:%M")
        );
        Ok(MemoryVectorStore::from_entries(entries))
    }

    /// Build the index from the dataset and save it.
    pub async fn rebuild(&self) -> Result<MemoryVectorStore> {
        let chunks = self.source.load_chunks()?;
        let store = self.build(chunks).await?;
        self.persist(&store)?;
        Ok(store)
    }

    /// Embed chunks in batches and collect them into a new store.
    ///
    /// Batches are added in order so retrieval ties follow dataset order.
    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    pub async fn build(&self, chunks: Vec<Chunk>) -> Result<MemoryVectorStore> {
        if chunks.is_empty() {
            return Err(PrekenError::Config(
                "No chunks to index; check the dataset".to_string(),
            ));
        }

        let total = chunks.len();
        info!("Indexing {} chunks in batches of {}", total, self.batch_size);

        let store = MemoryVectorStore::new();
        let mut processed = 0;

        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;

            if embeddings.len() != batch.len() {
                return Err(PrekenError::Embedding(format!(
                    "Expected {} embeddings, got {}",
                    batch.len(),
                    embeddings.len()
                )));
            }

            let entries: Vec<IndexedChunk> = batch
                .iter()
                .cloned()
                .zip(embeddings)
                .map(IndexedChunk::from)
                .collect();
            store.add_batch(entries).await?;

            let before = processed;
            processed += batch.len();
            if processed / self.progress_interval > before / self.progress_interval {
                info!("Processed {}/{} chunks", processed, total);
            } else {
                debug!("Processed {}/{} chunks", processed, total);
            }
        }

        info!("Vector index built with {} chunks", processed);
        Ok(store)
    }

    /// Save the store to the index directory, replacing earlier contents.
    pub fn persist(&self, store: &MemoryVectorStore) -> Result<()> {
        let entries = store.snapshot()?;
        let dimensions = store.dimensions()?.unwrap_or_else(|| self.embedder.dimensions());
        let manifest = SnapshotManifest::new(self.embedder.model(), dimensions, entries.len());
        SqliteSnapshot::write(&self.path, &entries, &manifest)?;
        info!("Vector index saved to {}", self.path.display());
        Ok(())
    }

    /// Report on this index location and an optional loaded store.
    pub async fn status(&self, store: Option<&dyn VectorStore>) -> IndexStatus {
        IndexStatus::inspect(&self.path, store).await
    }
}
