//! Vector store abstraction for Preken.
//!
//! Chunks live in memory while the service runs; a SQLite snapshot on disk
//! lets later starts skip re-embedding the corpus.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::{SqliteSnapshot, SNAPSHOT_FILE};

use crate::chunking::Chunk;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chunk stored with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

impl IndexedChunk {
    pub fn new(chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self { chunk, embedding }
    }
}

impl From<(Chunk, Vec<f32>)> for IndexedChunk {
    fn from((chunk, embedding): (Chunk, Vec<f32>)) -> Self {
        Self::new(chunk, embedding)
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched chunk.
    pub chunk: Chunk,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Describes how a persisted snapshot was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotManifest {
    /// Layout version of the snapshot file.
    pub format_version: u32,
    /// Embedding model that produced the stored vectors.
    pub embedding_model: String,
    /// Length of every stored vector.
    pub dimensions: usize,
    pub chunk_count: usize,
    pub built_at: DateTime<Utc>,
}

impl SnapshotManifest {
    /// Current snapshot layout.
    pub const FORMAT_VERSION: u32 = 1;

    pub fn new(embedding_model: &str, dimensions: usize, chunk_count: usize) -> Self {
        Self {
            format_version: Self::FORMAT_VERSION,
            embedding_model: embedding_model.to_string(),
            dimensions,
            chunk_count,
            built_at: Utc::now(),
        }
    }
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Append chunks with their embeddings. Returns the number added.
    async fn add_batch(&self, entries: Vec<IndexedChunk>) -> Result<usize>;

    /// Return up to `limit` chunks, most similar first.
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>>;

    /// Get total document count.
    async fn document_count(&self) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
