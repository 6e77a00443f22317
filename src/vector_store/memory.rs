//! In-memory vector store implementation.
//!
//! Brute-force similarity search over every stored chunk.

use super::{cosine_similarity, IndexedChunk, SearchResult, VectorStore};
use crate::error::{PrekenError, Result};
use async_trait::async_trait;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory vector store. Entries keep their insertion order.
#[derive(Debug)]
pub struct MemoryVectorStore {
    entries: RwLock<Vec<IndexedChunk>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Create a store holding previously embedded entries.
    pub fn from_entries(entries: Vec<IndexedChunk>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Copy of every entry, in insertion order.
    pub fn snapshot(&self) -> Result<Vec<IndexedChunk>> {
        Ok(self.read()?.clone())
    }

    /// Length of the stored vectors, if any are stored.
    pub fn dimensions(&self) -> Result<Option<usize>> {
        Ok(self.read()?.first().map(|e| e.embedding.len()))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<IndexedChunk>>> {
        self.entries
            .read()
            .map_err(|e| PrekenError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<IndexedChunk>>> {
        self.entries
            .write()
            .map_err(|e| PrekenError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn add_batch(&self, new_entries: Vec<IndexedChunk>) -> Result<usize> {
        let mut entries = self.write()?;

        let expected = entries
            .first()
            .or_else(|| new_entries.first())
            .map(|e| e.embedding.len());

        if let Some(expected) = expected {
            if let Some(bad) = new_entries.iter().find(|e| e.embedding.len() != expected) {
                return Err(PrekenError::VectorStore(format!(
                    "Embedding has {} dimensions, index uses {}",
                    bad.embedding.len(),
                    expected
                )));
            }
        }

        let added = new_entries.len();
        entries.extend(new_entries);
        Ok(added)
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        let entries = self.read()?;

        let mut scored: Vec<(usize, f32)> = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let score = cosine_similarity(query_embedding, &entry.embedding);
                (i, if score.is_nan() { f32::NEG_INFINITY } else { score })
            })
            .collect();

        // Stable sort: equal scores keep insertion order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(i, score)| SearchResult {
                chunk: entries[i].chunk.clone(),
                score,
            })
            .collect())
    }

    async fn document_count(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }
}
