//! Retrieval and context formatting for answer generation.

use crate::chunking::Chunk;
use crate::citation::clean_preview;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{SearchResult, VectorStore};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Default number of chunks retrieved per question.
pub const DEFAULT_TOP_K: usize = 5;

/// Default cap on each chunk's text inside the prompt context.
pub const DEFAULT_CONTEXT_CHARS: usize = 500;

/// Top-k lookup of chunks by question embedding.
pub struct Retriever {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    k: usize,
}

impl Retriever {
    /// Create a retriever bound to an index.
    pub fn new(vector_store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            vector_store,
            embedder,
            k: DEFAULT_TOP_K,
        }
    }

    /// Set the number of chunks to retrieve.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Retrieve the most similar chunks, best first.
    #[instrument(skip(self, question), fields(k = self.k))]
    pub async fn retrieve(&self, question: &str) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedder.embed(question).await?;
        let results = self.vector_store.search(&query_embedding, self.k).await?;
        debug!("Retrieved {} chunks", results.len());
        Ok(results)
    }
}

/// Format retrieved chunks as the context block of the answer prompt.
///
/// Each chunk is cleaned, capped at `context_chars` and headed with its
/// 1-based position and sermon title.
pub fn format_context<'a, I>(chunks: I, context_chars: usize) -> String
where
    I: IntoIterator<Item = &'a Chunk>,
{
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            format!(
                "Sermon {}: {}\n{}\n",
                i + 1,
                chunk.title,
                clean_preview(&chunk.content, context_chars)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{chunk, sample_chunks, HashEmbedder};
    use crate::vector_store::{IndexedChunk, MemoryVectorStore};

    #[test]
    fn test_format_context() {
        let chunks = vec![
            chunk("faith   comes 12s by hearing", "Living by Faith", "a", 0),
            chunk("grace abounds", "Grace", "b", 1),
        ];

        let context = format_context(&chunks, 500);
        assert_eq!(
            context,
            "Sermon 1: Living by Faith\nfaith comes by hearing\n\nSermon 2: Grace\ngrace abounds\n"
        );
    }

    #[test]
    fn test_format_context_caps_each_chunk() {
        let long = "word ".repeat(300);
        let chunks = vec![chunk(&long, "Long", "a", 0)];

        let context = format_context(&chunks, 500);
        let body = context.lines().nth(1).unwrap();
        assert!(body.chars().count() <= 500);
        assert!(body.ends_with("..."));
    }

    #[test]
    fn test_format_context_empty() {
        assert_eq!(format_context(Vec::<Chunk>::new().iter(), 500), "");
    }

    #[tokio::test]
    async fn test_retrieve_best_first() {
        let embedder = Arc::new(HashEmbedder::new());
        let chunks = sample_chunks();
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await.unwrap();
        let store = MemoryVectorStore::from_entries(
            chunks.into_iter().zip(embeddings).map(IndexedChunk::from).collect(),
        );

        let retriever = Retriever::new(Arc::new(store), embedder).with_k(2);
        let results = retriever.retrieve("what is humility and the lowest place").await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.title, "True Humility");
    }
}
