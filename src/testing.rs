//! Deterministic stand-ins for the OpenAI-backed components.

use crate::chunking::Chunk;
use crate::config::Prompts;
use crate::embedding::Embedder;
use crate::error::{PrekenError, Result};
use crate::generation::ChatModel;
use crate::rag::{EngineOptions, QueryEngine};
use crate::service::EngineFactory;
use crate::vector_store::{IndexedChunk, MemoryVectorStore};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const FAKE_DIMENSIONS: usize = 32;

/// Bag-of-words embedder: each lowercase word bumps one hashed bucket.
pub struct HashEmbedder {
    dimensions: usize,
    batch_sizes: Mutex<Vec<usize>>,
    fail_queries: bool,
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self {
            dimensions: FAKE_DIMENSIONS,
            batch_sizes: Mutex::new(Vec::new()),
            fail_queries: false,
        }
    }

    /// Batches succeed but single-text embedding fails.
    pub fn failing_queries() -> Self {
        Self {
            fail_queries: true,
            ..Self::new()
        }
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions,
            ..Self::new()
        }
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().unwrap().clone()
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0; self.dimensions];
        for word in text.split_whitespace() {
            let word = word.to_lowercase();
            let hash = word
                .bytes()
                .fold(0xcbf29ce484222325u64, |h, b| (h ^ b as u64).wrapping_mul(0x100000001b3));
            v[(hash % self.dimensions as u64) as usize] += 1.0;
        }
        v
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.fail_queries {
            return Err(PrekenError::Embedding("embedding service unavailable".to_string()));
        }
        Ok(self.vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.batch_sizes.lock().unwrap().push(texts.len());
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model(&self) -> &str {
        "hash-embedder"
    }
}

/// Chat model that echoes a fixed answer and records prompts.
pub struct ScriptedModel {
    answer: String,
    delay: Option<Duration>,
    fail: bool,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            delay: None,
            fail: false,
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::answering("")
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::answering("too late")
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(PrekenError::OpenAI("rate limited".to_string()));
        }
        Ok(self.answer.clone())
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

pub fn chunk(content: &str, title: &str, video_id: &str, sequence_id: usize) -> Chunk {
    Chunk {
        content: content.to_string(),
        title: title.to_string(),
        author: "Zac Poonen".to_string(),
        video_id: video_id.to_string(),
        sequence_id,
    }
}

/// A small corpus where each chunk has a distinct vocabulary.
pub fn sample_chunks() -> Vec<Chunk> {
    vec![
        chunk("faith comes by hearing the word", "Living by Faith", "faith01", 0),
        chunk("grace is the power to overcome sin", "Grace and Victory", "grace02", 1),
        chunk("humility means taking the lowest place", "True Humility", "humble03", 2),
        chunk("prayer in secret is rewarded openly", "The Secret Place", "", 3),
    ]
}

/// CSV dataset text matching [`sample_chunks`] in spirit.
pub const SAMPLE_DATASET: &str = "sermon,title,author,video_id
\"music faith comes by hearing the word of God\",Living by Faith,Zac Poonen,faith01
\"grace is the power to overcome sin\",Grace and Victory,Zac Poonen,grace02
\"humility means taking the lowest place\",True Humility,Zac Poonen,humble03
";

/// Engine over [`sample_chunks`] held in memory.
pub async fn memory_engine(answer: &str) -> Result<QueryEngine> {
    let embedder = Arc::new(HashEmbedder::new());
    let chunks = sample_chunks();
    let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let embeddings = embedder.embed_batch(&texts).await?;
    let store = MemoryVectorStore::from_entries(
        chunks.into_iter().zip(embeddings).map(IndexedChunk::from).collect(),
    );

    Ok(QueryEngine::new(
        embedder,
        Arc::new(ScriptedModel::answering(answer)),
        Arc::new(store),
        Prompts::default(),
        EngineOptions::default(),
    ))
}

/// Builds a [`memory_engine`], failing the first `failures` attempts.
pub struct CountingFactory {
    builds: Arc<AtomicUsize>,
    failures: usize,
    delay: Duration,
}

impl CountingFactory {
    pub fn new(failures: usize, delay: Duration) -> (Self, Arc<AtomicUsize>) {
        let builds = Arc::new(AtomicUsize::new(0));
        (
            Self {
                builds: builds.clone(),
                failures,
                delay,
            },
            builds,
        )
    }
}

#[async_trait]
impl EngineFactory for CountingFactory {
    async fn build(&self) -> Result<QueryEngine> {
        let attempt = self.builds.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if attempt < self.failures {
            return Err(PrekenError::Config("OPENAI_API_KEY is not set".to_string()));
        }
        memory_engine("Humility is the way up.").await
    }
}
