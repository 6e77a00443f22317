//! The retrieval-augmented query engine.

use super::context::{format_context, Retriever, DEFAULT_CONTEXT_CHARS};
use super::response::QueryResult;
use crate::citation::{SourceInfo, DEFAULT_PREVIEW_CHARS};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{PrekenError, Result};
use crate::generation::{ChatModel, OpenAIChatModel};
use crate::index::{IndexManager, IndexOrigin};
use crate::openai::require_api_key;
use crate::vector_store::{SearchResult, VectorStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};

/// Tunables for answering a question.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub k: usize,
    pub context_chars: usize,
    pub preview_chars: usize,
    /// Deadline for one whole query. `None` waits on the HTTP client timeout alone.
    pub query_timeout: Option<Duration>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            k: super::context::DEFAULT_TOP_K,
            context_chars: DEFAULT_CONTEXT_CHARS,
            preview_chars: DEFAULT_PREVIEW_CHARS,
            query_timeout: None,
        }
    }
}

impl EngineOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            k: settings.retrieval.k,
            context_chars: settings.retrieval.context_chars,
            preview_chars: settings.retrieval.preview_chars,
            query_timeout: settings.generation.query_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Which parts of the engine are in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentStatus {
    pub embeddings: bool,
    pub llm: bool,
    pub vectorstore: bool,
    pub retriever: bool,
    pub rag_chain: bool,
}

impl ComponentStatus {
    pub fn all_present() -> Self {
        Self {
            embeddings: true,
            llm: true,
            vectorstore: true,
            retriever: true,
            rag_chain: true,
        }
    }
}

/// Renders the prompt for retrieved chunks and asks the model.
pub struct AnswerPipeline {
    model: Arc<dyn ChatModel>,
    prompts: Prompts,
    context_chars: usize,
}

impl AnswerPipeline {
    pub fn new(model: Arc<dyn ChatModel>, prompts: Prompts, context_chars: usize) -> Self {
        Self {
            model,
            prompts,
            context_chars,
        }
    }

    /// Produce an answer grounded in the given results.
    pub async fn answer(&self, question: &str, results: &[SearchResult]) -> Result<String> {
        let context = format_context(results.iter().map(|r| &r.chunk), self.context_chars);
        let prompt = self.prompts.render_answer(&context, question);
        self.model.generate(&prompt).await
    }
}

/// A fully constructed engine. Holding one means the engine is ready.
pub struct QueryEngine {
    retriever: Retriever,
    pipeline: AnswerPipeline,
    preview_chars: usize,
    query_timeout: Option<Duration>,
    index_origin: Option<IndexOrigin>,
}

impl QueryEngine {
    /// Assemble an engine from already constructed parts.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn ChatModel>,
        vector_store: Arc<dyn VectorStore>,
        prompts: Prompts,
        options: EngineOptions,
    ) -> Self {
        Self {
            retriever: Retriever::new(vector_store, embedder).with_k(options.k),
            pipeline: AnswerPipeline::new(model, prompts, options.context_chars),
            preview_chars: options.preview_chars,
            query_timeout: options.query_timeout,
            index_origin: None,
        }
    }

    /// Build every component from settings, loading or building the index.
    ///
    /// Fails with a configuration error when credentials or the dataset are
    /// missing.
    #[instrument(skip_all)]
    pub async fn initialize(settings: &Settings) -> Result<Self> {
        require_api_key()?;

        let request_timeout = Duration::from_secs(settings.generation.request_timeout_secs);
        let embedder: Arc<dyn Embedder> =
            Arc::new(OpenAIEmbedder::from_settings(&settings.embedding, request_timeout)?);
        let model: Arc<dyn ChatModel> =
            Arc::new(OpenAIChatModel::from_settings(&settings.generation)?);

        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        Self::initialize_with(settings, embedder, model, prompts).await
    }

    /// Load or build the index with the given components.
    pub async fn initialize_with(
        settings: &Settings,
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn ChatModel>,
        prompts: Prompts,
    ) -> Result<Self> {
        let manager = IndexManager::from_settings(settings, embedder.clone());
        let index = manager.load_or_build().await?;

        info!("RAG engine ready ({:?} index)", index.origin);

        let mut engine = Self::new(
            embedder,
            model,
            index.store,
            prompts,
            EngineOptions::from_settings(settings),
        );
        engine.index_origin = Some(index.origin);
        Ok(engine)
    }

    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        self.retriever.vector_store()
    }

    /// How the index was obtained, when built from settings.
    pub fn index_origin(&self) -> Option<IndexOrigin> {
        self.index_origin
    }

    pub fn components(&self) -> ComponentStatus {
        ComponentStatus::all_present()
    }

    /// Answer a question. Failures become a degraded result.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn query(&self, question: &str) -> QueryResult {
        info!("Processing question: {}", question);

        let outcome = match self.query_timeout {
            Some(limit) => tokio::time::timeout(limit, self.run(question))
                .await
                .unwrap_or_else(|_| {
                    Err(PrekenError::QueryExecution(format!(
                        "timed out after {}s",
                        limit.as_secs_f32()
                    )))
                }),
            None => self.run(question).await,
        };

        match outcome {
            Ok((answer, results)) => {
                let sources: Vec<SourceInfo> = results
                    .iter()
                    .map(|r| SourceInfo::from_chunk(&r.chunk, self.preview_chars))
                    .collect();
                QueryResult::answered(question, answer, sources)
            }
            Err(e) => {
                error!("Error processing query: {}", e);
                QueryResult::degraded(question, &e)
            }
        }
    }

    async fn run(&self, question: &str) -> Result<(String, Vec<SearchResult>)> {
        let results = self.retriever.retrieve(question).await?;
        let answer = self.pipeline.answer(question, &results).await?;
        Ok((answer, results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::QueryStatus;
    use crate::testing::{sample_chunks, HashEmbedder, ScriptedModel};
    use crate::vector_store::{IndexedChunk, MemoryVectorStore};

    async fn store_for(embedder: &HashEmbedder) -> Arc<MemoryVectorStore> {
        let chunks = sample_chunks();
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await.unwrap();
        Arc::new(MemoryVectorStore::from_entries(
            chunks.into_iter().zip(embeddings).map(IndexedChunk::from).collect(),
        ))
    }

    async fn engine_with(
        embedder: Arc<HashEmbedder>,
        model: Arc<ScriptedModel>,
        options: EngineOptions,
    ) -> QueryEngine {
        let store = store_for(&embedder).await;
        QueryEngine::new(embedder, model, store, Prompts::default(), options)
    }

    #[tokio::test]
    async fn test_query_answers_with_sources() {
        let model = Arc::new(ScriptedModel::answering("Faith grows by hearing."));
        let engine = engine_with(
            Arc::new(HashEmbedder::new()),
            model.clone(),
            EngineOptions {
                k: 2,
                ..Default::default()
            },
        )
        .await;

        let result = engine.query("how does faith come by hearing").await;

        assert_eq!(result.status, QueryStatus::Answered);
        assert_eq!(result.answer, "Faith grows by hearing.");
        assert_eq!(result.source_count, 2);
        assert_eq!(result.sources[0].title, "Living by Faith");
        assert_eq!(
            result.sources[0].deep_link,
            "https://www.youtube.com/watch?v=faith01&t=0s"
        );

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Sermon 1: Living by Faith"));
        assert!(prompts[0].contains("Question: how does faith come by hearing"));
        assert!(prompts[0].contains("Zac Poonen"));
    }

    #[tokio::test]
    async fn test_sources_follow_retrieval_order() {
        let embedder = Arc::new(HashEmbedder::new());
        let engine = engine_with(
            embedder.clone(),
            Arc::new(ScriptedModel::answering("ok")),
            EngineOptions::default(),
        )
        .await;

        let question = "prayer in secret";
        let expected = engine.retriever.retrieve(question).await.unwrap();
        let result = engine.query(question).await;

        let titles: Vec<_> = result.sources.iter().map(|s| s.title.clone()).collect();
        let expected_titles: Vec<_> = expected.iter().map(|r| r.chunk.title.clone()).collect();
        assert_eq!(titles, expected_titles);
        assert_eq!(result.source_count, 4);
        assert_eq!(result.sources[0].deep_link, "");
    }

    #[tokio::test]
    async fn test_model_failure_degrades() {
        let engine = engine_with(
            Arc::new(HashEmbedder::new()),
            Arc::new(ScriptedModel::failing()),
            EngineOptions::default(),
        )
        .await;

        let result = engine.query("what is grace").await;
        assert_eq!(result.status, QueryStatus::Degraded);
        assert!(result.sources.is_empty());
        assert!(result.answer.contains("rate limited"));
    }

    #[tokio::test]
    async fn test_retrieval_failure_degrades_without_calling_model() {
        let model = Arc::new(ScriptedModel::answering("unused"));
        let batch_embedder = HashEmbedder::new();
        let store = store_for(&batch_embedder).await;
        let engine = QueryEngine::new(
            Arc::new(HashEmbedder::failing_queries()),
            model.clone(),
            store,
            Prompts::default(),
            EngineOptions::default(),
        );

        let result = engine.query("anything").await;
        assert_eq!(result.status, QueryStatus::Degraded);
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_query_timeout_degrades() {
        let engine = engine_with(
            Arc::new(HashEmbedder::new()),
            Arc::new(ScriptedModel::slow(Duration::from_secs(5))),
            EngineOptions {
                query_timeout: Some(Duration::from_millis(50)),
                ..Default::default()
            },
        )
        .await;

        let result = engine.query("what is humility").await;
        assert_eq!(result.status, QueryStatus::Degraded);
        assert!(result.answer.contains("timed out"));
    }

    #[tokio::test]
    async fn test_initialize_with_builds_index() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = dir.path().join("sermons.csv");
        std::fs::write(&dataset, crate::testing::SAMPLE_DATASET).unwrap();

        let mut settings = Settings::default();
        settings.dataset.path = dataset.display().to_string();
        settings.index.path = dir.path().join("vectorstore").display().to_string();

        let engine = QueryEngine::initialize_with(
            &settings,
            Arc::new(HashEmbedder::new()),
            Arc::new(ScriptedModel::answering("ok")),
            Prompts::default(),
        )
        .await
        .unwrap();

        assert_eq!(engine.index_origin(), Some(IndexOrigin::Built));
        assert_eq!(engine.vector_store().document_count().await.unwrap(), 3);
        assert_eq!(engine.components(), ComponentStatus::all_present());
    }
}
