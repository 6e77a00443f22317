//! Application-wide entry point to the query engine.
//!
//! A [`RagService`] is created once at startup and shared by `Arc` between
//! the CLI and HTTP handlers. The engine behind it is constructed at most
//! once per attempt and only published when complete.

use crate::config::Settings;
use crate::error::{PrekenError, Result};
use crate::index::IndexStatus;
use crate::rag::{ComponentStatus, QueryEngine, QueryResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OnceCell;
use tracing::{error, info, instrument};

/// Engine lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EngineState::Uninitialized => "uninitialized",
            EngineState::Initializing => "initializing",
            EngineState::Ready => "ready",
            EngineState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Snapshot of the service for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    #[serde(flatten)]
    pub index: IndexStatus,
    pub ready: bool,
    pub state: EngineState,
    pub components: ComponentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Constructs a query engine.
#[async_trait]
pub trait EngineFactory: Send + Sync {
    async fn build(&self) -> Result<QueryEngine>;
}

/// Builds the OpenAI-backed engine described by settings.
pub struct SettingsEngineFactory {
    settings: Settings,
}

impl SettingsEngineFactory {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl EngineFactory for SettingsEngineFactory {
    async fn build(&self) -> Result<QueryEngine> {
        QueryEngine::initialize(&self.settings).await
    }
}

#[derive(Debug)]
struct Lifecycle {
    state: EngineState,
    failures: u64,
    last_error: Option<String>,
}

/// Shared handle to the sermon question-answering engine.
pub struct RagService {
    index_path: PathBuf,
    factory: Box<dyn EngineFactory>,
    engine: OnceCell<Arc<QueryEngine>>,
    init_lock: tokio::sync::Mutex<()>,
    lifecycle: Mutex<Lifecycle>,
}

impl RagService {
    /// Create a service that builds its engine from settings.
    pub fn new(settings: Settings) -> Self {
        let index_path = settings.index_path();
        Self::with_factory(index_path, Box::new(SettingsEngineFactory::new(settings)))
    }

    pub fn with_factory(index_path: PathBuf, factory: Box<dyn EngineFactory>) -> Self {
        Self {
            index_path,
            factory,
            engine: OnceCell::new(),
            init_lock: tokio::sync::Mutex::new(()),
            lifecycle: Mutex::new(Lifecycle {
                state: EngineState::Uninitialized,
                failures: 0,
                last_error: None,
            }),
        }
    }

    /// Return the engine, constructing it on first use.
    ///
    /// Concurrent callers wait for a single construction. If that attempt
    /// fails, callers that were waiting on it get `NotReady` rather than
    /// starting another one; a later call tries again.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<Arc<QueryEngine>> {
        if let Some(engine) = self.engine.get() {
            return Ok(engine.clone());
        }

        let observed_failures = self.lifecycle().failures;
        let _guard = self.init_lock.lock().await;

        if let Some(engine) = self.engine.get() {
            return Ok(engine.clone());
        }

        {
            let mut lifecycle = self.lifecycle();
            if lifecycle.failures != observed_failures {
                let reason = lifecycle
                    .last_error
                    .clone()
                    .unwrap_or_else(|| "initialization failed".to_string());
                return Err(PrekenError::NotReady(reason));
            }
            lifecycle.state = EngineState::Initializing;
        }

        info!("Initializing RAG engine...");
        match self.factory.build().await {
            Ok(engine) => {
                let engine = Arc::new(engine);
                // Only one builder runs at a time, so the cell is still empty here.
                let _ = self.engine.set(engine.clone());
                let mut lifecycle = self.lifecycle();
                lifecycle.state = EngineState::Ready;
                lifecycle.last_error = None;
                info!("RAG engine initialized");
                Ok(engine)
            }
            Err(e) => {
                error!("Error initializing RAG engine: {}", e);
                let mut lifecycle = self.lifecycle();
                lifecycle.state = EngineState::Failed;
                lifecycle.failures += 1;
                lifecycle.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.engine.initialized()
    }

    pub fn state(&self) -> EngineState {
        self.lifecycle().state
    }

    /// Most recent construction failure, if the engine is not ready.
    pub fn last_error(&self) -> Option<String> {
        self.lifecycle().last_error.clone()
    }

    /// Answer a question. Never fails; a not-ready engine gives a
    /// `not_ready` result.
    pub async fn query(&self, question: &str) -> QueryResult {
        match self.engine.get() {
            Some(engine) => engine.query(question).await,
            None => QueryResult::not_ready(question),
        }
    }

    /// Answer a question, reporting a not-ready engine as an error.
    pub async fn try_query(&self, question: &str) -> Result<QueryResult> {
        match self.engine.get() {
            Some(engine) => Ok(engine.query(question).await),
            None => Err(PrekenError::NotReady(format!("engine is {}", self.state()))),
        }
    }

    /// Describe the index and engine without triggering construction.
    pub async fn get_status(&self) -> StatusRecord {
        let engine = self.engine.get();
        let index = IndexStatus::inspect(
            &self.index_path,
            engine.map(|e| e.vector_store().as_ref()),
        )
        .await;

        let lifecycle = self.lifecycle();
        StatusRecord {
            index,
            ready: engine.is_some(),
            state: lifecycle.state,
            components: engine.map(|e| e.components()).unwrap_or_default(),
            last_error: lifecycle.last_error.clone(),
        }
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
