//! Error types for Preken.

use thiserror::Error;

/// Library-level error type for Preken operations.
#[derive(Error, Debug)]
pub enum PrekenError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load vector index: {0}")]
    IndexLoad(String),

    #[error("Query failed: {0}")]
    QueryExecution(String),

    #[error("RAG system is not ready: {0}")]
    NotReady(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Answer generation failed: {0}")]
    Generation(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),
}

impl PrekenError {
    /// Whether this error should abort startup rather than be retried or degraded.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PrekenError::Config(_))
    }
}

/// Result type alias for Preken operations.
pub type Result<T> = std::result::Result<T, PrekenError>;
