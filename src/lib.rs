//! Preken - question answering over a sermon library
//!
//! Builds a vector index from sermon transcripts and answers questions with
//! citations that link to the moment in each recording.
//!
//! The name "Preken" is Norwegian for "the sermon."
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `corpus` - Dataset loading and transcript cleanup
//! - `chunking` - Recursive character splitting
//! - `embedding` - Embedding generation
//! - `generation` - Chat model access
//! - `vector_store` - In-memory index and its on-disk snapshot
//! - `index` - Loading, building and persisting the index
//! - `citation` - Previews, timestamps and watch links
//! - `rag` - The query engine
//! - `service` - Shared, lazily initialized engine handle
//!
//! # Example
//!
//! ```rust,no_run
//! use preken::config::Settings;
//! use preken::service::RagService;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let service = RagService::new(Settings::load()?);
//!     service.initialize().await?;
//!
//!     let result = service.query("What does it mean to be a disciple?").await;
//!     println!("{}", result.answer);
//!     for source in &result.sources {
//!         println!("{} @ {} {}", source.title, source.timestamp_display, source.deep_link);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod citation;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod index;
pub mod openai;
pub mod rag;
pub mod service;
pub mod vector_store;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{PrekenError, Result};
