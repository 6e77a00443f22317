//! Retrieval-augmented question answering over the sermon index.
//!
//! A question is embedded, the closest chunks are retrieved, formatted into
//! the answer prompt and sent to the chat model. The answer comes back with
//! a citation for every retrieved chunk.

pub mod context;
mod engine;
mod response;

pub use context::{format_context, Retriever};
pub use engine::{AnswerPipeline, ComponentStatus, EngineOptions, QueryEngine};
pub use response::{QueryResult, QueryStatus};
