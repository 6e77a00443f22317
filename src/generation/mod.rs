//! Answer generation with a chat model.

mod openai;

pub use openai::OpenAIChatModel;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for generative models that turn a rendered prompt into text.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a completion for a single prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Model identifier.
    fn model(&self) -> &str;
}
