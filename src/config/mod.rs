//! Configuration module for Preken.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts};
pub use settings::{
    ChunkingSettings, DatasetSettings, EmbeddingSettings, GeneralSettings, GenerationSettings,
    IndexSettings, PromptSettings, RetrievalSettings, Settings,
};
