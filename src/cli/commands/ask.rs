//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::QueryStatus;
use crate::service::RagService;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'preken status' to inspect the index.");
        return Err(e.into());
    }

    let service = RagService::new(settings);

    let spinner = Output::spinner("Loading sermon index...");
    let initialized = service.initialize().await;
    spinner.finish_and_clear();
    if let Err(e) = initialized {
        Output::error(&format!("RAG engine failed to start: {}", e));
        return Err(e.into());
    }

    let spinner = Output::spinner("Searching sermons...");
    let result = service.query(question).await;
    spinner.finish_and_clear();

    if result.status != QueryStatus::Answered {
        Output::error(&result.answer);
        anyhow::bail!("Question was not answered ({})", result.status);
    }

    println!("\n{}\n", result.answer);

    if !result.sources.is_empty() {
        Output::header(&format!("Sources ({})", result.source_count));
        for (i, source) in result.sources.iter().enumerate() {
            Output::source(i + 1, source);
        }
        println!();
    }

    Ok(())
}
