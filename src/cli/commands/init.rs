//! Init command - build the vector index and check the engine comes up.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::OpenAIEmbedder;
use crate::index::IndexManager;
use crate::service::RagService;
use anyhow::Result;
use console::style;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Run the init command.
pub async fn run_init(force: bool, config_path: &Path, settings: Settings) -> Result<()> {
    Output::header("Preken Setup");
    println!();

    let index_path = settings.index_path();
    if index_path.exists() && !force {
        Output::warning(&format!(
            "Vector index already exists at {}",
            index_path.display()
        ));
        Output::info("Use --force to rebuild it.");
        return Ok(());
    }

    if let Err(e) = preflight::check(Operation::Build, &settings) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    std::fs::create_dir_all(settings.data_dir())?;

    if !config_path.exists() {
        settings.save_to(&config_path.to_path_buf())?;
        Output::success(&format!("Created config file: {}", config_path.display()));
    }

    let embedder = Arc::new(OpenAIEmbedder::from_settings(
        &settings.embedding,
        Duration::from_secs(settings.generation.request_timeout_secs),
    )?);
    let manager = IndexManager::from_settings(&settings, embedder);

    let spinner = Output::spinner("Embedding sermon transcripts...");
    let built = manager.rebuild().await;
    spinner.finish_and_clear();

    let store = match built {
        Ok(store) => store,
        Err(e) => {
            Output::error(&format!("Failed to build vector index: {}", e));
            return Err(e.into());
        }
    };
    Output::success(&format!(
        "Indexed {} chunks into {}",
        store.snapshot()?.len(),
        index_path.display()
    ));

    let service = RagService::new(settings);
    let spinner = Output::spinner("Starting RAG engine...");
    let initialized = service.initialize().await;
    spinner.finish_and_clear();

    if let Err(e) = initialized {
        Output::error(&format!("RAG engine failed to start: {}", e));
        return Err(e.into());
    }

    Output::status(&service.get_status().await);
    println!();
    println!("{}", style("Setup Complete!").bold().green());
    println!();
    println!("Next steps:");
    println!("  {} Ask about the sermons", style("preken ask \"<question>\"").cyan());
    println!("  {} Start the HTTP API", style("preken serve").cyan());

    Ok(())
}
