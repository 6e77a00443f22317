//! Status command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::service::RagService;
use anyhow::Result;

/// Run the status command.
///
/// With `ensure`, the engine is initialized first and the command fails if
/// it does not become ready.
pub async fn run_status(json: bool, ensure: bool, settings: Settings) -> Result<()> {
    let service = RagService::new(settings);

    if ensure {
        let spinner = Output::spinner("Initializing RAG engine...");
        let initialized = service.initialize().await;
        spinner.finish_and_clear();
        if let Err(e) = initialized {
            Output::error(&format!("RAG engine failed to start: {}", e));
        }
    }

    let status = service.get_status().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        Output::header("Preken Status");
        Output::status(&status);
    }

    if ensure && !status.ready {
        anyhow::bail!("RAG system is not ready");
    }

    Ok(())
}
