//! CLI module for Preken.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Preken - ask questions of a sermon library
///
/// Answers questions from sermon transcripts and cites the sermons it drew
/// on, with links that jump to the right moment of each recording.
#[derive(Parser, Debug)]
#[command(name = "preken")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "PREKEN_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the vector index from the sermon dataset
    Init {
        /// Rebuild even if an index already exists
        #[arg(short, long)]
        force: bool,
    },

    /// Show index and engine status
    Status {
        /// Print status as JSON
        #[arg(long)]
        json: bool,

        /// Initialize the engine first and fail if it does not become ready
        #[arg(long)]
        ensure: bool,
    },

    /// Ask a question about the sermons
    Ask {
        /// The question to ask
        question: String,
    },

    /// Start the HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
