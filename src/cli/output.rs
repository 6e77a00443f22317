//! CLI output formatting utilities.

use crate::citation::SourceInfo;
use crate::service::StatusRecord;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print one cited sermon.
    pub fn source(index: usize, source: &SourceInfo) {
        println!(
            "\n{} {} {} @ {}",
            style(format!("[{}]", index)).green(),
            style(&source.title).bold(),
            style(format!("({})", source.author)).dim(),
            style(&source.timestamp_display).cyan(),
        );
        println!("   {}", source.content_preview);
        if !source.deep_link.is_empty() {
            println!("   {}", style(&source.deep_link).dim());
        }
    }

    /// Print a status record as key-value lines.
    pub fn status(status: &StatusRecord) {
        Output::kv("Index path", &status.index.path);
        Output::kv("Index exists", yes_no(status.index.exists));
        Output::kv("Index loaded", yes_no(status.index.loaded));
        if let Some(count) = status.index.document_count {
            Output::kv("Documents", &count.to_string());
        }
        Output::kv("Engine", &status.state.to_string());
        Output::kv("Ready", yes_no(status.ready));
        if let Some(err) = &status.last_error {
            Output::kv("Last error", err);
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
