//! Pre-flight checks before expensive operations.
//!
//! Validates that credentials and the dataset are available before starting
//! operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{PrekenError, Result};
use crate::openai::require_api_key;
use crate::vector_store::SqliteSnapshot;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Building the index needs the API key and the dataset.
    Build,
    /// Answering needs the API key, and the dataset unless an index exists.
    Ask,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Build => {
            require_api_key()?;
            check_dataset(settings)?;
        }
        Operation::Ask => {
            require_api_key()?;
            if !SqliteSnapshot::file_path(&settings.index_path()).exists() {
                check_dataset(settings)?;
            }
        }
    }
    Ok(())
}

fn check_dataset(settings: &Settings) -> Result<()> {
    let path = settings.dataset_path();
    if path.exists() {
        Ok(())
    } else {
        Err(PrekenError::Config(format!(
            "Dataset not found at {}. Set [dataset] path in the config file.",
            path.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_dataset_missing() {
        let mut settings = Settings::default();
        settings.dataset.path = "/nonexistent/sermons.csv".to_string();
        let err = check_dataset(&settings).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("/nonexistent/sermons.csv"));
    }
}
