//! OpenAI client configuration with sensible defaults.

use crate::error::{PrekenError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for OpenAI API requests (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Create an OpenAI client with a custom timeout.
pub fn create_client_with_timeout(timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    Ok(Client::with_config(OpenAIConfig::default()).with_http_client(http_client))
}

/// Ensure an API key is available before building clients that need one.
pub fn require_api_key() -> Result<()> {
    validate_api_key(std::env::var(API_KEY_VAR).ok().as_deref())
}

fn validate_api_key(key: Option<&str>) -> Result<()> {
    match key {
        Some(key) if !key.trim().is_empty() => Ok(()),
        Some(_) => Err(PrekenError::Config(format!(
            "{} is empty. Set it with: export {}='sk-...'",
            API_KEY_VAR, API_KEY_VAR
        ))),
        None => Err(PrekenError::Config(format!(
            "{} not set. Set it with: export {}='sk-...'",
            API_KEY_VAR, API_KEY_VAR
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_api_key() {
        assert!(validate_api_key(Some("sk-test")).is_ok());
        assert!(matches!(validate_api_key(Some("  ")), Err(PrekenError::Config(_))));
        assert!(matches!(validate_api_key(None), Err(PrekenError::Config(_))));
    }

    #[test]
    fn test_client_builds_with_timeout() {
        assert!(create_client_with_timeout(Duration::from_secs(5)).is_ok());
    }
}
